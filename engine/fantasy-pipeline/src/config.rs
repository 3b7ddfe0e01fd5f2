use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Conventional environment variable holding the SportsDataIO key
pub const API_KEY_ENV: &str = "SPORTSDATA_API_KEY";

/// Prefix for environment overrides, e.g. `FANTASY_SPORTSDATAIO__DEFAULT_SEASON`
pub const ENV_PREFIX: &str = "FANTASY";

/// Configuration for the fantasy pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// SportsDataIO API configuration
    pub sportsdataio: SportsDataIOConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SportsDataIOConfig {
    /// Provider access key, sent as `Ocp-Apim-Subscription-Key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the NFL API (no trailing slash)
    pub base_url: String,

    /// Season used when an invocation does not name one
    pub default_season: i32,

    /// Fixed timeout applied to every request
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over `secret`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Secret reference holding the credentials JSON (`env:<VAR>` or `file:<path>`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Connection pool size
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,

    /// `pretty`, `json` or anything else for compact output
    pub format: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sportsdataio: SportsDataIOConfig {
                api_key: None,
                base_url: "https://api.sportsdata.io/v3/nfl".to_string(),
                default_season: 2024,
                request_timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: None,
                secret: Some("env:DB_SECRET".to_string()),
                max_connections: 5,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
        }
    }
}

impl PipelineConfig {
    /// Load configuration: defaults, then an optional file, then `FANTASY_*` env vars
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: Self = builder.build()?.try_deserialize()?;

        if config.sportsdataio.api_key.is_none() {
            config.sportsdataio.api_key = std::env::var(API_KEY_ENV).ok();
        }
        config.sportsdataio.api_key = config
            .sportsdataio
            .api_key
            .take()
            .filter(|key| !key.trim().is_empty());

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.sportsdataio.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.sportsdataio.base_url = base_url.into();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.sportsdataio.request_timeout_secs)
    }
}
