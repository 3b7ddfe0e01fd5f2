//! Database credential resolution.
//!
//! Credentials live outside the config file as a JSON secret with the keys
//! `host`, `database`, `username`, `password` and `port`. The config names
//! where to find it: `env:<VAR>` reads the JSON from an environment variable,
//! `file:<path>` reads it from disk.

use crate::config::DatabaseConfig;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Deserializer};
use sqlx::postgres::PgConnectOptions;
use std::str::FromStr;

/// Database credentials as stored in the secret
#[derive(Clone, Deserialize)]
pub struct DbCredentials {
    pub host: String,
    pub database: String,
    pub username: String,
    pub password: String,
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub port: u16,
}

impl std::fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbCredentials")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .field("port", &self.port)
            .finish()
    }
}

impl DbCredentials {
    pub fn from_secret_string(secret: &str) -> Result<Self> {
        serde_json::from_str(secret).map_err(|e| {
            PipelineError::configuration(format!("database secret is not valid JSON: {e}"))
        })
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(&self.password)
    }
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Read the raw secret string named by a reference
pub fn read_secret(reference: &str) -> Result<String> {
    if let Some(var) = reference.strip_prefix("env:") {
        std::env::var(var).map_err(|_| {
            PipelineError::configuration(format!("database secret variable {var} is not set"))
        })
    } else if let Some(path) = reference.strip_prefix("file:") {
        std::fs::read_to_string(path).map_err(|e| {
            PipelineError::configuration(format!("cannot read database secret {path}: {e}"))
        })
    } else {
        Err(PipelineError::configuration(format!(
            "unsupported secret reference '{reference}', expected env:<VAR> or file:<path>"
        )))
    }
}

/// Resolve connection options from the database section of the config
pub fn resolve_connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions> {
    if let Some(url) = &config.url {
        return PgConnectOptions::from_str(url)
            .map_err(|e| PipelineError::configuration(format!("invalid database url: {e}")));
    }

    let reference = config.secret.as_deref().ok_or_else(|| {
        PipelineError::configuration("neither database.url nor database.secret is configured")
    })?;

    let credentials = DbCredentials::from_secret_string(&read_secret(reference)?)?;
    Ok(credentials.connect_options())
}
