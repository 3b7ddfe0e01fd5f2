//! Error types for the fantasy pipeline

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while fetching, scoring or persisting stats
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required credential or setting is missing
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provider could not be reached
    #[error("Transport error calling {url}: {message}")]
    Transport { url: String, message: String },

    /// The provider answered with a non-2xx status
    #[error("Upstream request to {url} failed with status {status}")]
    UpstreamStatus { status: u16, url: String },

    /// The provider answered with a body we could not decode
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A single player record that cannot be stored
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Record,
    Internal,
}

impl PipelineError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }

    /// Wrap a reqwest failure for the given url
    pub fn transport(url: &str, err: reqwest::Error) -> Self {
        Self::Transport {
            url: redact_key(url),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::Settings(_) => ErrorKind::Configuration,
            Self::Transport { .. } | Self::UpstreamStatus { .. } | Self::Decode { .. } => {
                ErrorKind::Transport
            }
            Self::InvalidRecord(_) => ErrorKind::Record,
            Self::Database(_) | Self::Serialization(_) | Self::Io(_) | Self::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// HTTP-style status code reported to the caller
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Configuration => 400,
            ErrorKind::Transport => 502,
            ErrorKind::Record | ErrorKind::Internal => 500,
        }
    }
}

/// Strip any `key=` query parameter so credentials never reach logs
fn redact_key(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => base.to_string(),
        None => url.to_string(),
    }
}
