//! Error types for the fallible edges of the crate.
//!
//! Reconciliation itself never fails; these cover acquiring a telemetry
//! subscription and loading settings.

use thiserror::Error;

/// Errors that can occur while subscribing to a telemetry source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source has already handed out its subscription.
    #[error("Source already subscribed: {0}")]
    AlreadySubscribed(String),

    /// Connection to the remote feed failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse a payload.
    #[error("Failed to parse payload: {0}")]
    Parse(String),

    /// Local I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "rtdb")]
impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            SourceError::Connection(err.to_string())
        } else {
            SourceError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(err.to_string())
    }
}

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration layer could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was read but is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
