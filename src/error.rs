//! Error types module.
//!
//! This module defines the error types used throughout the leakcheck application.
//! It uses `thiserror` for structured error handling and provides
//! a custom `Result` type alias for convenience.
//!
//! Individual probe failures are never represented here: they are folded into
//! a [`RequestResult`](crate::probe::RequestResult) at the prober boundary.

use thiserror::Error;

/// A specialized `Result` type for leakcheck operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for leakcheck application.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file operations, terminal output)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error (configuration files, JSON output)
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error talking to the test-coordination service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The test-coordination service answered with unusable data
    #[error("API error: {0}")]
    Api(String),

    /// Configuration error (invalid config, bad values)
    #[error("Config error: {0}")]
    Config(String),

    /// Parse error (invalid input format, malformed data)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Create a new API error with a message.
    #[must_use]
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a new configuration error with a message.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new parse error with a message.
    #[must_use]
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
