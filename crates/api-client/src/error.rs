//! Error types for the Bifrost API client.

use thiserror::Error;

/// Main error type for the Bifrost API client.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The backend answered with a non-success status code
    #[error("API error: HTTP {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    AuthError(String),
}

/// Result type alias for the Bifrost API client.
pub type Result<T> = std::result::Result<T, Error>;
