//! Error types for the scour crate

use thiserror::Error;

/// Result type for scour operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for scour operations
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level HTTP failure (connection refused, timeout, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend returned a non-success HTTP status
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Response body, kept for diagnostics
        message: String,
    },

    /// Response body does not match the expected shape
    #[error("Unexpected response format: {0}")]
    MalformedResponse(String),

    /// Backend answered 2xx but reported an in-band failure
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// A record id was not present in the session cache
    #[error("No cached record for id {0}")]
    NotFound(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
