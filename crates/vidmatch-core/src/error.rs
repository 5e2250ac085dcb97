//! Error types for vidmatch.

use thiserror::Error;

/// Result type alias using vidmatch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for vidmatch operations.
///
/// A missing embedding is not represented here: the embedding client absorbs
/// backend failures and reports them as `None`.
#[derive(Error, Debug)]
pub enum Error {
    /// Candidate search exhausted its retries (network error or malformed response)
    #[error("Failed to fetch videos after {attempts} attempts: {message}")]
    SearchFailure { attempts: u32, message: String },

    /// Bearer token was rejected by the playlist API
    #[error("Authentication expired. Please sign in again.")]
    AuthExpired,

    /// Liked-videos fetch failed with a non-401 status
    #[error("Failed to fetch liked videos: {0}")]
    FetchFailure(String),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token could not be acquired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::SearchFailure { .. } => "search_failure",
            Error::AuthExpired => "auth_expired",
            Error::FetchFailure(_) => "fetch_failure",
            Error::Embedding(_) => "embedding",
            Error::Request(_) => "request",
            Error::Serialization(_) => "serialization",
            Error::Config(_) => "config",
            Error::Unauthorized(_) => "unauthorized",
            Error::InvalidInput(_) => "invalid_input",
            Error::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
