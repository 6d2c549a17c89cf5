//! Error types for Redmon
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Redmon
#[derive(Debug, Error)]
pub enum RedmonError {
    /// Bad input supplied by a caller (e.g. an empty subreddit name)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A work unit reported quota feedback that cannot be valid
    #[error("Invalid rate feedback: {0}")]
    InvalidFeedback(String),

    /// The work unit itself failed while performing its remote call
    #[error("Work unit failed: {0}")]
    WorkUnit(String),

    /// The active run was cancelled by a stop request
    #[error("Cancelled")]
    Cancelled,

    /// Reddit authentication error
    #[error("Auth error: {0}")]
    Auth(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Redmon operations
pub type Result<T> = std::result::Result<T, RedmonError>;
