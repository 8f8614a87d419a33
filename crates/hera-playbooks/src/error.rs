//! Adapter error types.

use thiserror::Error;

/// Errors surfaced by adapter operations.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Underlying storage rejected the operation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Entity not found.
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Audit channel error.
    #[error("Audit error: {0}")]
    Audit(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for AdapterError {
    fn from(e: serde_json::Error) -> Self {
        AdapterError::Json(e.to_string())
    }
}
