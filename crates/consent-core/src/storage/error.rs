//! Storage error types

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Storage backend error (local storage, filesystem, etc.)
    #[error("storage backend error: {0}")]
    Backend(String),

    /// The backend refused a value of this type
    #[error("unsupported value for key '{key}': {reason}")]
    Unsupported { key: String, reason: String },
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
