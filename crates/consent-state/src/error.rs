//! Error types for the consent state engine.

use thiserror::Error;

/// Errors surfaced by the consent state engine.
///
/// Store and transport failures are absorbed and logged inside
/// [`ConsentInstance`](crate::ConsentInstance); only API misuse reaches
/// callers of the manager.
#[derive(Error, Debug)]
pub enum ConsentError {
    /// `register_consent_instance` called twice for the same id
    #[error("instance already registered: {0}")]
    AlreadyRegistered(String),

    /// Operation on an id that was never registered
    #[error("instance not registered: {0}")]
    NotRegistered(String),

    /// Invalid instance configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias using ConsentError.
pub type Result<T> = std::result::Result<T, ConsentError>;
