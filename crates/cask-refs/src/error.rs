//! Error types for ref operations.

use thiserror::Error;

/// Errors that can occur during ref operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// No live ref has this name. Expired refs report this too.
    #[error("ref not found: {name}")]
    NotFound { name: String },

    /// The ref name is invalid.
    #[error("invalid ref name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// The requested lifetime cannot be used.
    #[error("invalid ref lifetime: {reason}")]
    InvalidLifetime { reason: String },

    /// The underlying ref store failed.
    #[error("ref store error: {0}")]
    Store(String),
}

/// Convenience type alias for ref operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
