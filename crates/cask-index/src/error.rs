//! Error types for the index crate.

/// Errors that can occur during alias index operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IndexError {
    /// An alias key failed validation.
    #[error("invalid alias key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
