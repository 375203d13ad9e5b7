use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid blob type: {0}")]
    InvalidBlobType(String),

    #[error("invalid locator: {0}")]
    InvalidLocator(String),

    #[error("invalid namespace id: {0}")]
    InvalidNamespace(String),
}
