use thiserror::Error;

/// Errors from encoding or decoding blob bytes.
///
/// Every decoding failure is fatal to the read in progress: the codec never
/// truncates, wraps, or skips malformed input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("corrupt blob at offset {offset}: {reason}")]
    Corrupt { offset: usize, reason: String },

    #[error("invalid blob magic: expected {expected:?}, got {actual:?}")]
    InvalidMagic { expected: [u8; 4], actual: Vec<u8> },

    #[error("unsupported blob format version: {0}")]
    UnsupportedVersion(u8),
}

impl CodecError {
    pub(crate) fn corrupt(offset: usize, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            offset,
            reason: reason.into(),
        }
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
