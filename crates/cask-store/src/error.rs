use cask_codec::CodecError;
use cask_index::IndexError;
use cask_types::{ContentHash, HashedBlobRef, Locator, NamespaceId};

/// Errors from a storage backend.
///
/// The blob store passes these through unchanged; retrying is the caller's
/// decision.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Nothing is stored at the locator.
    #[error("no data at locator: {0}")]
    NotFound(Locator),

    /// I/O error from the underlying medium.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The locator cannot be mapped onto this backend.
    #[error("invalid locator for backend: {0}")]
    InvalidLocator(String),
}

/// Result alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested blob does not exist in this namespace.
    #[error("blob not found: {hash} at {locator}")]
    BlobNotFound { hash: ContentHash, locator: Locator },

    /// The writer was already completed.
    #[error("blob writer is closed")]
    WriterClosed,

    /// Stored bytes do not hash to the requested hash.
    #[error("hash mismatch at {locator}: expected {expected}, computed {computed}")]
    HashMismatch {
        locator: Locator,
        expected: ContentHash,
        computed: ContentHash,
    },

    /// Stored bytes could not be decoded.
    #[error("corrupt blob at {locator}: {source}")]
    CorruptBlob {
        locator: Locator,
        #[source]
        source: CodecError,
    },

    /// A blob references a blob that does not resolve. On read the
    /// container is treated as unreadable; on write nothing is stored.
    #[error("blob {container} references missing blob {missing}")]
    DanglingReference {
        container: ContentHash,
        missing: HashedBlobRef,
    },

    /// A writer referenced a blob that belongs to another namespace.
    #[error("blob {target} does not belong to namespace {namespace}")]
    ForeignReference {
        namespace: NamespaceId,
        target: HashedBlobRef,
    },

    /// The stored alias record of a blob could not be encoded or decoded.
    #[error("bad alias record at {locator}: {source}")]
    AliasRecord {
        locator: Locator,
        #[source]
        source: serde_json::Error,
    },

    /// An alias requested on the writer is invalid.
    #[error(transparent)]
    Alias(#[from] IndexError),

    /// The storage backend failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
