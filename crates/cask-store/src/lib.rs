//! Content-addressed blob storage for Cask.
//!
//! A [`BlobStore`] owns the blobs of one namespace. Blobs are built with a
//! [`BlobWriter`], identified by the BLAKE3 hash of their canonical
//! encoding, and stored once per distinct content at a namespace-prefixed
//! [`cask_types::Locator`]. Reading verifies the hash and checks that
//! every referenced blob still resolves; references themselves are handed
//! back as lazy [`cask_types::HashedBlobRef`]s.
//!
//! # Storage Backends
//!
//! All backends implement the [`StorageBackend`] trait:
//!
//! - [`MemoryBackend`] -- `HashMap`-based backend for tests and embedding
//! - [`FileSystemBackend`] -- one file per locator under a base directory
//!
//! # Design Rules
//!
//! 1. Blobs are immutable once written (content-addressing guarantees this).
//! 2. Write-then-link: persist the blob before recording aliases or handing
//!    out its handle.
//! 3. Concurrent reads are always safe; blob writes are order-independent.
//! 4. No synchronous lock is held across backend I/O.
//! 5. All backend errors are propagated, never silently ignored.
//! 6. Persisting, referencing, and deleting a blob serialize on its hash,
//!    so a sweep never removes bytes a writer has just handed out.
//! 7. Aliases are stored next to their blob; [`BlobStore::open`] rebuilds
//!    the catalog and alias index from the backend.

pub mod backend;
pub mod error;
pub mod handle;
pub mod store;
pub mod writer;

pub use backend::{FileSystemBackend, MemoryBackend, StorageBackend};
pub use error::{BackendError, BackendResult, StoreError, StoreResult};
pub use handle::{BlobData, BlobHandle};
pub use store::{BlobStore, CatalogEntry};
pub use writer::BlobWriter;
