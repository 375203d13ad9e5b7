//! Physical storage behind a namespace.
//!
//! The blob store only ever talks to bytes through [`StorageBackend`]; which
//! medium sits behind it is chosen when the namespace is built.

use async_trait::async_trait;
use bytes::Bytes;
use cask_types::Locator;

use crate::error::BackendResult;

pub mod file_system;
pub mod memory;

pub use file_system::FileSystemBackend;
pub use memory::MemoryBackend;

/// Byte storage keyed by opaque locator.
///
/// All implementations must satisfy these invariants:
/// - A single `put` or `get` is atomic: readers see all of a value or none.
/// - `put` is idempotent for the same `(locator, bytes)` pair.
/// - `get` fails with [`crate::BackendError::NotFound`] for absent locators.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Store `data` at `locator`, replacing anything already there.
    async fn put(&self, locator: &Locator, data: Bytes) -> BackendResult<()>;

    /// Fetch the bytes at `locator`.
    async fn get(&self, locator: &Locator) -> BackendResult<Bytes>;

    /// Check whether anything is stored at `locator`.
    async fn exists(&self, locator: &Locator) -> BackendResult<bool>;

    /// Remove the bytes at `locator`. Returns `true` if something was there.
    ///
    /// Only garbage collection deletes; deleting a referenced blob makes its
    /// referrers unreadable.
    async fn delete(&self, locator: &Locator) -> BackendResult<bool>;

    /// Every stored locator under `prefix/`, sorted. An unknown prefix
    /// lists nothing.
    async fn list(&self, prefix: &str) -> BackendResult<Vec<Locator>>;

    /// Make every completed `put` durable.
    ///
    /// Backends whose `put` is already durable keep the default no-op.
    async fn flush(&self) -> BackendResult<()> {
        Ok(())
    }
}
