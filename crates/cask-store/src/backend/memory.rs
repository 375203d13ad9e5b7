use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use cask_types::Locator;

use crate::backend::StorageBackend;
use crate::error::{BackendError, BackendResult};

/// In-memory, HashMap-based backend.
///
/// Intended for tests and embedding. Values are `Bytes`, so reads are
/// reference-counted clones rather than copies. Counts every `put` so tests
/// can observe deduplication.
pub struct MemoryBackend {
    objects: RwLock<HashMap<Locator, Bytes>>,
    puts: AtomicU64,
}

impl MemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            puts: AtomicU64::new(0),
        }
    }

    /// Number of values currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the backend is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored values.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|v| v.len() as u64)
            .sum()
    }

    /// Number of `put` calls served since creation.
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    /// Sorted list of every stored locator.
    pub fn locators(&self) -> Vec<Locator> {
        let map = self.objects.read().expect("lock poisoned");
        let mut locators: Vec<Locator> = map.keys().cloned().collect();
        locators.sort();
        locators
    }

    /// Overwrite a stored value in place, bypassing all checks.
    /// Used to simulate on-disk corruption in tests.
    pub fn corrupt(&self, locator: &Locator, data: Bytes) {
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(locator.clone(), data);
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn put(&self, locator: &Locator, data: Bytes) -> BackendResult<()> {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(locator.clone(), data);
        Ok(())
    }

    async fn get(&self, locator: &Locator) -> BackendResult<Bytes> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(locator)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(locator.clone()))
    }

    async fn exists(&self, locator: &Locator) -> BackendResult<bool> {
        Ok(self
            .objects
            .read()
            .expect("lock poisoned")
            .contains_key(locator))
    }

    async fn delete(&self, locator: &Locator) -> BackendResult<bool> {
        Ok(self
            .objects
            .write()
            .expect("lock poisoned")
            .remove(locator)
            .is_some())
    }

    async fn list(&self, prefix: &str) -> BackendResult<Vec<Locator>> {
        let mut locators = self.locators();
        locators.retain(|locator| locator.has_prefix(prefix));
        Ok(locators)
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(s: &str) -> Locator {
        Locator::new(s).unwrap()
    }

    #[tokio::test]
    async fn put_and_get() {
        let backend = MemoryBackend::new();
        backend.put(&loc("a/b"), Bytes::from_static(b"hello")).await.unwrap();
        assert_eq!(backend.get(&loc("a/b")).await.unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(backend.put_count(), 1);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let backend = MemoryBackend::new();
        let err = backend.get(&loc("missing")).await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(l) if l == loc("missing")));
    }

    #[tokio::test]
    async fn put_is_idempotent() {
        let backend = MemoryBackend::new();
        let data = Bytes::from_static(b"same");
        backend.put(&loc("x"), data.clone()).await.unwrap();
        backend.put(&loc("x"), data.clone()).await.unwrap();
        assert_eq!(backend.len(), 1);
        assert_eq!(backend.get(&loc("x")).await.unwrap(), data);
    }

    #[tokio::test]
    async fn exists_and_delete() {
        let backend = MemoryBackend::new();
        assert!(!backend.exists(&loc("d")).await.unwrap());
        backend.put(&loc("d"), Bytes::from_static(b"1")).await.unwrap();
        assert!(backend.exists(&loc("d")).await.unwrap());
        assert!(backend.delete(&loc("d")).await.unwrap());
        assert!(!backend.delete(&loc("d")).await.unwrap());
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn list_filters_by_prefix() {
        let backend = MemoryBackend::new();
        for l in ["ns/refs/b", "ns/refs/a", "ns/blobs/aa/x", "ns2/refs/c"] {
            backend.put(&loc(l), Bytes::from_static(b"v")).await.unwrap();
        }
        assert_eq!(
            backend.list("ns/refs").await.unwrap(),
            vec![loc("ns/refs/a"), loc("ns/refs/b")]
        );
        assert_eq!(backend.list("ns").await.unwrap().len(), 3);
        assert!(backend.list("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn accounting_helpers() {
        let backend = MemoryBackend::new();
        backend.put(&loc("b"), Bytes::from_static(b"12345")).await.unwrap();
        backend.put(&loc("a"), Bytes::from_static(b"123456789")).await.unwrap();
        assert_eq!(backend.total_bytes(), 14);
        assert_eq!(backend.locators(), vec![loc("a"), loc("b")]);
        assert!(format!("{backend:?}").contains("object_count"));
    }
}
