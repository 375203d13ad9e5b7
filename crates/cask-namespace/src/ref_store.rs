//! Refs kept in the namespace's storage backend.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

use cask_refs::{RefError, RefName, RefRecord, RefResult, RefStore};
use cask_store::{BackendError, StorageBackend};
use cask_types::{Locator, NamespaceId};

/// [`RefStore`] that keeps one JSON record per ref at
/// `{namespace}/refs/{hex(name)}`.
///
/// Names are hex-encoded so that `/` inside a ref name never turns into
/// a directory on a file-system backend.
#[derive(Debug, Clone)]
pub struct BackendRefStore {
    namespace: NamespaceId,
    backend: Arc<dyn StorageBackend>,
}

impl BackendRefStore {
    pub fn new(namespace: NamespaceId, backend: Arc<dyn StorageBackend>) -> Self {
        Self { namespace, backend }
    }

    fn prefix(&self) -> String {
        format!("{}/refs", self.namespace)
    }

    fn locator_for(&self, name: &RefName) -> RefResult<Locator> {
        Locator::new(format!("{}/{}", self.prefix(), hex::encode(name.as_str())))
            .map_err(|e| RefError::Store(e.to_string()))
    }

    async fn read(&self, locator: &Locator) -> RefResult<Option<RefRecord>> {
        let raw = match self.backend.get(locator).await {
            Ok(raw) => raw,
            Err(BackendError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(backend_error(e)),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| RefError::Store(format!("bad ref record at {locator}: {e}")))
    }
}

fn backend_error(e: BackendError) -> RefError {
    RefError::Store(e.to_string())
}

#[async_trait]
impl RefStore for BackendRefStore {
    async fn load(&self, name: &RefName) -> RefResult<Option<RefRecord>> {
        self.read(&self.locator_for(name)?).await
    }

    async fn save(&self, record: RefRecord) -> RefResult<()> {
        let locator = self.locator_for(&record.name)?;
        let encoded = serde_json::to_vec(&record).map_err(|e| RefError::Store(e.to_string()))?;
        self.backend
            .put(&locator, Bytes::from(encoded))
            .await
            .map_err(backend_error)
    }

    async fn remove(&self, name: &RefName) -> RefResult<bool> {
        self.backend
            .delete(&self.locator_for(name)?)
            .await
            .map_err(backend_error)
    }

    async fn list(&self) -> RefResult<Vec<RefRecord>> {
        let locators = self
            .backend
            .list(&self.prefix())
            .await
            .map_err(backend_error)?;
        let mut records = Vec::with_capacity(locators.len());
        for locator in locators {
            match self.read(&locator).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(error) => warn!(%locator, %error, "unreadable ref record skipped"),
            }
        }
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use cask_refs::RefOptions;
    use cask_store::MemoryBackend;
    use cask_types::{Clock, ContentHash, HashedBlobRef, ManualClock};

    use super::*;

    fn ns() -> NamespaceId {
        NamespaceId::new("refs-test").unwrap()
    }

    fn record(name: &str) -> RefRecord {
        let hash = ContentHash::of(name.as_bytes());
        RefRecord::new(
            RefName::new(name).unwrap(),
            HashedBlobRef::new(hash, Locator::for_blob(&ns(), &hash)),
            RefOptions::permanent(),
            ManualClock::new().now(),
        )
    }

    #[tokio::test]
    async fn records_round_trip_through_the_backend() {
        let backend = Arc::new(MemoryBackend::new());
        let store = BackendRefStore::new(ns(), backend.clone());
        let rec = record("sessions/alice");
        store.save(rec.clone()).await.unwrap();

        assert_eq!(
            backend.locators(),
            vec![Locator::new(format!("refs-test/refs/{}", hex::encode("sessions/alice"))).unwrap()]
        );
        let reopened = BackendRefStore::new(ns(), backend);
        assert_eq!(reopened.load(&rec.name).await.unwrap(), Some(rec.clone()));
        assert!(reopened.remove(&rec.name).await.unwrap());
        assert!(!reopened.remove(&rec.name).await.unwrap());
        assert_eq!(reopened.load(&rec.name).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_is_sorted_and_skips_garbage() {
        let backend = Arc::new(MemoryBackend::new());
        let store = BackendRefStore::new(ns(), backend.clone());
        for name in ["c", "a", "b"] {
            store.save(record(name)).await.unwrap();
        }
        backend.corrupt(
            &Locator::new("refs-test/refs/ff").unwrap(),
            Bytes::from_static(b"{"),
        );
        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name.to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn corrupt_record_is_a_store_error() {
        let backend = Arc::new(MemoryBackend::new());
        let store = BackendRefStore::new(ns(), backend.clone());
        let name = RefName::new("broken").unwrap();
        backend.corrupt(&store.locator_for(&name).unwrap(), Bytes::from_static(b"nope"));
        assert!(matches!(store.load(&name).await, Err(RefError::Store(_))));
    }
}
