use std::sync::Arc;

use tracing::{debug, info};

use cask_index::{Alias, AliasIndex};
use cask_refs::{RefManager, RefOptions, RefRecord};
use cask_store::{BlobData, BlobHandle, BlobStore, BlobWriter, StorageBackend, StoreError};
use cask_types::{Clock, ContentHash, HashedBlobRef, Locator, NamespaceId};

use crate::config::NamespaceConfig;
use crate::error::NamespaceResult;
use crate::gc::{self, GcReport};
use crate::ref_store::BackendRefStore;

/// An isolated storage domain: its own blobs, refs, and aliases on top of a
/// possibly shared backend.
#[derive(Debug)]
pub struct Namespace {
    config: NamespaceConfig,
    store: BlobStore,
    refs: RefManager,
    clock: Arc<dyn Clock>,
}

impl Namespace {
    /// Open a namespace whose refs are kept in `backend` next to its blobs.
    /// Blobs, aliases, and refs already stored there are picked up.
    pub async fn open(
        config: NamespaceConfig,
        backend: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
    ) -> NamespaceResult<Self> {
        let ref_store = Arc::new(BackendRefStore::new(config.id.clone(), backend.clone()));
        let store = BlobStore::open(
            config.id.clone(),
            backend,
            Arc::new(AliasIndex::new()),
            clock.clone(),
        )
        .await?;
        let refs = RefManager::new(ref_store, clock.clone());
        info!(
            namespace = %config.id,
            backend = %config.backend,
            gc_delay_hrs = config.gc_delay_hrs,
            blobs = store.len(),
            "namespace opened"
        );
        Ok(Self {
            config,
            store,
            refs,
            clock,
        })
    }

    pub fn id(&self) -> &NamespaceId {
        &self.config.id
    }

    pub fn config(&self) -> &NamespaceConfig {
        &self.config
    }

    pub fn blob_store(&self) -> &BlobStore {
        &self.store
    }

    pub fn refs(&self) -> &RefManager {
        &self.refs
    }

    // ---- Blobs ----

    pub fn create_writer(&self) -> BlobWriter {
        self.store.create_writer()
    }

    /// Handle for a known `(hash, locator)` pair. Does not touch the backend.
    pub fn blob_ref(&self, hash: ContentHash, locator: Locator) -> BlobHandle {
        self.store.blob_ref(hash, locator)
    }

    pub async fn read_blob_data(&self, target: &HashedBlobRef) -> NamespaceResult<BlobData> {
        Ok(self.store.read_blob_data(target).await?)
    }

    // ---- Refs ----

    /// Point `name` at `target`. The target must be a blob of this
    /// namespace that can currently be resolved; writing the ref counts as
    /// a fresh write of the blob for garbage collection.
    pub async fn write_ref(
        &self,
        name: &str,
        target: &HashedBlobRef,
        options: RefOptions,
    ) -> NamespaceResult<RefRecord> {
        if !self.store.owns(target) {
            return Err(StoreError::ForeignReference {
                namespace: self.config.id.clone(),
                target: target.clone(),
            }
            .into());
        }
        if !self.store.retain(target).await? {
            return Err(StoreError::BlobNotFound {
                hash: target.hash,
                locator: target.locator.clone(),
            }
            .into());
        }
        let record = self.refs.write_ref(name, target.clone(), options).await?;
        debug!(namespace = %self.config.id, name, "ref target set");
        Ok(record)
    }

    /// Resolve a live ref, failing with `RefError::NotFound` if there is
    /// none.
    pub async fn read_ref(&self, name: &str) -> NamespaceResult<BlobHandle> {
        let target = self.refs.read_ref(name).await?;
        Ok(self.store.blob_ref(target.hash, target.locator))
    }

    pub async fn try_read_ref(&self, name: &str) -> NamespaceResult<Option<BlobHandle>> {
        Ok(self
            .refs
            .try_read_ref(name)
            .await?
            .map(|target| self.store.blob_ref(target.hash, target.locator)))
    }

    pub async fn delete_ref(&self, name: &str) -> NamespaceResult<bool> {
        Ok(self.refs.delete_ref(name).await?)
    }

    // ---- Aliases ----

    /// Blobs tagged with `key`, lowest rank first.
    pub fn find_aliases(&self, key: &str) -> NamespaceResult<Vec<Alias>> {
        Ok(self.store.aliases().find(key)?)
    }

    // ---- Maintenance ----

    /// Purge expired refs and delete unreachable blobs older than the GC
    /// delay.
    pub async fn collect_garbage(&self) -> NamespaceResult<GcReport> {
        let report = gc::collect(
            &self.store,
            &self.refs,
            self.config.gc_delay(),
            self.clock.now(),
        )
        .await?;
        info!(
            namespace = %self.config.id,
            refs_purged = report.refs_purged,
            roots = report.roots,
            reachable = report.blobs_reachable,
            deleted = report.blobs_deleted,
            deferred = report.blobs_deferred,
            "garbage collection finished"
        );
        Ok(report)
    }
}
