use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use tracing::{debug, info, warn};

use cask_codec::EncodedBlob;
use cask_crypto::ContentHasher;
use cask_index::{Alias, AliasIndex};
use cask_types::{
    BlobType, Clock, ContentHash, HashedBlobRef, KeyGuard, KeyedLocks, Locator, NamespaceId,
    Timestamp,
};

use crate::backend::StorageBackend;
use crate::error::{BackendError, StoreError, StoreResult};
use crate::handle::{BlobData, BlobHandle};
use crate::writer::BlobWriter;

/// What the store remembers about a blob it has written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub locator: Locator,
    pub blob_type: BlobType,
    /// Distinct outgoing references, in reference-table order.
    pub imports: Vec<HashedBlobRef>,
    /// Encoded size in bytes.
    pub size: usize,
    /// Last time a writer completed with this content, referenced it, or
    /// pointed a ref at it. Reloaded blobs count as written at open.
    pub last_written: Timestamp,
}

impl CatalogEntry {
    pub fn blob_ref(&self, hash: ContentHash) -> HashedBlobRef {
        HashedBlobRef::new(hash, self.locator.clone())
    }
}

struct StoreInner {
    namespace: NamespaceId,
    backend: Arc<dyn StorageBackend>,
    aliases: Arc<AliasIndex>,
    clock: Arc<dyn Clock>,
    catalog: RwLock<HashMap<ContentHash, CatalogEntry>>,
    /// Serializes persisting, retaining, and deleting one hash.
    blob_locks: KeyedLocks<ContentHash>,
}

/// Content-addressed blob storage for one namespace.
///
/// Cheap to clone; clones share the backend, catalog, and alias index.
/// Blobs are immutable once stored and are only removed by garbage
/// collection through [`BlobStore::delete_blob`].
///
/// Backend layout under the namespace prefix:
///
/// ```text
/// {namespace}/blobs/{hh}/{hash}     encoded blob
/// {namespace}/aliases/{hh}/{hash}   JSON list of the blob's aliases
/// ```
#[derive(Clone)]
pub struct BlobStore {
    inner: Arc<StoreInner>,
}

impl BlobStore {
    pub fn new(
        namespace: NamespaceId,
        backend: Arc<dyn StorageBackend>,
        aliases: Arc<AliasIndex>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                namespace,
                backend,
                aliases,
                clock,
                catalog: RwLock::new(HashMap::new()),
                blob_locks: KeyedLocks::new(),
            }),
        }
    }

    /// Build a store and load the catalog and aliases of everything the
    /// backend already holds for `namespace`.
    pub async fn open(
        namespace: NamespaceId,
        backend: Arc<dyn StorageBackend>,
        aliases: Arc<AliasIndex>,
        clock: Arc<dyn Clock>,
    ) -> StoreResult<Self> {
        let store = Self::new(namespace, backend, aliases, clock);
        store.reload().await?;
        Ok(store)
    }

    pub fn namespace(&self) -> &NamespaceId {
        &self.inner.namespace
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.inner.backend
    }

    pub fn aliases(&self) -> &Arc<AliasIndex> {
        &self.inner.aliases
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    /// Start a new blob. Nothing is visible until the writer completes.
    pub fn create_writer(&self) -> BlobWriter {
        BlobWriter::new(self.clone())
    }

    /// Wrap a known `(hash, locator)` pair without touching the backend.
    pub fn blob_ref(&self, hash: ContentHash, locator: Locator) -> BlobHandle {
        BlobHandle::new(self.clone(), HashedBlobRef::new(hash, locator))
    }

    /// The locator this store assigns to `hash`.
    pub fn locator_for(&self, hash: &ContentHash) -> Locator {
        Locator::for_blob(&self.inner.namespace, hash)
    }

    /// Returns `true` if `target` lives in this namespace's key space.
    pub fn owns(&self, target: &HashedBlobRef) -> bool {
        target.locator.has_prefix(self.inner.namespace.as_str())
    }

    /// Fetch, verify, and decode a blob.
    ///
    /// Fails with [`StoreError::BlobNotFound`] if nothing is stored at the
    /// locator, [`StoreError::HashMismatch`] if the stored bytes hash to
    /// something else, and [`StoreError::DanglingReference`] if any blob it
    /// references no longer resolves.
    pub async fn read_blob_data(&self, target: &HashedBlobRef) -> StoreResult<BlobData> {
        let raw = match self.inner.backend.get(&target.locator).await {
            Ok(raw) => raw,
            Err(BackendError::NotFound(_)) => {
                return Err(StoreError::BlobNotFound {
                    hash: target.hash,
                    locator: target.locator.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let computed = ContentHasher::BLOB.hash(&raw);
        if computed != target.hash {
            warn!(
                locator = %target.locator,
                expected = %target.hash.short_hex(),
                computed = %computed.short_hex(),
                "blob hash mismatch"
            );
            return Err(StoreError::HashMismatch {
                locator: target.locator.clone(),
                expected: target.hash,
                computed,
            });
        }

        let blob = EncodedBlob::from_bytes(&raw).map_err(|source| {
            warn!(locator = %target.locator, error = %source, "corrupt blob");
            StoreError::CorruptBlob {
                locator: target.locator.clone(),
                source,
            }
        })?;

        for import in &blob.imports {
            if !self.resolves(import).await? {
                warn!(
                    container = %target.hash.short_hex(),
                    missing = %import,
                    "dangling blob reference"
                );
                return Err(StoreError::DanglingReference {
                    container: target.hash,
                    missing: import.clone(),
                });
            }
        }

        Ok(BlobData::new(
            BlobHandle::new(self.clone(), target.clone()),
            blob,
        ))
    }

    /// Returns `true` if the catalog knows `hash`.
    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.catalog_read().contains_key(hash)
    }

    /// Returns `true` if the backend holds bytes for `target`.
    ///
    /// Always asks the backend: the catalog can be stale if something
    /// outside this store removed the bytes.
    pub async fn resolves(&self, target: &HashedBlobRef) -> StoreResult<bool> {
        Ok(self.inner.backend.exists(&target.locator).await?)
    }

    /// Outgoing references of `target`, from the catalog when known and
    /// otherwise by decoding the stored bytes. Unlike
    /// [`BlobStore::read_blob_data`] this does not require the references
    /// to resolve.
    pub async fn imports_of(&self, target: &HashedBlobRef) -> StoreResult<Vec<HashedBlobRef>> {
        let known = self
            .catalog_read()
            .get(&target.hash)
            .map(|entry| entry.imports.clone());
        if let Some(imports) = known {
            return Ok(imports);
        }
        let raw = match self.inner.backend.get(&target.locator).await {
            Ok(raw) => raw,
            Err(BackendError::NotFound(_)) => {
                return Err(StoreError::BlobNotFound {
                    hash: target.hash,
                    locator: target.locator.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let blob = EncodedBlob::from_bytes(&raw).map_err(|source| StoreError::CorruptBlob {
            locator: target.locator.clone(),
            source,
        })?;
        Ok(blob.imports)
    }

    /// Catalog entry for `hash`, if this process has written it.
    pub fn catalog_entry(&self, hash: &ContentHash) -> Option<CatalogEntry> {
        self.catalog_read().get(hash).cloned()
    }

    /// Every catalogued blob, sorted by hash.
    pub fn catalog_snapshot(&self) -> Vec<(ContentHash, CatalogEntry)> {
        let mut entries: Vec<_> = self
            .catalog_read()
            .iter()
            .map(|(hash, entry)| (*hash, entry.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Number of catalogued blobs.
    pub fn len(&self) -> usize {
        self.catalog_read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog_read().is_empty()
    }

    /// Confirm `target` is stored and refresh its catalog age, so a sweep
    /// running concurrently keeps it. Returns `false` if it is gone.
    pub async fn retain(&self, target: &HashedBlobRef) -> StoreResult<bool> {
        let _guard = self.lock_blob(target.hash).await;
        if !self.resolves(target).await? {
            return Ok(false);
        }
        let now = self.inner.clock.now();
        if let Some(entry) = self.catalog_write().get_mut(&target.hash) {
            entry.last_written = entry.last_written.max(now);
        }
        Ok(true)
    }

    /// Remove a blob, its alias record, its catalog entry, and every alias
    /// pointing at it, provided it was last written at or before `cutoff`.
    ///
    /// Only garbage collection calls this. Returns `false`, deleting
    /// nothing, if the blob is not catalogued or was written, referenced,
    /// or retained after `cutoff`.
    pub async fn delete_blob(&self, hash: &ContentHash, cutoff: Timestamp) -> StoreResult<bool> {
        let _guard = self.lock_blob(*hash).await;
        let locator = match self.catalog_read().get(hash) {
            Some(entry) if entry.last_written <= cutoff => entry.locator.clone(),
            _ => return Ok(false),
        };

        let removed = self.inner.backend.delete(&locator).await?;
        self.inner
            .backend
            .delete(&Locator::for_aliases(&self.inner.namespace, hash))
            .await?;
        self.catalog_write().remove(hash);
        let aliases = self.inner.aliases.remove_target(hash);
        debug!(
            namespace = %self.inner.namespace,
            hash = %hash.short_hex(),
            removed,
            aliases,
            "blob deleted"
        );
        Ok(true)
    }

    /// Flush the backend.
    pub async fn flush(&self) -> StoreResult<()> {
        Ok(self.inner.backend.flush().await?)
    }

    /// Record a completed blob, refreshing `last_written` on a repeat.
    pub(crate) fn record(&self, hash: ContentHash, entry: CatalogEntry) {
        self.catalog_write().insert(hash, entry);
    }

    pub(crate) async fn lock_blob(&self, hash: ContentHash) -> KeyGuard<'_, ContentHash> {
        self.inner.blob_locks.lock(hash).await
    }

    /// Append `entries` to the stored alias record of `target`.
    pub(crate) async fn persist_aliases(
        &self,
        target: &HashedBlobRef,
        entries: &[Alias],
    ) -> StoreResult<()> {
        let locator = Locator::for_aliases(&self.inner.namespace, &target.hash);
        let mut record = self.load_alias_record(&locator).await?;
        record.extend_from_slice(entries);
        let encoded = serde_json::to_vec(&record).map_err(|source| StoreError::AliasRecord {
            locator: locator.clone(),
            source,
        })?;
        self.inner.backend.put(&locator, Bytes::from(encoded)).await?;
        Ok(())
    }

    async fn load_alias_record(&self, locator: &Locator) -> StoreResult<Vec<Alias>> {
        let raw = match self.inner.backend.get(locator).await {
            Ok(raw) => raw,
            Err(BackendError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&raw).map_err(|source| StoreError::AliasRecord {
            locator: locator.clone(),
            source,
        })
    }

    /// Rebuild the catalog and alias index from the backend. Unreadable
    /// entries are logged and skipped.
    async fn reload(&self) -> StoreResult<()> {
        let namespace = &self.inner.namespace;
        let backend = &self.inner.backend;
        let now = self.inner.clock.now();

        let mut blobs = 0;
        for locator in backend.list(&format!("{namespace}/blobs")).await? {
            let raw = match backend.get(&locator).await {
                Ok(raw) => raw,
                Err(BackendError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            };
            let hash = ContentHasher::BLOB.hash(&raw);
            if locator != self.locator_for(&hash) {
                warn!(%locator, computed = %hash.short_hex(), "stored blob does not match its locator");
                continue;
            }
            let blob = match EncodedBlob::from_bytes(&raw) {
                Ok(blob) => blob,
                Err(error) => {
                    warn!(%locator, %error, "corrupt blob skipped on open");
                    continue;
                }
            };
            self.record(
                hash,
                CatalogEntry {
                    locator,
                    blob_type: blob.blob_type,
                    imports: blob.imports,
                    size: raw.len(),
                    last_written: now,
                },
            );
            blobs += 1;
        }

        let mut aliases = Vec::new();
        for locator in backend.list(&format!("{namespace}/aliases")).await? {
            match self.load_alias_record(&locator).await {
                Ok(record) => aliases.extend(
                    record
                        .into_iter()
                        .filter(|alias| self.contains(&alias.target.hash)),
                ),
                Err(error) => warn!(%locator, %error, "alias record skipped on open"),
            }
        }
        let aliases = self.inner.aliases.restore(aliases);

        if blobs > 0 || aliases > 0 {
            info!(%namespace, blobs, aliases, "blob store reloaded");
        }
        Ok(())
    }

    fn catalog_read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<ContentHash, CatalogEntry>> {
        self.inner.catalog.read().expect("blob catalog lock poisoned")
    }

    fn catalog_write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<ContentHash, CatalogEntry>> {
        self.inner.catalog.write().expect("blob catalog lock poisoned")
    }
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("namespace", &self.inner.namespace)
            .field("backend", &self.inner.backend)
            .field("blob_count", &self.len())
            .finish()
    }
}
