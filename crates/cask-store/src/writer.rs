use bytes::Bytes;
use tracing::debug;

use cask_codec::BlobBuilder;
use cask_crypto::ContentHasher;
use cask_index::PendingAlias;
use cask_types::{BlobType, HashedBlobRef};

use crate::error::{StoreError, StoreResult};
use crate::handle::BlobHandle;
use crate::store::{BlobStore, CatalogEntry};

/// Builds one blob in memory and commits it with [`BlobWriter::complete`].
///
/// Dropping a writer before `complete` discards everything it buffered:
/// no bytes reach the backend and no aliases are recorded. After
/// `complete` has been called, successfully or not, the writer is closed
/// and every further call fails with [`StoreError::WriterClosed`].
#[derive(Debug)]
pub struct BlobWriter {
    store: BlobStore,
    builder: BlobBuilder,
    aliases: Vec<PendingAlias>,
    closed: bool,
}

impl BlobWriter {
    pub(crate) fn new(store: BlobStore) -> Self {
        Self {
            store,
            builder: BlobBuilder::new(),
            aliases: Vec::new(),
            closed: false,
        }
    }

    pub fn write_fixed_length_bytes(&mut self, buf: &[u8]) -> StoreResult<()> {
        self.ensure_open()?;
        self.builder.write_fixed_length_bytes(buf);
        Ok(())
    }

    pub fn write_variable_length_bytes(&mut self, buf: &[u8]) -> StoreResult<()> {
        self.ensure_open()?;
        self.builder.write_variable_length_bytes(buf);
        Ok(())
    }

    pub fn write_unsigned_var_int(&mut self, value: u64) -> StoreResult<()> {
        self.ensure_open()?;
        self.builder.write_unsigned_var_int(value);
        Ok(())
    }

    pub fn write_string(&mut self, value: &str) -> StoreResult<()> {
        self.ensure_open()?;
        self.builder.write_string(value);
        Ok(())
    }

    /// Append a reference to a blob of the same namespace.
    ///
    /// The target is checked for existence at `complete`, not here.
    pub fn write_blob_ref(&mut self, target: &HashedBlobRef) -> StoreResult<()> {
        self.ensure_open()?;
        if !self.store.owns(target) {
            return Err(StoreError::ForeignReference {
                namespace: self.store.namespace().clone(),
                target: target.clone(),
            });
        }
        self.builder.write_blob_ref(target);
        Ok(())
    }

    /// Tag the blob with `key` at `rank` once it completes.
    pub fn add_alias(&mut self, key: impl Into<String>, rank: i32) -> StoreResult<()> {
        self.ensure_open()?;
        self.aliases.push(PendingAlias::new(key, rank)?);
        Ok(())
    }

    /// Payload bytes buffered so far.
    pub fn len(&self) -> usize {
        self.builder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builder.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Encode, hash, and persist the blob, then record its aliases.
    ///
    /// Identical content already stored in the namespace is not written
    /// again; the existing blob's handle is returned. Every referenced blob
    /// is retained, and the blob's own persist-and-record step holds its
    /// hash lock, so a concurrent sweep either finishes first (and the
    /// bytes are written again) or sees the fresh write and keeps them.
    pub async fn complete(&mut self, blob_type: BlobType) -> StoreResult<BlobHandle> {
        self.ensure_open()?;
        self.closed = true;

        let store = self.store.clone();
        let blob = self.builder.finish(blob_type);
        let pending = std::mem::take(&mut self.aliases);
        let encoded = blob.to_bytes();
        let hash = ContentHasher::BLOB.hash(&encoded);
        let locator = store.locator_for(&hash);
        let target = HashedBlobRef::new(hash, locator.clone());

        for import in &blob.imports {
            if !store.retain(import).await? {
                return Err(StoreError::DanglingReference {
                    container: hash,
                    missing: import.clone(),
                });
            }
        }

        let _guard = store.lock_blob(hash).await;
        let size = encoded.len();
        let deduplicated = store.contains(&hash) || store.backend().exists(&locator).await?;
        if deduplicated {
            debug!(namespace = %store.namespace(), hash = %hash.short_hex(), "blob deduplicated");
        } else {
            store.backend().put(&locator, Bytes::from(encoded)).await?;
            debug!(
                namespace = %store.namespace(),
                hash = %hash.short_hex(),
                size,
                imports = blob.imports.len(),
                "blob persisted"
            );
        }

        store.record(
            hash,
            CatalogEntry {
                locator,
                blob_type,
                imports: blob.imports,
                size,
                last_written: store.clock().now(),
            },
        );
        if !pending.is_empty() {
            let aliases = store.aliases().assign(&target, &pending);
            store.persist_aliases(&target, &aliases).await?;
            store.aliases().restore(aliases);
        }

        Ok(BlobHandle::new(store.clone(), target))
    }

    /// Flush the backend. Fails once the writer is closed.
    pub async fn flush(&self) -> StoreResult<()> {
        self.ensure_open()?;
        self.store.flush().await
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed {
            Err(StoreError::WriterClosed)
        } else {
            Ok(())
        }
    }
}
