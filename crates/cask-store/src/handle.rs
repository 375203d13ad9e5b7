use bytes::Bytes;

use cask_codec::{BlobReader, EncodedBlob};
use cask_types::{BlobType, ContentHash, HashedBlobRef, Locator};

use crate::error::{StoreError, StoreResult};
use crate::store::BlobStore;

/// A reference to a stored blob, bound to the store that can read it.
///
/// Holding a handle does not fetch anything; call
/// [`BlobHandle::read_blob_data`] to load the blob.
#[derive(Clone, Debug)]
pub struct BlobHandle {
    store: BlobStore,
    target: HashedBlobRef,
}

impl BlobHandle {
    pub(crate) fn new(store: BlobStore, target: HashedBlobRef) -> Self {
        Self { store, target }
    }

    pub fn hash(&self) -> ContentHash {
        self.target.hash
    }

    pub fn locator(&self) -> &Locator {
        &self.target.locator
    }

    /// The serializable `(hash, locator)` pair.
    pub fn target(&self) -> &HashedBlobRef {
        &self.target
    }

    pub fn into_target(self) -> HashedBlobRef {
        self.target
    }

    pub async fn read_blob_data(&self) -> StoreResult<BlobData> {
        self.store.read_blob_data(&self.target).await
    }

    /// Make sure the blob is durable in the backend.
    pub async fn flush(&self) -> StoreResult<()> {
        self.store.flush().await?;
        if self.store.backend().exists(&self.target.locator).await? {
            Ok(())
        } else {
            Err(StoreError::BlobNotFound {
                hash: self.target.hash,
                locator: self.target.locator.clone(),
            })
        }
    }
}

impl PartialEq for BlobHandle {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
    }
}

impl Eq for BlobHandle {}

/// A verified, decoded blob.
#[derive(Clone, Debug)]
pub struct BlobData {
    handle: BlobHandle,
    blob: EncodedBlob,
}

impl BlobData {
    pub(crate) fn new(handle: BlobHandle, blob: EncodedBlob) -> Self {
        Self { handle, blob }
    }

    /// Start decoding the payload from the beginning.
    pub fn reader(&self) -> BlobReader<'_> {
        BlobReader::new(&self.blob)
    }

    pub fn handle(&self) -> &BlobHandle {
        &self.handle
    }

    pub fn blob_type(&self) -> BlobType {
        self.blob.blob_type
    }

    /// Distinct outgoing references.
    pub fn imports(&self) -> &[HashedBlobRef] {
        &self.blob.imports
    }

    pub fn payload(&self) -> &Bytes {
        &self.blob.payload
    }

    pub fn into_blob(self) -> EncodedBlob {
        self.blob
    }
}
