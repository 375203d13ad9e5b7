//! The stored form of a blob.
//!
//! Layout, in order:
//!
//! ```text
//! magic      "CSKB"
//! version    u8 (currently 1)
//! type id    16 bytes (UUID)
//! type ver   varint
//! imports    varint count, then per import: 32-byte hash, varint-prefixed locator
//! payload    varint-prefixed bytes
//! ```
//!
//! The content hash of a blob is the domain-separated BLAKE3 digest of this
//! whole encoding, so two blobs are identical exactly when their type,
//! reference table and payload all match.

use bytes::Bytes;
use cask_crypto::ContentHasher;
use cask_types::{BlobType, ContentHash, HashedBlobRef, Locator};
use uuid::Uuid;

use crate::error::{CodecError, CodecResult};
use crate::varint::{encode_varint, varint_len, Cursor};

pub const BLOB_MAGIC: [u8; 4] = *b"CSKB";
pub const BLOB_FORMAT_VERSION: u8 = 1;

/// A fully decoded blob: schema, outgoing references, and payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedBlob {
    pub blob_type: BlobType,
    /// Reference table. Payload references are indices into this list.
    pub imports: Vec<HashedBlobRef>,
    pub payload: Bytes,
}

impl EncodedBlob {
    pub fn new(blob_type: BlobType, imports: Vec<HashedBlobRef>, payload: impl Into<Bytes>) -> Self {
        Self {
            blob_type,
            imports,
            payload: payload.into(),
        }
    }

    /// Serialize into the canonical stored form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&BLOB_MAGIC);
        buf.push(BLOB_FORMAT_VERSION);
        buf.extend_from_slice(self.blob_type.id.as_bytes());
        encode_varint(&mut buf, u64::from(self.blob_type.version));

        encode_varint(&mut buf, self.imports.len() as u64);
        for import in &self.imports {
            buf.extend_from_slice(import.hash.as_bytes());
            let locator = import.locator.as_str().as_bytes();
            encode_varint(&mut buf, locator.len() as u64);
            buf.extend_from_slice(locator);
        }

        encode_varint(&mut buf, self.payload.len() as u64);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Exact size of [`EncodedBlob::to_bytes`].
    pub fn encoded_len(&self) -> usize {
        let imports: usize = self
            .imports
            .iter()
            .map(|i| {
                let len = i.locator.as_str().len();
                ContentHash::LEN + varint_len(len as u64) + len
            })
            .sum();
        BLOB_MAGIC.len()
            + 1
            + 16
            + varint_len(u64::from(self.blob_type.version))
            + varint_len(self.imports.len() as u64)
            + imports
            + varint_len(self.payload.len() as u64)
            + self.payload.len()
    }

    /// Content hash of the canonical encoding.
    pub fn compute_hash(&self) -> ContentHash {
        ContentHasher::BLOB.hash(&self.to_bytes())
    }

    /// Parse the canonical stored form.
    pub fn from_bytes(data: &[u8]) -> CodecResult<Self> {
        let mut cursor = Cursor::new(data);

        let magic = cursor.take(BLOB_MAGIC.len()).map_err(|_| CodecError::InvalidMagic {
            expected: BLOB_MAGIC,
            actual: data.to_vec(),
        })?;
        if magic != BLOB_MAGIC {
            return Err(CodecError::InvalidMagic {
                expected: BLOB_MAGIC,
                actual: magic.to_vec(),
            });
        }
        let version = cursor.take(1)?[0];
        if version != BLOB_FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }

        let at = cursor.position();
        let id = Uuid::from_slice(cursor.take(16)?)
            .map_err(|e| CodecError::corrupt(at, format!("blob type id: {e}")))?;
        let at = cursor.position();
        let type_version = u32::try_from(cursor.read_varint()?)
            .map_err(|_| CodecError::corrupt(at, "blob type version exceeds u32"))?;

        let at = cursor.position();
        let count = cursor.read_len()?;
        // Each import needs at least 33 bytes; reject absurd counts before allocating.
        if count > cursor.remaining() / (ContentHash::LEN + 1) {
            return Err(CodecError::corrupt(
                at,
                format!("import count {count} exceeds remaining data"),
            ));
        }
        let mut imports = Vec::with_capacity(count);
        for _ in 0..count {
            let hash = ContentHash::try_from(cursor.take(ContentHash::LEN)?)
                .map_err(|e| CodecError::corrupt(cursor.position(), e.to_string()))?;
            let at = cursor.position();
            let raw = cursor.read_prefixed()?;
            let locator = std::str::from_utf8(raw)
                .map_err(|e| CodecError::corrupt(at, format!("locator is not UTF-8: {e}")))
                .and_then(|s| {
                    Locator::new(s).map_err(|e| CodecError::corrupt(at, e.to_string()))
                })?;
            imports.push(HashedBlobRef::new(hash, locator));
        }

        let payload = cursor.read_prefixed()?;
        if cursor.remaining() != 0 {
            return Err(CodecError::corrupt(
                cursor.position(),
                format!("{} trailing bytes after payload", cursor.remaining()),
            ));
        }

        Ok(Self {
            blob_type: BlobType::new(id, type_version),
            imports,
            payload: Bytes::copy_from_slice(payload),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cask_types::NamespaceId;

    fn blob_type() -> BlobType {
        BlobType::parse("afdf76a7-4dee-5333-f5b5-37b8451251ca", 1).unwrap()
    }

    fn handle(seed: &[u8]) -> HashedBlobRef {
        let ns = NamespaceId::new("default").unwrap();
        let hash = ContentHash::of(seed);
        HashedBlobRef::new(hash, Locator::for_blob(&ns, &hash))
    }

    #[test]
    fn encode_decode_with_imports() {
        let blob = EncodedBlob::new(blob_type(), vec![handle(b"a"), handle(b"b")], b"payload".to_vec());
        let bytes = blob.to_bytes();
        assert_eq!(bytes.len(), blob.encoded_len());
        assert_eq!(EncodedBlob::from_bytes(&bytes).unwrap(), blob);
    }

    #[test]
    fn empty_blob() {
        let blob = EncodedBlob::new(blob_type(), vec![], Bytes::new());
        let decoded = EncodedBlob::from_bytes(&blob.to_bytes()).unwrap();
        assert!(decoded.payload.is_empty());
        assert!(decoded.imports.is_empty());
    }

    #[test]
    fn hash_covers_type_and_imports() {
        let plain = EncodedBlob::new(blob_type(), vec![], b"x".to_vec());
        let other_type = EncodedBlob::new(BlobType::new(blob_type().id, 2), vec![], b"x".to_vec());
        let with_ref = EncodedBlob::new(blob_type(), vec![handle(b"a")], b"x".to_vec());
        assert_ne!(plain.compute_hash(), other_type.compute_hash());
        assert_ne!(plain.compute_hash(), with_ref.compute_hash());
        assert_eq!(plain.compute_hash(), plain.clone().compute_hash());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = EncodedBlob::new(blob_type(), vec![], b"x".to_vec()).to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            EncodedBlob::from_bytes(&bytes),
            Err(CodecError::InvalidMagic { .. })
        ));
        assert!(matches!(
            EncodedBlob::from_bytes(b"CS"),
            Err(CodecError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = EncodedBlob::new(blob_type(), vec![], b"x".to_vec()).to_bytes();
        bytes[4] = 9;
        assert_eq!(
            EncodedBlob::from_bytes(&bytes),
            Err(CodecError::UnsupportedVersion(9))
        );
    }

    #[test]
    fn rejects_truncation_anywhere() {
        let bytes = EncodedBlob::new(blob_type(), vec![handle(b"a")], b"payload".to_vec()).to_bytes();
        for cut in 0..bytes.len() {
            assert!(EncodedBlob::from_bytes(&bytes[..cut]).is_err(), "cut at {cut}");
        }
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = EncodedBlob::new(blob_type(), vec![], b"x".to_vec()).to_bytes();
        bytes.push(0);
        assert!(matches!(
            EncodedBlob::from_bytes(&bytes),
            Err(CodecError::Corrupt { .. })
        ));
    }
}
