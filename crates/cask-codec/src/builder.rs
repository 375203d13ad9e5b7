use std::collections::HashMap;

use cask_types::{BlobType, HashedBlobRef};

use crate::envelope::EncodedBlob;
use crate::varint::encode_varint;

/// Accumulates a blob payload and its outgoing references.
///
/// Fields are appended in call order; a [`crate::BlobReader`] must read them
/// back in the same order. References are written into the payload as
/// indices into a reference table. The table keeps one slot per distinct
/// target, but every `write_blob_ref` call still emits its own index, so
/// duplicates and ordering survive the round trip.
#[derive(Clone, Debug, Default)]
pub struct BlobBuilder {
    payload: Vec<u8>,
    imports: Vec<HashedBlobRef>,
    slots: HashMap<HashedBlobRef, usize>,
}

impl BlobBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append exactly `buf.len()` bytes with no length prefix.
    pub fn write_fixed_length_bytes(&mut self, buf: &[u8]) {
        self.payload.extend_from_slice(buf);
    }

    /// Append a varint length prefix followed by `buf`.
    pub fn write_variable_length_bytes(&mut self, buf: &[u8]) {
        encode_varint(&mut self.payload, buf.len() as u64);
        self.payload.extend_from_slice(buf);
    }

    pub fn write_unsigned_var_int(&mut self, value: u64) {
        encode_varint(&mut self.payload, value);
    }

    /// Append a UTF-8 string as variable-length bytes.
    pub fn write_string(&mut self, value: &str) {
        self.write_variable_length_bytes(value.as_bytes());
    }

    /// Append a reference to another blob.
    pub fn write_blob_ref(&mut self, target: &HashedBlobRef) {
        let slot = match self.slots.get(target) {
            Some(&slot) => slot,
            None => {
                let slot = self.imports.len();
                self.imports.push(target.clone());
                self.slots.insert(target.clone(), slot);
                slot
            }
        };
        encode_varint(&mut self.payload, slot as u64);
    }

    /// Payload bytes written so far.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty() && self.imports.is_empty()
    }

    /// Distinct reference targets, in first-use order.
    pub fn imports(&self) -> &[HashedBlobRef] {
        &self.imports
    }

    /// Seal the accumulated state into a blob of the given type and reset
    /// the builder.
    pub fn finish(&mut self, blob_type: BlobType) -> EncodedBlob {
        let payload = std::mem::take(&mut self.payload);
        let imports = std::mem::take(&mut self.imports);
        self.slots.clear();
        EncodedBlob::new(blob_type, imports, payload)
    }

    /// Discard everything written so far.
    pub fn clear(&mut self) {
        self.payload.clear();
        self.imports.clear();
        self.slots.clear();
    }
}
