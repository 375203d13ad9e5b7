use cask_types::{BlobType, HashedBlobRef};

use crate::envelope::EncodedBlob;
use crate::error::{CodecError, CodecResult};
use crate::varint::Cursor;

/// Sequential decoder over a blob's payload.
///
/// Mirrors [`crate::BlobBuilder`]: fields come back in the order they were
/// written. Payloads with a variable number of trailing records are read
/// with `while reader.remaining() > 0 { .. }`.
#[derive(Clone, Debug)]
pub struct BlobReader<'a> {
    blob_type: BlobType,
    cursor: Cursor<'a>,
    imports: &'a [HashedBlobRef],
}

impl<'a> BlobReader<'a> {
    pub fn new(blob: &'a EncodedBlob) -> Self {
        Self {
            blob_type: blob.blob_type,
            cursor: Cursor::new(&blob.payload),
            imports: &blob.imports,
        }
    }

    pub fn blob_type(&self) -> BlobType {
        self.blob_type
    }

    /// Undecoded payload bytes.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// The undecoded tail of the payload, without consuming it.
    pub fn remaining_memory(&self) -> &'a [u8] {
        self.cursor.rest()
    }

    /// Read exactly `len` bytes. The caller knows `len` from the schema.
    pub fn read_fixed_length_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        self.cursor.take(len)
    }

    /// Read a varint length prefix and then that many bytes.
    pub fn read_variable_length_bytes(&mut self) -> CodecResult<&'a [u8]> {
        self.cursor.read_prefixed()
    }

    pub fn read_unsigned_var_int(&mut self) -> CodecResult<u64> {
        self.cursor.read_varint()
    }

    pub fn read_string(&mut self) -> CodecResult<&'a str> {
        let at = self.cursor.position();
        let raw = self.cursor.read_prefixed()?;
        std::str::from_utf8(raw)
            .map_err(|e| CodecError::corrupt(at, format!("string is not UTF-8: {e}")))
    }

    /// Read a reference written by `write_blob_ref`.
    ///
    /// Only the handle is decoded; the target blob is not fetched.
    pub fn read_blob_ref(&mut self) -> CodecResult<HashedBlobRef> {
        let at = self.cursor.position();
        let slot = self.cursor.read_len()?;
        self.imports.get(slot).cloned().ok_or_else(|| {
            CodecError::corrupt(
                at,
                format!("reference slot {slot} outside table of {}", self.imports.len()),
            )
        })
    }
}
