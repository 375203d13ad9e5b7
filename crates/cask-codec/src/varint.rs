//! LEB128 unsigned varints and a bounds-checked byte cursor.

use crate::error::{CodecError, CodecResult};

/// Encode a variable-length integer (7 bits per byte, low group first).
pub fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Number of bytes `encode_varint` emits for `value`.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Decode a variable-length integer. Returns (value, bytes_consumed).
pub fn decode_varint(data: &[u8]) -> CodecResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in data.iter().enumerate() {
        let group = (byte & 0x7F) as u64;
        if shift == 63 && group > 1 {
            return Err(CodecError::corrupt(i, "varint overflow"));
        }
        value |= group << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        shift += 7;
        if shift > 63 {
            return Err(CodecError::corrupt(i, "varint overflow"));
        }
    }
    Err(CodecError::corrupt(data.len(), "truncated varint"))
}

/// Forward-only reader over a byte slice that refuses to run off the end.
#[derive(Clone, Debug)]
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub(crate) fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(CodecError::corrupt(
                self.pos,
                format!("need {len} bytes, {} remaining", self.remaining()),
            ));
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.data[start..self.pos])
    }

    pub(crate) fn read_varint(&mut self) -> CodecResult<u64> {
        let (value, consumed) = decode_varint(self.rest()).map_err(|e| match e {
            CodecError::Corrupt { offset, reason } => CodecError::Corrupt {
                offset: self.pos + offset,
                reason,
            },
            other => other,
        })?;
        self.pos += consumed;
        Ok(value)
    }

    /// Read a varint that is about to be used as a length or index.
    pub(crate) fn read_len(&mut self) -> CodecResult<usize> {
        let at = self.pos;
        let value = self.read_varint()?;
        usize::try_from(value)
            .map_err(|_| CodecError::corrupt(at, format!("length {value} exceeds address space")))
    }

    /// Read a varint length prefix followed by exactly that many bytes.
    pub(crate) fn read_prefixed(&mut self) -> CodecResult<&'a [u8]> {
        let at = self.pos;
        let len = self.read_len()?;
        if len > self.remaining() {
            return Err(CodecError::corrupt(
                at,
                format!("length prefix {len} exceeds {} remaining bytes", self.remaining()),
            ));
        }
        self.take(len)
    }
}
