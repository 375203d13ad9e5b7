//! Blob codec for Cask.
//!
//! A blob payload is an ordered run of primitive fields: fixed-length byte
//! runs, varint-prefixed byte runs, and references to other blobs. Writers
//! append with [`BlobBuilder`]; readers consume in the same order with
//! [`BlobReader`]. [`EncodedBlob`] is the stored envelope that carries the
//! blob type, the reference table, and the payload.
//!
//! Decoding never reads past the end of the buffer: any out-of-bounds read,
//! malformed varint, or oversized length prefix is a [`CodecError`].

pub mod builder;
pub mod envelope;
pub mod error;
pub mod reader;
pub mod varint;

pub use builder::BlobBuilder;
pub use envelope::{EncodedBlob, BLOB_FORMAT_VERSION, BLOB_MAGIC};
pub use error::{CodecError, CodecResult};
pub use reader::BlobReader;
