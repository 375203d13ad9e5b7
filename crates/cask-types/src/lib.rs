//! Foundation types for Cask.
//!
//! Every other Cask crate depends on `cask-types`. Nothing in here performs
//! I/O; these are the value types that flow between the codec, the blob
//! store, the ref manager and the alias index, plus the per-key lock map
//! both the blob store and the ref manager serialize on.
//!
//! # Key Types
//!
//! - [`ContentHash`] — BLAKE3 digest identifying a blob by its content
//! - [`BlobType`] — schema identifier (UUID + version) of a blob payload
//! - [`Locator`] — opaque, namespace-scoped storage address of a blob
//! - [`HashedBlobRef`] — the caller-visible `{hash, locator}` handle
//! - [`NamespaceId`] — name of an isolated storage domain
//! - [`Clock`] — injectable time source ([`SystemClock`], [`ManualClock`])
//! - [`KeyedLocks`] — async mutex per key, pruned when unused

pub mod blob_type;
pub mod clock;
pub mod error;
pub mod handle;
pub mod hash;
pub mod keyed_lock;
pub mod namespace;

pub use blob_type::BlobType;
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use error::TypeError;
pub use handle::{HashedBlobRef, Locator};
pub use hash::ContentHash;
pub use keyed_lock::{KeyGuard, KeyedLocks};
pub use namespace::NamespaceId;
