//! Named refs for Cask.
//!
//! A ref is the only mutable entity in a namespace: a name pointing at a
//! blob, optionally with a lifetime. Refs are the roots that keep blobs
//! alive through garbage collection.
//!
//! # Lifetimes
//!
//! - **Permanent** refs never expire.
//! - **Expiring** refs vanish a fixed time after they were written.
//! - **Sliding** refs vanish a fixed time after they were last read or
//!   written.
//!
//! A ref is live strictly before `last_touched_at + lifetime`. Once
//! expired it is indistinguishable from a ref that was never written.
//!
//! # Modules
//!
//! - [`error`] — Error types for ref operations
//! - [`types`] — [`RefOptions`] and [`RefRecord`]
//! - [`traits`] — The [`RefStore`] trait defining the storage interface
//! - [`names`] — Ref name validation
//! - [`memory`] — In-memory [`InMemoryRefStore`]
//! - [`manager`] — [`RefManager`], expiry and per-name locking

pub mod error;
pub mod manager;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, RefResult};
pub use manager::RefManager;
pub use memory::InMemoryRefStore;
pub use names::{validate_ref_name, RefName, MAX_REF_NAME_LEN};
pub use traits::RefStore;
pub use types::{RefOptions, RefRecord};
