//! Alias index for Cask.
//!
//! Maps an application string key to every blob that was tagged with it at
//! write time, ordered by ascending rank with insertion order breaking
//! ties. Each namespace owns one [`AliasIndex`].
//!
//! # Key Types
//!
//! - [`AliasIndex`] -- the per-namespace index
//! - [`Alias`] -- a resolved `(key, rank, target)` entry
//! - [`PendingAlias`] -- a validated alias awaiting its blob's hash

pub mod alias;
pub mod error;
pub mod index;

pub use alias::{validate_alias_key, Alias, PendingAlias, MAX_ALIAS_KEY_LEN};
pub use error::{IndexError, IndexResult};
pub use index::AliasIndex;
