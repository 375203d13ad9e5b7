//! The [`RefStore`] trait defining the ref storage interface.
//!
//! The [`crate::RefManager`] owns expiry and locking; a store only keeps
//! records by name.

use async_trait::async_trait;

use crate::error::RefResult;
use crate::names::RefName;
use crate::types::RefRecord;

/// Storage for ref records.
///
/// Implementations must be thread-safe and make each individual call
/// atomic. They never interpret lifetimes: an expired record is returned
/// like any other until the manager removes it.
#[async_trait]
pub trait RefStore: Send + Sync + std::fmt::Debug {
    /// Read a record by name. Returns `Ok(None)` if there is none.
    async fn load(&self, name: &RefName) -> RefResult<Option<RefRecord>>;

    /// Create or replace the record named `record.name`.
    async fn save(&self, record: RefRecord) -> RefResult<()>;

    /// Remove a record. Returns `Ok(true)` if it existed.
    async fn remove(&self, name: &RefName) -> RefResult<bool>;

    /// Every stored record, sorted by name.
    async fn list(&self) -> RefResult<Vec<RefRecord>>;
}
