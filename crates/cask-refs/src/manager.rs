//! Expiry and per-name serialization on top of a [`RefStore`].

use std::sync::Arc;

use tracing::debug;

use cask_types::{Clock, HashedBlobRef, KeyedLocks};

use crate::error::{RefError, RefResult};
use crate::names::RefName;
use crate::traits::RefStore;
use crate::types::{RefOptions, RefRecord};

/// The ref space of one namespace.
///
/// Every operation on a name runs under that name's own async mutex, so
/// writes to one name serialize (last writer wins) while unrelated names
/// never contend. A name's lock entry lives only while an operation on it
/// is running. Expiry is evaluated lazily against the injected clock;
/// an expired ref is removed the first time it is observed.
#[derive(Debug)]
pub struct RefManager {
    store: Arc<dyn RefStore>,
    clock: Arc<dyn Clock>,
    locks: KeyedLocks<RefName>,
}

impl RefManager {
    pub fn new(store: Arc<dyn RefStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            locks: KeyedLocks::new(),
        }
    }

    /// Point `name` at `target`, replacing any previous ref.
    pub async fn write_ref(
        &self,
        name: &str,
        target: HashedBlobRef,
        options: RefOptions,
    ) -> RefResult<RefRecord> {
        let name = RefName::new(name)?;
        options.validate()?;

        let _guard = self.locks.lock(name.clone()).await;
        let record = RefRecord::new(name, target, options, self.clock.now());
        self.store.save(record.clone()).await?;
        debug!(
            name = %record.name,
            target = %record.target,
            lifetime = ?record.options.lifetime,
            extend = record.options.extend,
            "ref written"
        );
        Ok(record)
    }

    /// Resolve a live ref, failing with [`RefError::NotFound`] if there is
    /// none.
    pub async fn read_ref(&self, name: &str) -> RefResult<HashedBlobRef> {
        self.try_read_ref(name).await?.ok_or_else(|| RefError::NotFound {
            name: name.to_string(),
        })
    }

    /// Resolve a live ref. Sliding refs are extended by the read.
    pub async fn try_read_ref(&self, name: &str) -> RefResult<Option<HashedBlobRef>> {
        Ok(self.try_read_record(name).await?.map(|record| record.target))
    }

    /// Like [`RefManager::try_read_ref`] but returns the whole record.
    pub async fn try_read_record(&self, name: &str) -> RefResult<Option<RefRecord>> {
        let name = RefName::new(name)?;
        let _guard = self.locks.lock(name.clone()).await;

        let Some(mut record) = self.store.load(&name).await? else {
            return Ok(None);
        };
        let now = self.clock.now();
        if !record.is_live_at(now) {
            self.store.remove(&name).await?;
            debug!(%name, "expired ref dropped on read");
            return Ok(None);
        }
        if record.touch(now) {
            self.store.save(record.clone()).await?;
        }
        Ok(Some(record))
    }

    /// Remove a ref. Returns `true` if a live ref was removed.
    pub async fn delete_ref(&self, name: &str) -> RefResult<bool> {
        let name = RefName::new(name)?;
        let _guard = self.locks.lock(name.clone()).await;

        let live = match self.store.load(&name).await? {
            Some(record) => record.is_live_at(self.clock.now()),
            None => return Ok(false),
        };
        self.store.remove(&name).await?;
        debug!(%name, live, "ref deleted");
        Ok(live)
    }

    /// Every live ref, sorted by name. Does not extend sliding refs.
    pub async fn list_live(&self) -> RefResult<Vec<RefRecord>> {
        let now = self.clock.now();
        Ok(self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|record| record.is_live_at(now))
            .collect())
    }

    /// Remove every expired ref. Returns how many were removed.
    pub async fn purge_expired(&self) -> RefResult<usize> {
        let candidates: Vec<RefName> = {
            let now = self.clock.now();
            self.store
                .list()
                .await?
                .into_iter()
                .filter(|record| !record.is_live_at(now))
                .map(|record| record.name)
                .collect()
        };

        let mut purged = 0;
        for name in candidates {
            let _guard = self.locks.lock(name.clone()).await;
            // A writer may have refreshed the ref since the scan.
            let still_expired = self
                .store
                .load(&name)
                .await?
                .is_some_and(|record| !record.is_live_at(self.clock.now()));
            if still_expired && self.store.remove(&name).await? {
                purged += 1;
            }
        }

        if purged > 0 {
            debug!(purged, "expired refs purged");
        }
        Ok(purged)
    }
}
