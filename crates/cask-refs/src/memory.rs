//! In-memory ref store.
//!
//! [`InMemoryRefStore`] keeps all records in a `HashMap` protected by a
//! `RwLock`. Data is lost when the store is dropped.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{RefError, RefResult};
use crate::names::RefName;
use crate::traits::RefStore;
use crate::types::RefRecord;

/// An in-memory implementation of [`RefStore`].
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<HashMap<RefName, RefRecord>>,
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> RefError {
    RefError::Store(format!("lock poisoned: {e}"))
}

#[async_trait]
impl RefStore for InMemoryRefStore {
    async fn load(&self, name: &RefName) -> RefResult<Option<RefRecord>> {
        let refs = self.refs.read().map_err(poisoned)?;
        Ok(refs.get(name).cloned())
    }

    async fn save(&self, record: RefRecord) -> RefResult<()> {
        let mut refs = self.refs.write().map_err(poisoned)?;
        refs.insert(record.name.clone(), record);
        Ok(())
    }

    async fn remove(&self, name: &RefName) -> RefResult<bool> {
        let mut refs = self.refs.write().map_err(poisoned)?;
        Ok(refs.remove(name).is_some())
    }

    async fn list(&self) -> RefResult<Vec<RefRecord>> {
        let refs = self.refs.read().map_err(poisoned)?;
        let mut result: Vec<RefRecord> = refs.values().cloned().collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }
}
