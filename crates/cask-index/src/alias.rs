use serde::{Deserialize, Serialize};

use cask_types::HashedBlobRef;

use crate::error::{IndexError, IndexResult};

/// Longest alias key accepted, in bytes.
pub const MAX_ALIAS_KEY_LEN: usize = 1024;

/// A ranked secondary key pointing at a blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub key: String,
    /// Lower ranks sort first.
    pub rank: i32,
    pub target: HashedBlobRef,
    /// Insertion sequence within the owning index; breaks rank ties.
    pub seq: u64,
}

/// An alias requested on a blob writer, before its target is known.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingAlias {
    pub key: String,
    pub rank: i32,
}

impl PendingAlias {
    pub fn new(key: impl Into<String>, rank: i32) -> IndexResult<Self> {
        let key = key.into();
        validate_alias_key(&key)?;
        Ok(Self { key, rank })
    }
}

/// Alias keys are non-empty, bounded, and free of control characters.
pub fn validate_alias_key(key: &str) -> IndexResult<()> {
    let reason = if key.is_empty() {
        "must not be empty"
    } else if key.len() > MAX_ALIAS_KEY_LEN {
        "too long"
    } else if key.chars().any(char::is_control) {
        "contains control characters"
    } else {
        return Ok(());
    };
    Err(IndexError::InvalidKey {
        key: key.to_string(),
        reason: reason.into(),
    })
}
