//! Core ref types.
//!
//! A ref is a named, mutable pointer to a blob. It may carry a lifetime,
//! after which it disappears as if it had never been written.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use cask_types::{HashedBlobRef, Timestamp};

use crate::error::{RefError, RefResult};
use crate::names::RefName;

/// How long a ref lives and whether access keeps it alive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefOptions {
    /// `None` means the ref never expires.
    pub lifetime: Option<Duration>,
    /// When set, every successful read or write restarts the lifetime.
    pub extend: bool,
}

impl RefOptions {
    /// A ref that never expires.
    pub fn permanent() -> Self {
        Self::default()
    }

    /// Expires `lifetime` after it was written, regardless of reads.
    pub fn expiring(lifetime: Duration) -> Self {
        Self {
            lifetime: Some(lifetime),
            extend: false,
        }
    }

    /// Expires `lifetime` after it was last read or written.
    pub fn sliding(lifetime: Duration) -> Self {
        Self {
            lifetime: Some(lifetime),
            extend: true,
        }
    }

    /// Reject lifetimes that cannot be turned into a deadline.
    pub fn validate(&self) -> RefResult<()> {
        match self.lifetime {
            Some(lifetime) if lifetime.is_zero() => Err(RefError::InvalidLifetime {
                reason: "lifetime must be greater than zero".into(),
            }),
            Some(lifetime) if chrono::Duration::from_std(lifetime).is_err() => {
                Err(RefError::InvalidLifetime {
                    reason: format!("lifetime {lifetime:?} is out of range"),
                })
            }
            _ => Ok(()),
        }
    }
}

/// A stored ref.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefRecord {
    pub name: RefName,
    pub target: HashedBlobRef,
    pub options: RefOptions,
    pub created_at: Timestamp,
    pub last_touched_at: Timestamp,
}

impl RefRecord {
    pub fn new(
        name: RefName,
        target: HashedBlobRef,
        options: RefOptions,
        now: Timestamp,
    ) -> Self {
        Self {
            name,
            target,
            options,
            created_at: now,
            last_touched_at: now,
        }
    }

    /// The instant the ref stops being visible, or `None` if it never does.
    pub fn deadline(&self) -> Option<Timestamp> {
        let lifetime = chrono::Duration::from_std(self.options.lifetime?).ok()?;
        self.last_touched_at.checked_add_signed(lifetime)
    }

    /// A ref is live strictly before its deadline.
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        self.deadline().map_or(true, |deadline| now < deadline)
    }

    /// Restart the lifetime if this ref slides. Returns `true` if it did.
    pub fn touch(&mut self, now: Timestamp) -> bool {
        if self.options.extend && self.options.lifetime.is_some() {
            self.last_touched_at = now;
            true
        } else {
            false
        }
    }
}
