use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Schema identifier for a blob payload.
///
/// The `id` names the payload layout; two logically different layouts must
/// never share an id. `version` is bumped on backward-incompatible changes
/// to that layout.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlobType {
    pub id: Uuid,
    pub version: u32,
}

impl BlobType {
    pub const fn new(id: Uuid, version: u32) -> Self {
        Self { id, version }
    }

    /// Parse the id from a UUID string, braced or not.
    pub fn parse(id: &str, version: u32) -> Result<Self, TypeError> {
        let trimmed = id.trim_start_matches('{').trim_end_matches('}');
        let id = Uuid::parse_str(trimmed)
            .map_err(|e| TypeError::InvalidBlobType(format!("{id}: {e}")))?;
        Ok(Self { id, version })
    }
}

impl fmt::Debug for BlobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobType({self})")
    }
}

/// Formats as `{uuid}#{version}`.
impl fmt::Display for BlobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.id.hyphenated(), self.version)
    }
}

impl FromStr for BlobType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, version) = s
            .rsplit_once('#')
            .ok_or_else(|| TypeError::InvalidBlobType(format!("missing version: {s}")))?;
        let version = version
            .parse::<u32>()
            .map_err(|e| TypeError::InvalidBlobType(format!("{s}: {e}")))?;
        Self::parse(id, version)
    }
}
