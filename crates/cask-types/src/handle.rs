use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::hash::ContentHash;
use crate::namespace::NamespaceId;

/// Backend address of a blob within a namespace.
///
/// Callers treat a locator as opaque; only the blob store derives them.
/// Locators are relative, `/`-separated paths without empty or `..`
/// components so every backend can map them onto its own key space.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locator(String);

impl Locator {
    /// Validate and wrap a locator string.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        if value.is_empty() {
            return Err(TypeError::InvalidLocator("empty locator".into()));
        }
        if value.chars().any(|c| c.is_control() || c == '\\' || c == '@') {
            return Err(TypeError::InvalidLocator(format!(
                "forbidden character in {value:?}"
            )));
        }
        if value
            .split('/')
            .any(|part| part.is_empty() || part == "." || part == "..")
        {
            return Err(TypeError::InvalidLocator(format!(
                "malformed path component in {value:?}"
            )));
        }
        Ok(Self(value))
    }

    /// The locator the blob store assigns to `hash` inside `namespace`.
    ///
    /// Layout: `{namespace}/blobs/{first byte}/{hex}`.
    pub fn for_blob(namespace: &NamespaceId, hash: &ContentHash) -> Self {
        let hex = hash.to_hex();
        Self(format!("{namespace}/blobs/{}/{hex}", &hex[..2]))
    }

    /// Where the aliases attached to `hash` are kept.
    ///
    /// Layout: `{namespace}/aliases/{first byte}/{hex}`.
    pub fn for_aliases(namespace: &NamespaceId, hash: &ContentHash) -> Self {
        let hex = hash.to_hex();
        Self(format!("{namespace}/aliases/{}/{hex}", &hex[..2]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this locator lives under `prefix/`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl TryFrom<String> for Locator {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.0
    }
}

impl FromStr for Locator {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Locator({})", self.0)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-visible handle to a stored blob: its hash plus where it lives.
///
/// This is a plain value. Holding one does not fetch or pin the blob; the
/// blob store resolves it on demand.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HashedBlobRef {
    pub hash: ContentHash,
    pub locator: Locator,
}

impl HashedBlobRef {
    pub fn new(hash: ContentHash, locator: Locator) -> Self {
        Self { hash, locator }
    }
}

/// Formats as `{hash}@{locator}`.
impl fmt::Display for HashedBlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.hash, self.locator)
    }
}

impl FromStr for HashedBlobRef {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hash, locator) = s
            .split_once('@')
            .ok_or_else(|| TypeError::InvalidLocator(format!("missing '@' in {s:?}")))?;
        Ok(Self {
            hash: hash.parse()?,
            locator: locator.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns() -> NamespaceId {
        NamespaceId::new("default").unwrap()
    }

    #[test]
    fn blob_locator_layout() {
        let hash = ContentHash::from_bytes([0xab; 32]);
        let locator = Locator::for_blob(&ns(), &hash);
        assert_eq!(
            locator.as_str(),
            format!("default/blobs/ab/{}", hash.to_hex())
        );
        assert!(locator.has_prefix("default"));
        assert!(!locator.has_prefix("def"));

        let aliases = Locator::for_aliases(&ns(), &hash);
        assert_eq!(
            aliases.as_str(),
            format!("default/aliases/ab/{}", hash.to_hex())
        );
        assert!(Locator::new(aliases.as_str()).is_ok());
    }

    #[test]
    fn rejects_malformed_locators() {
        assert!(Locator::new("").is_err());
        assert!(Locator::new("/abs/path").is_err());
        assert!(Locator::new("a//b").is_err());
        assert!(Locator::new("a/../b").is_err());
        assert!(Locator::new("a\\b").is_err());
        assert!(Locator::new("a@b").is_err());
        assert!(Locator::new("a/b/c").is_ok());
    }

    #[test]
    fn handle_string_roundtrip() {
        let hash = ContentHash::of(b"x");
        let handle = HashedBlobRef::new(hash, Locator::for_blob(&ns(), &hash));
        let parsed: HashedBlobRef = handle.to_string().parse().unwrap();
        assert_eq!(parsed, handle);
    }

    #[test]
    fn handle_serializes_as_string_pair() {
        let hash = ContentHash::of(b"y");
        let handle = HashedBlobRef::new(hash, Locator::new("default/blobs/x").unwrap());
        let json = serde_json::to_value(&handle).unwrap();
        assert_eq!(json["hash"], serde_json::Value::String(hash.to_hex()));
        assert_eq!(json["locator"], "default/blobs/x");

        let bad = serde_json::json!({ "hash": hash.to_hex(), "locator": "" });
        assert!(serde_json::from_value::<HashedBlobRef>(bad).is_err());
    }
}
