//! Ref name validation.
//!
//! Valid ref names:
//! - Must be non-empty and at most [`MAX_REF_NAME_LEN`] bytes
//! - Must not contain whitespace or control characters
//! - Must not contain `..`
//! - Must not start or end with `/`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RefError, RefResult};

/// Longest ref name accepted, in bytes.
pub const MAX_REF_NAME_LEN: usize = 256;

/// Validate a ref name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use cask_refs::names::validate_ref_name;
///
/// assert!(validate_ref_name("sessions/alice").is_ok());
/// assert!(validate_ref_name("").is_err());
/// assert!(validate_ref_name("up/../out").is_err());
/// ```
pub fn validate_ref_name(name: &str) -> RefResult<()> {
    let invalid = |reason: String| RefError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("ref name must not be empty".into()));
    }
    if name.len() > MAX_REF_NAME_LEN {
        return Err(invalid(format!(
            "ref name is {} bytes, limit is {MAX_REF_NAME_LEN}",
            name.len()
        )));
    }
    if let Some(ch) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(format!("contains forbidden character: {ch:?}")));
    }
    if name.contains("..") {
        return Err(invalid("must not contain '..'".into()));
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid("must not start or end with '/'".into()));
    }
    Ok(())
}

/// A validated ref name, unique within a namespace.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    pub fn new(name: impl Into<String>) -> RefResult<Self> {
        let name = name.into();
        validate_ref_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = RefError;

    fn try_from(value: String) -> RefResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RefName {
    type Error = RefError;

    fn try_from(value: &str) -> RefResult<Self> {
        Self::new(value)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl FromStr for RefName {
    type Err = RefError;

    fn from_str(s: &str) -> RefResult<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefName({:?})", self.0)
    }
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in ["main", "sessions/alice", "a.b-c_d", "x/y/z", "日本"] {
            assert!(validate_ref_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn empty_rejected() {
        assert!(matches!(
            validate_ref_name(""),
            Err(RefError::InvalidName { .. })
        ));
    }

    #[test]
    fn whitespace_and_control_rejected() {
        for name in ["has space", "tab\there", "new\nline", "nul\0"] {
            assert!(validate_ref_name(name).is_err(), "{name:?} should be invalid");
        }
    }

    #[test]
    fn dot_dot_rejected() {
        assert!(validate_ref_name("a..b").is_err());
        assert!(validate_ref_name("../escape").is_err());
    }

    #[test]
    fn slash_edges_rejected() {
        assert!(validate_ref_name("/lead").is_err());
        assert!(validate_ref_name("trail/").is_err());
        assert!(validate_ref_name("mid/dle").is_ok());
    }

    #[test]
    fn length_limit() {
        let at_limit = "a".repeat(MAX_REF_NAME_LEN);
        assert!(validate_ref_name(&at_limit).is_ok());
        assert!(validate_ref_name(&format!("{at_limit}a")).is_err());
    }

    #[test]
    fn ref_name_serde_validates() {
        let name = RefName::new("sessions/bob").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"sessions/bob\"");
        assert_eq!(serde_json::from_str::<RefName>(&json).unwrap(), name);
        assert!(serde_json::from_str::<RefName>("\"bad name\"").is_err());
    }
}
