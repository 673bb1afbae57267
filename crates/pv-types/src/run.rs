use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Separator between the fields of a run file name (`<id>.<namespace>.<suffix>`).
///
/// Neither a run id nor a namespace may contain it.
pub const FIELD_SEPARATOR: char = '.';

/// Characters that are forbidden anywhere in a run id or namespace.
const FORBIDDEN_CHARS: &[char] = &[FIELD_SEPARATOR, '/', '\\', '\0'];

/// Validate a single file-name component (run id or namespace).
///
/// A component must be non-empty and must not contain the field separator,
/// a path separator, or control characters. Anything else would either
/// corrupt file-name parsing or escape the store directory.
///
/// # Examples
///
/// ```
/// use pv_types::validate_component;
///
/// assert!(validate_component("unit-test").is_ok());
/// assert!(validate_component("").is_err());
/// assert!(validate_component("a.b").is_err());
/// assert!(validate_component("../etc").is_err());
/// ```
pub fn validate_component(name: &str) -> Result<(), TypeError> {
    if name.is_empty() {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: "must not be empty".into(),
        });
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(TypeError::InvalidName {
                name: name.to_string(),
                reason: format!("contains forbidden character: {ch:?}"),
            });
        }
    }

    if let Some(ch) = name.chars().find(|c| c.is_control()) {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: format!("contains control character: {ch:?}"),
        });
    }

    Ok(())
}

/// Identifier of a stored run, unique within its namespace.
///
/// Either supplied by the caller or generated by the store. Generated ids are
/// UUID v7 values rendered as 32 lowercase hex digits, so they sort by
/// creation time.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunId(String);

impl RunId {
    /// Wrap a caller-supplied id, validating it as a file-name component.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        validate_component(&id)?;
        Ok(Self(id))
    }

    /// Generate a fresh, time-ordered run id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().simple().to_string())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short representation (first 8 characters).
    pub fn short_id(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Debug for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RunId({})", self.0)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RunId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RunId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RunId> for String {
    fn from(id: RunId) -> Self {
        id.0
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Grouping tag for runs, typically the name of the profiled application.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Validate and wrap a namespace name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate_component(&name)?;
        Ok(Self(name))
    }

    /// The namespace as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable description attached to runs fetched from this namespace.
    pub fn describe_run(&self) -> String {
        format!("run in namespace `{}`", self.0)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({})", self.0)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Namespace {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Namespace {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
