use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Logical name of one collection of records (e.g. `banners`).
///
/// Namespaces address both remote collection paths and object-store
/// folders, so the character set is restricted to ASCII alphanumerics,
/// `-` and `_`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    pub fn parse(s: &str) -> Result<Self, InvalidNamespace> {
        if s.is_empty() {
            return Err(InvalidNamespace(s.to_string()));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(InvalidNamespace(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Namespace {
    type Err = InvalidNamespace;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error returned when a namespace contains forbidden characters.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Invalid namespace: {0:?}")]
pub struct InvalidNamespace(pub String);

/// Store-assigned record identifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct RecordKey(pub Uuid);

impl RecordKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for RecordKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
