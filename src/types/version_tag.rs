// ABOUTME: Opaque server build identifier compared by equality only.
// ABOUTME: Rejects empty and whitespace-padded values at construction.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionTagError {
    #[error("version tag cannot be empty")]
    Empty,

    #[error("version tag has leading or trailing whitespace: '{0}'")]
    Whitespace(String),
}

/// Identifier of a published server build, e.g. `1.14.30.2`.
///
/// No ordering is defined. The remote source only ever publishes the latest
/// build, so any tag that differs from the installed one counts as newer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(value: &str) -> Result<Self, VersionTagError> {
        if value.trim().is_empty() {
            return Err(VersionTagError::Empty);
        }

        if value.trim() != value {
            return Err(VersionTagError::Whitespace(value.to_string()));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for VersionTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for VersionTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        VersionTag::new(&s).map_err(serde::de::Error::custom)
    }
}
