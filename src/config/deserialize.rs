// ABOUTME: Custom serde helpers for config types.
// ABOUTME: Compiles regular expressions at load time so bad patterns fail early.

use regex::Regex;
use serde::{Deserialize, Serializer};

pub fn deserialize_regex<'de, D>(deserializer: D) -> Result<Regex, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Regex::new(&s).map_err(|e| serde::de::Error::custom(format!("invalid regex '{s}': {e}")))
}

pub fn serialize_regex<S>(regex: &Regex, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(regex.as_str())
}
