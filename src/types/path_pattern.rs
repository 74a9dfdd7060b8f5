// ABOUTME: Glob patterns over install-relative paths for exclude/preserve lists.
// ABOUTME: Matches '/'-separated relative paths; '*' never crosses a separator.

use glob::{MatchOptions, Pattern, PatternError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Component, Path};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A glob pattern evaluated against paths relative to a tree root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    pattern: Pattern,
}

impl PathPattern {
    pub fn new(raw: &str) -> Result<Self, PatternError> {
        let trimmed = raw.trim().trim_start_matches("./").trim_end_matches('/');
        let pattern = Pattern::new(trimmed)?;
        Ok(Self {
            raw: trimmed.to_string(),
            pattern,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check a path relative to the tree root.
    pub fn matches_relative(&self, rel: &Path) -> bool {
        let normalized = normalize(rel);
        !normalized.is_empty() && self.pattern.matches_with(&normalized, MATCH_OPTIONS)
    }
}

/// Check a relative path against a pattern list.
pub fn matches_any(patterns: &[PathPattern], rel: &Path) -> bool {
    patterns.iter().any(|p| p.matches_relative(rel))
}

fn normalize(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Serialize for PathPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for PathPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PathPattern::new(&s).map_err(|e| serde::de::Error::custom(format!("invalid pattern '{s}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_matches_top_level_entry_only() {
        let p = PathPattern::new("worlds").unwrap();
        assert!(p.matches_relative(Path::new("worlds")));
        assert!(!p.matches_relative(Path::new("backup/worlds")));
    }

    #[test]
    fn star_does_not_cross_directories() {
        let p = PathPattern::new("*.log").unwrap();
        assert!(p.matches_relative(Path::new("server.log")));
        assert!(!p.matches_relative(Path::new("logs/server.log")));

        let deep = PathPattern::new("**/*.log").unwrap();
        assert!(deep.matches_relative(Path::new("logs/server.log")));
    }

    #[test]
    fn leading_dot_slash_and_trailing_slash_are_ignored() {
        let p = PathPattern::new("./development_behavior_packs/").unwrap();
        assert_eq!(p.as_str(), "development_behavior_packs");
        assert!(p.matches_relative(Path::new("development_behavior_packs")));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(PathPattern::new("[").is_err());
    }

    #[test]
    fn empty_relative_path_never_matches() {
        let p = PathPattern::new("**").unwrap();
        assert!(!p.matches_relative(Path::new("")));
    }
}
