// ABOUTME: Validated domain types shared across the update pipeline.
// ABOUTME: Version tags and install-relative path patterns.

mod path_pattern;
mod version_tag;

pub use path_pattern::{PathPattern, matches_any};
pub use version_tag::{VersionTag, VersionTagError};
