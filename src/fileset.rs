// ABOUTME: File-set curation over staged and installed trees.
// ABOUTME: Purges excluded paths from a staged update and finds preserved paths.

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::fsops::{at, remove_path};
use crate::types::{PathPattern, matches_any};

/// Find entries under `root` whose relative path matches any pattern.
///
/// A matching directory is reported once and its contents are not visited.
/// Returned paths are relative to `root`, in traversal order.
pub fn matching_entries(root: &Path, patterns: &[PathPattern]) -> io::Result<Vec<PathBuf>> {
    if patterns.is_empty() || !root.exists() {
        return Ok(Vec::new());
    }

    let mut matched = Vec::new();
    let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name().into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            at(&path)(io::Error::other(e))
        })?;
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| io::Error::other(format!("{}: {e}", entry.path().display())))?
            .to_path_buf();

        if matches_any(patterns, &rel) {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            matched.push(rel);
        }
    }

    Ok(matched)
}

/// Delete every entry under `dir` matching an exclusion pattern.
///
/// Idempotent, and an empty pattern list removes nothing. Returns the removed
/// relative paths.
pub fn purge(dir: &Path, patterns: &[PathPattern]) -> io::Result<Vec<PathBuf>> {
    let matched = matching_entries(dir, patterns)?;
    for rel in &matched {
        tracing::debug!("purging {}", rel.display());
        remove_path(&dir.join(rel))?;
    }
    Ok(matched)
}
