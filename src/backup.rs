// ABOUTME: Snapshot and restore of the install directory around the destructive step.
// ABOUTME: A manifest marks a snapshot as complete so partial copies are never restored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::fsops::{at, copy_dir_recursive, empty_dir, remove_path};
use crate::types::VersionTag;

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Snapshot could not be taken. Nothing has been changed in the install dir.
    #[error("failed to snapshot {} into {}: {source}", install.display(), backup.display())]
    Snapshot {
        install: PathBuf,
        backup: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Restore failed; the install dir is in an unknown state.
    #[error("failed to restore {} from {}: {source}", install.display(), backup.display())]
    Restore {
        install: PathBuf,
        backup: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Deep-copy `install_dir` into an emptied `backup_dir`.
///
/// A missing install dir produces an empty snapshot (first install).
pub fn snapshot(install_dir: &Path, backup_dir: &Path) -> Result<(), BackupError> {
    let wrap = |source| BackupError::Snapshot {
        install: install_dir.to_path_buf(),
        backup: backup_dir.to_path_buf(),
        source,
    };

    empty_dir(backup_dir).map_err(wrap)?;
    if install_dir.exists() {
        copy_dir_recursive(install_dir, backup_dir).map_err(wrap)?;
    }
    tracing::debug!(
        "snapshot of {} written to {}",
        install_dir.display(),
        backup_dir.display()
    );
    Ok(())
}

/// Empty `install_dir` and copy the snapshot back into it.
pub fn restore(backup_dir: &Path, install_dir: &Path) -> Result<(), BackupError> {
    let wrap = |source| BackupError::Restore {
        install: install_dir.to_path_buf(),
        backup: backup_dir.to_path_buf(),
        source,
    };

    if !backup_dir.is_dir() {
        return Err(wrap(io::Error::new(
            io::ErrorKind::NotFound,
            format!("snapshot directory {} is missing", backup_dir.display()),
        )));
    }

    empty_dir(install_dir).map_err(wrap)?;
    copy_dir_recursive(backup_dir, install_dir).map_err(wrap)?;
    tracing::debug!(
        "restored {} from {}",
        install_dir.display(),
        backup_dir.display()
    );
    Ok(())
}

/// Record of a completed snapshot, stored beside (not inside) the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotManifest {
    /// Version installed when the snapshot was taken, if known.
    pub version: Option<VersionTag>,
    pub taken_at: DateTime<Utc>,
}

impl SnapshotManifest {
    pub fn new(version: Option<VersionTag>) -> Self {
        Self {
            version,
            taken_at: Utc::now(),
        }
    }
}

pub fn write_manifest(path: &Path, manifest: &SnapshotManifest) -> io::Result<()> {
    let json = serde_json::to_string_pretty(manifest).map_err(io::Error::other)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(at(parent))?;
    }
    fs::write(path, json).map_err(at(path))
}

/// Read the manifest; `None` if absent or unreadable (treated as no usable snapshot).
pub fn read_manifest(path: &Path) -> Option<SnapshotManifest> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            tracing::warn!("ignoring unreadable snapshot manifest {}: {}", path.display(), e);
            None
        }
    }
}

pub fn clear_manifest(path: &Path) -> io::Result<()> {
    remove_path(path)
}
