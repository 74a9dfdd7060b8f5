// ABOUTME: Install step: replace the server tree with the staged update.
// ABOUTME: Preserved user data from the snapshot is merged last so it wins over archive defaults.

use std::io;
use std::path::{Path, PathBuf};

use crate::fileset::matching_entries;
use crate::fsops::{copy_dir_recursive, copy_entry, empty_dir, remove_path};
use crate::oracle::InstallMetadata;
use crate::types::{PathPattern, VersionTag};

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("failed to clear install directory {}: {source}", path.display())]
    Clear {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to copy staged update into {}: {source}", path.display())]
    CopyStaged {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to carry over preserved data '{}': {source}", rel.display())]
    Preserve {
        rel: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write install metadata in {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Swap the install dir over to the staged tree, then re-apply preserved paths.
///
/// Returns the preserved relative paths that were carried over.
pub fn swap(
    staging_dir: &Path,
    install_dir: &Path,
    backup_dir: &Path,
    preserve: &[PathPattern],
) -> Result<Vec<PathBuf>, InstallError> {
    empty_dir(install_dir).map_err(|source| InstallError::Clear {
        path: install_dir.to_path_buf(),
        source,
    })?;

    copy_dir_recursive(staging_dir, install_dir).map_err(|source| InstallError::CopyStaged {
        path: install_dir.to_path_buf(),
        source,
    })?;

    let preserved = matching_entries(backup_dir, preserve).map_err(|source| {
        InstallError::Preserve {
            rel: backup_dir.to_path_buf(),
            source,
        }
    })?;

    for rel in &preserved {
        let dst = install_dir.join(rel);
        // Replace rather than merge so stale archive files under a preserved
        // directory do not survive next to the user's copy.
        remove_path(&dst)
            .and_then(|()| copy_entry(&backup_dir.join(rel), &dst))
            .map_err(|source| InstallError::Preserve {
                rel: rel.clone(),
                source,
            })?;
        tracing::debug!("preserved {}", rel.display());
    }

    Ok(preserved)
}

/// Record the installed version.
pub fn commit(install_dir: &Path, version: &VersionTag) -> Result<(), InstallError> {
    InstallMetadata::new(version.clone())
        .write_atomic(install_dir)
        .map_err(|source| InstallError::Metadata {
            path: install_dir.to_path_buf(),
            source,
        })
}
