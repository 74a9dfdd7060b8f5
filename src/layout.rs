// ABOUTME: Path layout of the scratch directory used by one update run.
// ABOUTME: Staging (download + extracted tree), backup snapshot, and its manifest.

use std::path::{Path, PathBuf};

pub const ARCHIVE_FILENAME: &str = "bedrock-server.zip";

/// Paths under the configured `temp_location`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempLayout {
    root: PathBuf,
}

impl TempLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Staging area: the downloaded archive and its extracted tree.
    pub fn download_dir(&self) -> PathBuf {
        self.root.join("download")
    }

    pub fn archive_path(&self) -> PathBuf {
        self.download_dir().join(ARCHIVE_FILENAME)
    }

    pub fn partial_archive_path(&self) -> PathBuf {
        self.download_dir().join(format!("{ARCHIVE_FILENAME}.part"))
    }

    pub fn extract_dir(&self) -> PathBuf {
        self.download_dir().join("server")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join("backup")
    }

    /// Written only once a snapshot has been fully copied.
    pub fn backup_manifest_path(&self) -> PathBuf {
        self.root.join("backup.json")
    }
}
