// ABOUTME: Persisted install metadata (serverData.json) beside the server files.
// ABOUTME: Absent file means no prior install; writes go through temp-file-then-rename.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::OracleError;
use crate::types::VersionTag;

pub const METADATA_FILENAME: &str = "serverData.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallMetadata {
    pub version: VersionTag,
}

impl InstallMetadata {
    pub fn new(version: VersionTag) -> Self {
        Self { version }
    }

    pub fn path(install_dir: &Path) -> PathBuf {
        install_dir.join(METADATA_FILENAME)
    }

    /// Read metadata, returning `None` when the file does not exist.
    pub fn read(install_dir: &Path) -> Result<Option<Self>, OracleError> {
        let path = Self::path(install_dir);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(OracleError::MetadataCorrupt {
                    path,
                    reason: format!("unreadable: {err}"),
                });
            }
        };

        serde_json::from_str::<InstallMetadata>(&raw)
            .map(Some)
            .map_err(|e| OracleError::MetadataCorrupt {
                path,
                reason: e.to_string(),
            })
    }

    /// Write metadata atomically: a crash mid-write leaves the old file intact.
    pub fn write_atomic(&self, install_dir: &Path) -> io::Result<()> {
        let path = Self::path(install_dir);
        let tmp = install_dir.join(format!(".{METADATA_FILENAME}.tmp"));

        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        let result = (|| {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }
}
