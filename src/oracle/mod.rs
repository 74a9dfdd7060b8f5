// ABOUTME: Version oracle: installed version, latest candidate, and comparison.
// ABOUTME: Discovery strategies sit behind the VersionSource trait.

mod error;
mod link;
mod metadata;
mod source;

pub use error::OracleError;
pub use link::LinkFormat;
pub use metadata::{InstallMetadata, METADATA_FILENAME};
pub use source::{PageScraper, PinnedSource, VersionSource, configured_source};

use std::fmt;
use std::path::Path;

use crate::types::VersionTag;

/// What is currently installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstalledVersion {
    Installed(VersionTag),
    NotInstalled,
}

impl InstalledVersion {
    pub fn tag(&self) -> Option<&VersionTag> {
        match self {
            InstalledVersion::Installed(tag) => Some(tag),
            InstalledVersion::NotInstalled => None,
        }
    }
}

impl fmt::Display for InstalledVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstalledVersion::Installed(tag) => write!(f, "{tag}"),
            InstalledVersion::NotInstalled => write!(f, "not installed"),
        }
    }
}

/// Latest published build. Produced fresh per run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCandidate {
    pub version: VersionTag,
    pub download_uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionComparison {
    UpToDate,
    UpdateAvailable,
}

impl VersionComparison {
    pub fn is_up_to_date(self) -> bool {
        matches!(self, VersionComparison::UpToDate)
    }
}

/// Read the installed version from the metadata file.
pub fn current_version(install_dir: &Path) -> Result<InstalledVersion, OracleError> {
    Ok(match InstallMetadata::read(install_dir)? {
        Some(meta) => InstalledVersion::Installed(meta.version),
        None => InstalledVersion::NotInstalled,
    })
}

/// Equality only: anything other than the installed tag is treated as newer.
pub fn compare(current: &InstalledVersion, candidate: &UpdateCandidate) -> VersionComparison {
    match current {
        InstalledVersion::Installed(tag) if *tag == candidate.version => {
            VersionComparison::UpToDate
        }
        _ => VersionComparison::UpdateAvailable,
    }
}
