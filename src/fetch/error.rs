// ABOUTME: Fetch error types with SNAFU context selectors.
// ABOUTME: Splits download failures from archive/extraction failures for the taxonomy.

use snafu::Snafu;
use std::path::PathBuf;

use crate::transport::TransportError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FetchError {
    #[snafu(display("failed to prepare staging directory {}: {source}", path.display()))]
    Staging {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("download of {uri} failed: {source}"))]
    Download { uri: String, source: TransportError },

    #[snafu(display("failed to finalize downloaded archive {}: {source}", path.display()))]
    Finalize {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("cannot open archive {}: {source}", path.display()))]
    OpenArchive {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[snafu(display("archive entry #{index} is unreadable: {source}"))]
    ReadEntry {
        index: usize,
        source: zip::result::ZipError,
    },

    #[snafu(display("archive entry '{name}' escapes the extraction directory"))]
    UnsafeEntry { name: String },

    #[snafu(display("archive entry '{name}' is a symbolic link"))]
    SymlinkEntry { name: String },

    #[snafu(display("failed to extract to {}: {source}", path.display()))]
    WriteEntry {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Archive could not be obtained.
    Download,
    /// Archive could not be unpacked safely.
    Archive,
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Staging { .. } | FetchError::Download { .. } | FetchError::Finalize { .. } => {
                FetchErrorKind::Download
            }
            FetchError::OpenArchive { .. }
            | FetchError::ReadEntry { .. }
            | FetchError::UnsafeEntry { .. }
            | FetchError::SymlinkEntry { .. }
            | FetchError::WriteEntry { .. } => FetchErrorKind::Archive,
        }
    }
}
