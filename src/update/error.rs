// ABOUTME: Error taxonomy for an update run.
// ABOUTME: Component errors convert into exactly one class; RestoreFailed is the only unrecoverable one.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backup::BackupError;
use crate::fetch::{FetchError, FetchErrorKind};
use crate::install::InstallError;
use crate::launch::LaunchError;
use crate::oracle::OracleError;

/// Errors that end or divert an update run.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("update source unreachable: {0}")]
    SourceUnreachable(String),

    #[error("{0}")]
    NoLinkFound(String),

    #[error("{0}")]
    UnexpectedFormat(String),

    #[error("{0}")]
    MetadataCorrupt(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("archive corrupt: {0}")]
    ArchiveCorrupt(String),

    /// Staging-area I/O outside download/extract (e.g. purging excluded files).
    #[error("staging failed: {0}")]
    StagingFailed(String),

    #[error("backup failed: {0}")]
    BackupFailed(String),

    #[error("install failed: {0}")]
    InstallFailed(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("restore failed: {0}")]
    RestoreFailed(String),

    #[error("update already in progress (held by {holder}, pid {pid}, since {started_at})")]
    UpdateInProgress {
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    /// Lock file could not be created or inspected.
    #[error("update lock error: {0}")]
    LockFailed(String),
}

/// Error kind for programmatic handling and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateErrorKind {
    SourceUnreachable,
    NoLinkFound,
    UnexpectedFormat,
    MetadataCorrupt,
    DownloadFailed,
    ArchiveCorrupt,
    StagingFailed,
    BackupFailed,
    InstallFailed,
    ValidationFailed,
    RestoreFailed,
    UpdateInProgress,
    LockFailed,
}

impl UpdateError {
    pub fn kind(&self) -> UpdateErrorKind {
        match self {
            UpdateError::SourceUnreachable(_) => UpdateErrorKind::SourceUnreachable,
            UpdateError::NoLinkFound(_) => UpdateErrorKind::NoLinkFound,
            UpdateError::UnexpectedFormat(_) => UpdateErrorKind::UnexpectedFormat,
            UpdateError::MetadataCorrupt(_) => UpdateErrorKind::MetadataCorrupt,
            UpdateError::DownloadFailed(_) => UpdateErrorKind::DownloadFailed,
            UpdateError::ArchiveCorrupt(_) => UpdateErrorKind::ArchiveCorrupt,
            UpdateError::StagingFailed(_) => UpdateErrorKind::StagingFailed,
            UpdateError::BackupFailed(_) => UpdateErrorKind::BackupFailed,
            UpdateError::InstallFailed(_) => UpdateErrorKind::InstallFailed,
            UpdateError::ValidationFailed(_) => UpdateErrorKind::ValidationFailed,
            UpdateError::RestoreFailed(_) => UpdateErrorKind::RestoreFailed,
            UpdateError::UpdateInProgress { .. } => UpdateErrorKind::UpdateInProgress,
            UpdateError::LockFailed(_) => UpdateErrorKind::LockFailed,
        }
    }

    /// Whether automated recovery is still possible after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, UpdateError::RestoreFailed(_))
    }
}

impl From<OracleError> for UpdateError {
    fn from(err: OracleError) -> Self {
        let message = err.to_string();
        match err {
            OracleError::SourceUnreachable(msg) => UpdateError::SourceUnreachable(msg),
            OracleError::NoLinkFound { .. } => UpdateError::NoLinkFound(message),
            OracleError::UnexpectedFormat(_) => UpdateError::UnexpectedFormat(message),
            OracleError::MetadataCorrupt { .. } => UpdateError::MetadataCorrupt(message),
        }
    }
}

impl From<FetchError> for UpdateError {
    fn from(err: FetchError) -> Self {
        match err.kind() {
            FetchErrorKind::Download => UpdateError::DownloadFailed(err.to_string()),
            FetchErrorKind::Archive => UpdateError::ArchiveCorrupt(err.to_string()),
        }
    }
}

impl From<BackupError> for UpdateError {
    fn from(err: BackupError) -> Self {
        match err {
            BackupError::Snapshot { .. } => UpdateError::BackupFailed(err.to_string()),
            BackupError::Restore { .. } => UpdateError::RestoreFailed(err.to_string()),
        }
    }
}

impl From<InstallError> for UpdateError {
    fn from(err: InstallError) -> Self {
        UpdateError::InstallFailed(err.to_string())
    }
}

impl From<LaunchError> for UpdateError {
    fn from(err: LaunchError) -> Self {
        UpdateError::ValidationFailed(err.to_string())
    }
}
