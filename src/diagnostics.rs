// ABOUTME: Diagnostics accumulator for non-fatal warnings during an update run.
// ABOUTME: Collects warnings that shouldn't fail an update but should be shown to users.

use serde::Serialize;

/// Collects non-fatal warnings during update operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// A non-fatal warning collected during an update.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Create a lock release warning.
    pub fn lock_release(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::LockRelease,
            message: message.into(),
        }
    }

    /// Create a warning for a lock that was broken (stale, forced, or unreadable).
    pub fn lock_broken(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::LockBroken,
            message: message.into(),
        }
    }

    /// Create a staging cleanup warning.
    pub fn staging_cleanup(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::StagingCleanup,
            message: message.into(),
        }
    }

    /// Create a backup cleanup warning.
    pub fn backup_cleanup(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::BackupCleanup,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningKind {
    /// Failed to release update lock (lock file may remain).
    LockRelease,
    /// An existing lock was removed before this run acquired it.
    LockBroken,
    /// Downloaded or extracted files could not be removed.
    StagingCleanup,
    /// Snapshot could not be removed after a committed update.
    BackupCleanup,
}
