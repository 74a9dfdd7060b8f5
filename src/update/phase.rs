// ABOUTME: Runtime names for the phases of an update run.
// ABOUTME: Used for logging and to tag reported errors with where they happened.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdatePhase {
    Idle,
    CheckingVersions,
    UpToDate,
    Downloading,
    Extracting,
    Curating,
    BackingUp,
    Installing,
    Validating,
    /// Writing install metadata after a successful validation.
    Committing,
    Committed,
    RollingBack,
    RolledBack,
    RollbackFailed,
}

impl fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdatePhase::Idle => "idle",
            UpdatePhase::CheckingVersions => "checking versions",
            UpdatePhase::UpToDate => "up to date",
            UpdatePhase::Downloading => "downloading",
            UpdatePhase::Extracting => "extracting",
            UpdatePhase::Curating => "curating",
            UpdatePhase::BackingUp => "backing up",
            UpdatePhase::Installing => "installing",
            UpdatePhase::Validating => "validating",
            UpdatePhase::Committing => "committing",
            UpdatePhase::Committed => "committed",
            UpdatePhase::RollingBack => "rolling back",
            UpdatePhase::RolledBack => "rolled back",
            UpdatePhase::RollbackFailed => "rollback failed",
        };
        f.write_str(name)
    }
}
