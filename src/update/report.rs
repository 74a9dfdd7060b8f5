// ABOUTME: Terminal outcome and structured report of an update run.
// ABOUTME: Every run produces exactly one RunReport, serializable for scripting.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::diagnostics::Warning;
use crate::types::VersionTag;

use super::error::{UpdateError, UpdateErrorKind};
use super::phase::UpdatePhase;

/// How an update run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    UpToDate,
    Committed,
    /// Failed before the install dir was modified.
    AbortedPreInstall,
    RolledBack,
    /// Restore failed; the install dir is in an unknown state.
    RollbackFailed,
}

impl Outcome {
    /// Process exit code for the `update` command.
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::UpToDate | Outcome::Committed => 0,
            Outcome::AbortedPreInstall => 1,
            Outcome::RolledBack => 2,
            Outcome::RollbackFailed => 3,
        }
    }

    pub fn is_success(self) -> bool {
        self.exit_code() == 0
    }
}

/// An error as it appears in a report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportedError {
    pub kind: UpdateErrorKind,
    pub phase: UpdatePhase,
    pub message: String,
}

impl ReportedError {
    pub fn new(error: &UpdateError, phase: UpdatePhase) -> Self {
        Self {
            kind: error.kind(),
            phase,
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcome: Outcome,
    /// Phase the run came to rest in.
    pub final_phase: UpdatePhase,
    pub from_version: Option<VersionTag>,
    pub to_version: Option<VersionTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReportedError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_error: Option<ReportedError>,
    pub warnings: Vec<Warning>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let from = self
            .from_version
            .as_ref()
            .map_or_else(|| "nothing".to_string(), ToString::to_string);
        let to = self
            .to_version
            .as_ref()
            .map_or_else(|| "unknown".to_string(), ToString::to_string);

        match self.outcome {
            Outcome::UpToDate => format!("Already up to date ({from})"),
            Outcome::Committed => format!("Updated {from} -> {to}"),
            Outcome::AbortedPreInstall => "Update aborted before install; server untouched".to_string(),
            Outcome::RolledBack => format!("Update to {to} failed; rolled back to {from}"),
            Outcome::RollbackFailed => {
                format!("Update to {to} failed and rollback failed; manual repair required")
            }
        }
    }
}

/// Terminal state of a run before it is stamped into a report.
#[derive(Debug)]
pub(crate) enum Terminal {
    UpToDate,
    Committed,
    Aborted(UpdateError, UpdatePhase),
    RolledBack(UpdateError, UpdatePhase),
    RollbackFailed {
        error: UpdateError,
        phase: UpdatePhase,
        rollback: UpdateError,
    },
}

impl Terminal {
    pub(crate) fn outcome(&self) -> Outcome {
        match self {
            Terminal::UpToDate => Outcome::UpToDate,
            Terminal::Committed => Outcome::Committed,
            Terminal::Aborted(..) => Outcome::AbortedPreInstall,
            Terminal::RolledBack(..) => Outcome::RolledBack,
            Terminal::RollbackFailed { .. } => Outcome::RollbackFailed,
        }
    }

    /// Phase the run came to rest in; an aborted run stops where it failed.
    pub(crate) fn final_phase(&self) -> UpdatePhase {
        match self {
            Terminal::UpToDate => UpdatePhase::UpToDate,
            Terminal::Committed => UpdatePhase::Committed,
            Terminal::Aborted(_, phase) => *phase,
            Terminal::RolledBack(..) => UpdatePhase::RolledBack,
            Terminal::RollbackFailed { .. } => UpdatePhase::RollbackFailed,
        }
    }

    pub(crate) fn into_report(
        self,
        from_version: Option<VersionTag>,
        to_version: Option<VersionTag>,
        warnings: Vec<Warning>,
        started_at: DateTime<Utc>,
    ) -> RunReport {
        let outcome = self.outcome();
        let final_phase = self.final_phase();
        let (error, rollback_error) = match self {
            Terminal::UpToDate | Terminal::Committed => (None, None),
            Terminal::Aborted(e, phase) | Terminal::RolledBack(e, phase) => {
                (Some(ReportedError::new(&e, phase)), None)
            }
            Terminal::RollbackFailed {
                error,
                phase,
                rollback,
            } => (
                Some(ReportedError::new(&error, phase)),
                Some(ReportedError::new(&rollback, UpdatePhase::RollingBack)),
            ),
        };

        RunReport {
            outcome,
            final_phase,
            from_version,
            to_version,
            error,
            rollback_error,
            warnings,
            started_at,
            finished_at: Utc::now(),
        }
    }
}
