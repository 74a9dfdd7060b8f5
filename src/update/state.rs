// ABOUTME: Update state types for the type state pattern.
// ABOUTME: Each state carries what the next step needs; rollback exists only after backup.

use std::path::PathBuf;

use crate::launch::LaunchOutcome;

/// Candidate chosen, nothing on disk yet.
/// Available actions: `download()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Planned;

/// Archive fully downloaded into the staging area.
/// Available actions: `extract()`
#[derive(Debug, Clone)]
pub struct Downloaded {
    pub(crate) archive: PathBuf,
}

impl Downloaded {
    pub fn archive(&self) -> &PathBuf {
        &self.archive
    }
}

/// Archive unpacked into the staging tree.
/// Available actions: `curate()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Extracted;

/// Excluded files purged from the staging tree.
/// Available actions: `back_up()`
#[derive(Debug, Clone, Default)]
pub struct Curated {
    pub(crate) purged: Vec<PathBuf>,
}

impl Curated {
    pub fn purged(&self) -> &[PathBuf] {
        &self.purged
    }
}

/// Snapshot of the current install taken.
/// Available actions: `install()`, `rollback()`
#[derive(Debug, Clone, Copy, Default)]
pub struct BackedUp;

/// New version in place, preserved data merged back.
/// Available actions: `validate()`, `rollback()`
#[derive(Debug, Clone, Default)]
pub struct Installed {
    pub(crate) preserved: Vec<PathBuf>,
}

impl Installed {
    pub fn preserved(&self) -> &[PathBuf] {
        &self.preserved
    }
}

/// Smoke-test launch succeeded.
/// Available actions: `commit()`, `rollback()`
#[derive(Debug, Clone)]
pub struct Validated {
    pub(crate) outcome: LaunchOutcome,
}

impl Validated {
    pub fn outcome(&self) -> &LaunchOutcome {
        &self.outcome
    }
}

/// Metadata written; the update is final.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Committed;
