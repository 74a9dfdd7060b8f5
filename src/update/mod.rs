// ABOUTME: Update orchestration using the type state pattern.
// ABOUTME: Sequences download, extract, curate, backup, install, validate and commit with rollback.

mod error;
mod lock;
mod machine;
mod phase;
mod pipeline;
mod report;
mod state;
mod transitions;

pub use error::{UpdateError, UpdateErrorKind};
pub use lock::{LockInfo, UpdateLock};
pub use machine::Update;
pub use phase::UpdatePhase;
pub use pipeline::{RunOptions, run_update};
pub use report::{Outcome, ReportedError, RunReport};
pub use state::{
    BackedUp, Committed, Curated, Downloaded, Extracted, Installed, Planned, Validated,
};
pub use transitions::TransitionResult;
