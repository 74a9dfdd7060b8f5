// ABOUTME: Post-install smoke test: start the server and wait for its ready line.
// ABOUTME: Always terminates the process; only a failed spawn is an error.

mod process;

pub use process::ProcessValidator;

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How a validation launch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The ready signal was seen within the time window.
    Ready { elapsed: Duration },
    /// The process exited with a failure status before becoming ready.
    Crashed { code: Option<i32> },
    /// The process exited successfully without ever signalling ready.
    ExitedEarly,
    /// No ready signal within the time window.
    TimedOut { after: Duration },
}

impl LaunchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, LaunchOutcome::Ready { .. })
    }

    /// Human-readable failure reason, `None` when ready.
    pub fn reason(&self) -> Option<String> {
        match self {
            LaunchOutcome::Ready { .. } => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for LaunchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchOutcome::Ready { elapsed } => {
                write!(f, "server ready after {:.1}s", elapsed.as_secs_f64())
            }
            LaunchOutcome::Crashed { code: Some(code) } => {
                write!(f, "server exited with status {code} before becoming ready")
            }
            LaunchOutcome::Crashed { code: None } => {
                write!(f, "server was killed by a signal before becoming ready")
            }
            LaunchOutcome::ExitedEarly => {
                write!(f, "server exited cleanly without signalling ready")
            }
            LaunchOutcome::TimedOut { after } => {
                write!(f, "no ready signal within {}s", after.as_secs())
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// The server process could not be started at all.
    #[error("failed to spawn {}: {source}", command.display())]
    Spawn {
        command: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Judges whether a freshly installed server starts.
#[async_trait]
pub trait LaunchValidator: Send + Sync {
    async fn validate(
        &self,
        install_dir: &Path,
        timeout: Duration,
    ) -> Result<LaunchOutcome, LaunchError>;
}
