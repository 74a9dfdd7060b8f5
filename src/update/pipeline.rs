// ABOUTME: Drives a full update run through the state machine under the update lock.
// ABOUTME: Always ends in exactly one terminal outcome and cleans up the staging area.

use chrono::{DateTime, Utc};

use crate::config::{Config, RetentionConfig};
use crate::diagnostics::{Diagnostics, Warning};
use crate::fsops;
use crate::launch::LaunchValidator;
use crate::layout::TempLayout;
use crate::oracle::{self, VersionSource};
use crate::transport::HttpTransport;
use crate::types::VersionTag;

use super::error::UpdateError;
use super::lock::UpdateLock;
use super::phase::UpdatePhase;
use super::report::{RunReport, Terminal};
use super::state::Planned;
use super::Update;

/// Options for a single run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Break an existing update lock even if it is not stale.
    pub force_lock: bool,
}

/// Run one complete update: check, download, extract, curate, back up,
/// install, validate and commit, rolling back on any failure after backup.
pub async fn run_update<S, T, V>(
    config: Config,
    source: &S,
    transport: &T,
    validator: &V,
    options: RunOptions,
) -> RunReport
where
    S: VersionSource + ?Sized,
    T: HttpTransport + ?Sized,
    V: LaunchValidator + ?Sized,
{
    let started_at = Utc::now();
    let mut diag = Diagnostics::default();

    let lock = match UpdateLock::acquire(&config.install_location, options.force_lock, &mut diag) {
        Ok(lock) => lock,
        Err(e) => {
            tracing::error!("{e}");
            return Terminal::Aborted(e, UpdatePhase::Idle).into_report(
                None,
                None,
                diag.into_warnings(),
                started_at,
            );
        }
    };

    tracing::info!("checking versions");
    let current = match oracle::current_version(&config.install_location) {
        Ok(current) => current,
        Err(e) => {
            let terminal = Terminal::Aborted(e.into(), UpdatePhase::CheckingVersions);
            return finish(terminal, None, None, lock, diag, started_at);
        }
    };
    let from_version = current.tag().cloned();

    let candidate = match source.latest().await {
        Ok(candidate) => candidate,
        Err(e) => {
            let terminal = Terminal::Aborted(e.into(), UpdatePhase::CheckingVersions);
            return finish(terminal, from_version, None, lock, diag, started_at);
        }
    };
    let to_version = Some(candidate.version.clone());

    if oracle::compare(&current, &candidate).is_up_to_date() {
        tracing::info!("installed version {current} is the latest");
        return finish(
            Terminal::UpToDate,
            from_version,
            to_version,
            lock,
            diag,
            started_at,
        );
    }

    tracing::info!("update available: {current} -> {}", candidate.version);
    let retention = config.retention.clone();
    let update = Update::new(config, current, candidate);
    let layout = update.layout().clone();

    let terminal = drive(update, transport, validator).await;
    clean_up(&layout, &retention, &terminal, &mut diag);

    finish(terminal, from_version, to_version, lock, diag, started_at)
}

/// Step through the state machine until a terminal state is reached.
async fn drive<T, V>(update: Update<Planned>, transport: &T, validator: &V) -> Terminal
where
    T: HttpTransport + ?Sized,
    V: LaunchValidator + ?Sized,
{
    tracing::info!("downloading {}", update.candidate().download_uri);
    let update = match update.download(transport).await {
        Ok(u) => u,
        Err(e) => return aborted(e, UpdatePhase::Downloading),
    };

    tracing::info!("extracting {}", update.state().archive().display());
    let update = match update.extract().await {
        Ok(u) => u,
        Err(e) => return aborted(e, UpdatePhase::Extracting),
    };

    let update = match update.curate().await {
        Ok(u) => u,
        Err(e) => return aborted(e, UpdatePhase::Curating),
    };

    tracing::info!("backing up {}", update.config().install_location.display());
    let update = match update.back_up().await {
        Ok(u) => u,
        Err(e) => return aborted(e, UpdatePhase::BackingUp),
    };

    tracing::info!("installing {}", update.to_version());
    let update = match update.install().await {
        Ok(u) => u,
        Err((failed, e)) => {
            return rolled_back(failed.rollback().await, e, UpdatePhase::Installing);
        }
    };
    if !update.state().preserved().is_empty() {
        tracing::info!(
            "restored {} preserved path(s)",
            update.state().preserved().len()
        );
    }

    tracing::info!(
        "validating launch (timeout {:?})",
        update.config().launch_timeout
    );
    let update = match update.validate(validator).await {
        Ok(u) => u,
        Err((failed, e)) => {
            return rolled_back(failed.rollback().await, e, UpdatePhase::Validating);
        }
    };
    tracing::info!("{}", update.state().outcome());

    let update = match update.commit().await {
        Ok(u) => u,
        Err((failed, e)) => {
            return rolled_back(failed.rollback().await, e, UpdatePhase::Committing);
        }
    };

    let version = update.finish();
    tracing::info!("committed {version}");
    Terminal::Committed
}

fn aborted(error: UpdateError, phase: UpdatePhase) -> Terminal {
    tracing::error!("{phase} failed: {error}");
    Terminal::Aborted(error, phase)
}

fn rolled_back(
    rollback: Result<(), UpdateError>,
    error: UpdateError,
    phase: UpdatePhase,
) -> Terminal {
    tracing::error!("{phase} failed: {error}");
    match rollback {
        Ok(()) => {
            tracing::warn!("rolled back to the previous install");
            Terminal::RolledBack(error, phase)
        }
        Err(rollback) => {
            tracing::error!("rollback failed: {rollback}");
            Terminal::RollbackFailed {
                error,
                phase,
                rollback,
            }
        }
    }
}

/// Remove scratch data according to retention settings.
///
/// The snapshot is kept after any failure so it stays available for a
/// manual restore.
fn clean_up(
    layout: &TempLayout,
    retention: &RetentionConfig,
    terminal: &Terminal,
    diag: &mut Diagnostics,
) {
    if !retention.keep_staging
        && let Err(e) = fsops::remove_path(&layout.download_dir())
    {
        diag.warn(Warning::staging_cleanup(format!(
            "failed to remove staging area {}: {e}",
            layout.download_dir().display()
        )));
    }

    if matches!(terminal, Terminal::Committed) && !retention.keep_backup {
        let removed = fsops::remove_path(&layout.backup_manifest_path())
            .and_then(|()| fsops::remove_path(&layout.backup_dir()));
        if let Err(e) = removed {
            diag.warn(Warning::backup_cleanup(format!(
                "failed to remove backup {}: {e}",
                layout.backup_dir().display()
            )));
        }
    }
}

fn finish(
    terminal: Terminal,
    from_version: Option<VersionTag>,
    to_version: Option<VersionTag>,
    lock: UpdateLock,
    mut diag: Diagnostics,
    started_at: DateTime<Utc>,
) -> RunReport {
    let lock_path = lock.path().to_path_buf();
    if let Err(e) = lock.release() {
        diag.warn(Warning::lock_release(format!(
            "failed to remove lock file {}: {e}",
            lock_path.display()
        )));
    }
    tracing::debug!("run finished in phase: {}", terminal.final_phase());
    terminal.into_report(from_version, to_version, diag.into_warnings(), started_at)
}
