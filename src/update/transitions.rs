// ABOUTME: State transition methods for update orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use std::time::Duration;

use crate::backup::{self, SnapshotManifest};
use crate::fetch;
use crate::fileset;
use crate::install;
use crate::launch::LaunchValidator;
use crate::transport::HttpTransport;

use super::Update;
use super::error::UpdateError;
use super::state::{
    BackedUp, Committed, Curated, Downloaded, Extracted, Installed, Planned, Validated,
};

/// Result type for transitions that may need rollback on failure.
pub type TransitionResult<T, S> = Result<Update<T>, (Update<S>, UpdateError)>;

// =============================================================================
// Internal Helpers
// =============================================================================

/// Run blocking filesystem work off the async runtime.
async fn blocking<T, E, F>(f: F) -> Result<T, UpdateError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<UpdateError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(Into::into),
        Err(e) => Err(UpdateError::StagingFailed(format!(
            "filesystem worker failed: {e}"
        ))),
    }
}

impl<S> Update<S> {
    /// Internal helper to transition to a new state.
    fn transition<T>(self, state: T) -> Update<T> {
        Update {
            config: self.config,
            layout: self.layout,
            current: self.current,
            candidate: self.candidate,
            state,
        }
    }

    /// Internal helper for rollback: restore the install dir from the snapshot.
    async fn restore_snapshot(self) -> Result<(), UpdateError> {
        let backup_dir = self.layout.backup_dir();
        let install_dir = self.config.install_location.clone();
        tracing::warn!(
            "restoring {} from snapshot {}",
            install_dir.display(),
            backup_dir.display()
        );
        let result = blocking(move || backup::restore(&backup_dir, &install_dir)).await;

        // Worker failures during restore are still restore failures.
        result.map_err(|e| match e {
            UpdateError::RestoreFailed(msg) => UpdateError::RestoreFailed(msg),
            other => UpdateError::RestoreFailed(other.to_string()),
        })
    }
}

// =============================================================================
// Planned -> Downloaded
// =============================================================================

impl Update<Planned> {
    /// Download the candidate archive into the staging area.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::DownloadFailed`; the install dir is untouched.
    #[must_use = "update state must be used"]
    pub async fn download<T: HttpTransport + ?Sized>(
        self,
        transport: &T,
    ) -> Result<Update<Downloaded>, UpdateError> {
        let archive = fetch::fetch(transport, &self.candidate.download_uri, &self.layout).await?;
        Ok(self.transition(Downloaded { archive }))
    }
}

// =============================================================================
// Downloaded -> Extracted
// =============================================================================

impl Update<Downloaded> {
    /// Unpack the archive into the staging tree.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::ArchiveCorrupt` for unreadable or unsafe archives.
    #[must_use = "update state must be used"]
    pub async fn extract(self) -> Result<Update<Extracted>, UpdateError> {
        let archive = self.state.archive.clone();
        let dest = self.layout.extract_dir();
        blocking(move || fetch::extract(&archive, &dest)).await?;
        Ok(self.transition(Extracted))
    }
}

// =============================================================================
// Extracted -> Curated
// =============================================================================

impl Update<Extracted> {
    /// Remove excluded paths from the staging tree.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::StagingFailed` if a purge fails.
    #[must_use = "update state must be used"]
    pub async fn curate(self) -> Result<Update<Curated>, UpdateError> {
        let dir = self.layout.extract_dir();
        let patterns = self.config.exclude.clone();
        let purged = blocking(move || {
            fileset::purge(&dir, &patterns)
                .map_err(|e| UpdateError::StagingFailed(format!("failed to purge excluded files: {e}")))
        })
        .await?;

        if !purged.is_empty() {
            tracing::info!("purged {} excluded path(s) from the update", purged.len());
        }
        Ok(self.transition(Curated { purged }))
    }
}

// =============================================================================
// Curated -> BackedUp
// =============================================================================

impl Update<Curated> {
    /// Snapshot the current install.
    ///
    /// The manifest is cleared first and rewritten only after the copy
    /// completes, so an interrupted snapshot is never treated as restorable.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::BackupFailed`; the install dir is untouched.
    #[must_use = "update state must be used"]
    pub async fn back_up(self) -> Result<Update<BackedUp>, UpdateError> {
        let install_dir = self.config.install_location.clone();
        let backup_dir = self.layout.backup_dir();
        let manifest_path = self.layout.backup_manifest_path();
        let manifest = SnapshotManifest::new(self.current.tag().cloned());

        blocking(move || {
            let manifest_error =
                |e: std::io::Error| UpdateError::BackupFailed(format!("snapshot manifest: {e}"));
            backup::clear_manifest(&manifest_path).map_err(manifest_error)?;
            backup::snapshot(&install_dir, &backup_dir)?;
            backup::write_manifest(&manifest_path, &manifest).map_err(manifest_error)
        })
        .await?;

        Ok(self.transition(BackedUp))
    }
}

// =============================================================================
// BackedUp -> Installed
// =============================================================================

impl Update<BackedUp> {
    /// Replace the install dir with the staged tree and merge preserved data.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` on failure to allow rollback.
    #[must_use = "update state must be used"]
    pub async fn install(self) -> TransitionResult<Installed, BackedUp> {
        let staging = self.layout.extract_dir();
        let install_dir = self.config.install_location.clone();
        let backup_dir = self.layout.backup_dir();
        let preserve = self.config.preserve.clone();

        let result =
            blocking(move || install::swap(&staging, &install_dir, &backup_dir, &preserve)).await;

        match result {
            Ok(preserved) => Ok(self.transition(Installed { preserved })),
            Err(e) => Err((self, e)),
        }
    }

    /// Rollback: restore the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::RestoreFailed` if the restore fails.
    #[must_use = "rollback result must be checked"]
    pub async fn rollback(self) -> Result<(), UpdateError> {
        self.restore_snapshot().await
    }
}

// =============================================================================
// Installed -> Validated
// =============================================================================

impl Update<Installed> {
    /// Launch the new server and wait for its ready signal.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` on failure to allow rollback.
    #[must_use = "update state must be used"]
    pub async fn validate<V: LaunchValidator + ?Sized>(
        self,
        validator: &V,
    ) -> TransitionResult<Validated, Installed> {
        let timeout = self.config.launch_timeout;
        self.validate_within(validator, timeout).await
    }

    /// Like `validate`, with an explicit time window.
    #[must_use = "update state must be used"]
    pub async fn validate_within<V: LaunchValidator + ?Sized>(
        self,
        validator: &V,
        timeout: Duration,
    ) -> TransitionResult<Validated, Installed> {
        let install_dir = self.config.install_location.clone();

        match validator.validate(&install_dir, timeout).await {
            Ok(outcome) if outcome.is_ok() => Ok(self.transition(Validated { outcome })),
            Ok(outcome) => {
                let reason = outcome.reason().unwrap_or_else(|| outcome.to_string());
                Err((self, UpdateError::ValidationFailed(reason)))
            }
            Err(e) => Err((self, e.into())),
        }
    }

    /// Rollback: restore the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::RestoreFailed` if the restore fails.
    #[must_use = "rollback result must be checked"]
    pub async fn rollback(self) -> Result<(), UpdateError> {
        self.restore_snapshot().await
    }
}

// =============================================================================
// Validated -> Committed
// =============================================================================

impl Update<Validated> {
    /// Record the new version in the install metadata.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` on failure to allow rollback.
    #[must_use = "update state must be used"]
    pub async fn commit(self) -> TransitionResult<Committed, Validated> {
        let install_dir = self.config.install_location.clone();
        let version = self.candidate.version.clone();

        match blocking(move || install::commit(&install_dir, &version)).await {
            Ok(()) => Ok(self.transition(Committed)),
            Err(e) => Err((self, e)),
        }
    }

    /// Rollback: restore the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::RestoreFailed` if the restore fails.
    #[must_use = "rollback result must be checked"]
    pub async fn rollback(self) -> Result<(), UpdateError> {
        self.restore_snapshot().await
    }
}

// =============================================================================
// Committed - Terminal State
// =============================================================================

impl Update<Committed> {
    /// Consume the update and return the installed candidate version.
    pub fn finish(self) -> crate::types::VersionTag {
        self.candidate.version
    }
}
