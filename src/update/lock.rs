// ABOUTME: Update lock to prevent concurrent updates of the same install.
// ABOUTME: Atomic lock file beside the install dir, holding JSON lock info.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostics, Warning};

use super::UpdateError;

/// Locks older than this are broken automatically.
const STALE_AFTER_HOURS: i64 = 6;

/// Information about who holds an update lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// Install directory being updated.
    pub install_location: PathBuf,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(install_dir: &Path) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            install_location: install_dir.to_path_buf(),
        }
    }

    /// Check if this lock is stale (older than 6 hours).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= STALE_AFTER_HOURS
    }

    /// Path to the lock file for an install dir: `<parent>/.<name>.update.lock`.
    pub fn lock_path(install_dir: &Path) -> PathBuf {
        let name = install_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "install".to_string());
        let parent = install_dir.parent().unwrap_or_else(|| Path::new("."));
        parent.join(format!(".{name}.update.lock"))
    }

    /// Lock info of the current holder for `install_dir`, if any.
    pub fn current(install_dir: &Path) -> Option<Self> {
        Self::read(&Self::lock_path(install_dir)).ok().flatten()
    }

    fn read(path: &Path) -> io::Result<Option<Self>> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content).ok())
    }
}

/// A held update lock that releases on drop.
#[derive(Debug)]
pub struct UpdateLock {
    path: PathBuf,
    released: bool,
}

impl UpdateLock {
    /// Acquire the update lock for the given install dir.
    ///
    /// Lock info is written to a private file first and then hard-linked to
    /// the lock path, so other processes never observe a half-written lock.
    /// Stale (>6 hours) and unreadable locks are broken with a warning;
    /// `force` breaks any lock.
    pub fn acquire(
        install_dir: &Path,
        force: bool,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, UpdateError> {
        let path = LockInfo::lock_path(install_dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                UpdateError::LockFailed(format!(
                    "failed to create lock directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let info = LockInfo::new(install_dir);
        let json = serde_json::to_string(&info)
            .map_err(|e| UpdateError::LockFailed(format!("failed to serialize lock: {e}")))?;

        if try_claim(&path, &json)? {
            return Ok(Self::held(path));
        }

        // Lock exists - decide whether it may be broken
        match LockInfo::read(&path) {
            Ok(Some(existing)) => {
                if force {
                    diagnostics.warn(Warning::lock_broken(format!(
                        "breaking lock held by {} (pid {}) since {}",
                        existing.holder, existing.pid, existing.started_at
                    )));
                } else if existing.is_stale() {
                    diagnostics.warn(Warning::lock_broken(format!(
                        "auto-breaking stale lock held by {} (pid {}) since {}",
                        existing.holder, existing.pid, existing.started_at
                    )));
                } else {
                    return Err(UpdateError::UpdateInProgress {
                        holder: existing.holder,
                        pid: existing.pid,
                        started_at: existing.started_at,
                    });
                }
            }
            Ok(None) => {
                diagnostics.warn(Warning::lock_broken(format!(
                    "lock info at {} corrupted, breaking lock",
                    path.display()
                )));
            }
            // Released between our claim attempt and the read
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(UpdateError::LockFailed(format!(
                    "failed to read lock {}: {e}",
                    path.display()
                )));
            }
        }

        tracing::debug!("removing stale/forced lock at {}", path.display());
        if let Err(e) = fs::remove_file(&path)
            && e.kind() != io::ErrorKind::NotFound
        {
            return Err(UpdateError::LockFailed(format!(
                "failed to remove lock {}: {e}",
                path.display()
            )));
        }

        if try_claim(&path, &json)? {
            Ok(Self::held(path))
        } else {
            Err(UpdateError::LockFailed(
                "lock acquired by another process during break".to_string(),
            ))
        }
    }

    fn held(path: PathBuf) -> Self {
        tracing::debug!("acquired update lock {}", path.display());
        Self {
            path,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock.
    pub fn release(mut self) -> io::Result<()> {
        self.released = true;
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

impl Drop for UpdateLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Atomically create the lock file with `content`.
///
/// Returns `Ok(false)` if the lock file already exists.
fn try_claim(path: &Path, content: &str) -> Result<bool, UpdateError> {
    let lock_error =
        |e: io::Error| UpdateError::LockFailed(format!("failed to create lock {}: {e}", path.display()));

    let mut scratch = path.as_os_str().to_owned();
    scratch.push(format!(".{}.tmp", std::process::id()));
    let scratch = PathBuf::from(scratch);

    write_synced(&scratch, content).map_err(lock_error)?;
    let linked = fs::hard_link(&scratch, path);
    let _ = fs::remove_file(&scratch);

    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        // Filesystems without hard links fall back to exclusive create
        Err(_) => match fs::OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                file.write_all(content.as_bytes()).map_err(lock_error)?;
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(lock_error(e)),
        },
    }
}

fn write_synced(path: &Path, content: &str) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}
