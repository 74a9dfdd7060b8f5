// ABOUTME: Status command implementation.
// ABOUTME: Reports installed version, last snapshot, and lock holder without network access.

use bedrock_updater::backup::{self, SnapshotManifest};
use bedrock_updater::config::Config;
use bedrock_updater::error::Result;
use bedrock_updater::layout::TempLayout;
use bedrock_updater::oracle;
use bedrock_updater::output::Output;
use bedrock_updater::update::LockInfo;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct Status {
    install_location: PathBuf,
    installed: Option<String>,
    backup: Option<SnapshotManifest>,
    lock: Option<LockInfo>,
}

/// Show what is installed and what could be restored.
pub fn status(config: &Config, output: &Output) -> Result<i32> {
    let installed = oracle::current_version(&config.install_location)?;
    let layout = TempLayout::new(config.temp_location.clone());
    let manifest = backup::read_manifest(&layout.backup_manifest_path());
    let lock = LockInfo::current(&config.install_location);

    let mut lines = vec![
        format!("Install: {}", config.install_location.display()),
        format!("Installed version: {installed}"),
    ];
    match &manifest {
        Some(m) => lines.push(format!(
            "Backup: {} (taken {})",
            m.version
                .as_ref()
                .map_or_else(|| "empty install".to_string(), ToString::to_string),
            m.taken_at
        )),
        None => lines.push("Backup: none".to_string()),
    }
    if let Some(lock) = &lock {
        lines.push(format!(
            "Update in progress: {} (pid {}) since {}",
            lock.holder, lock.pid, lock.started_at
        ));
    }

    let status = Status {
        install_location: config.install_location.clone(),
        installed: installed.tag().map(ToString::to_string),
        backup: manifest,
        lock,
    };
    output.value(&status, &lines.join("\n"));
    Ok(0)
}
