// ABOUTME: Restore command implementation.
// ABOUTME: Manually restores the install directory from the last complete snapshot.

use bedrock_updater::backup;
use bedrock_updater::config::Config;
use bedrock_updater::diagnostics::Diagnostics;
use bedrock_updater::error::{Error, Result};
use bedrock_updater::layout::TempLayout;
use bedrock_updater::output::Output;
use bedrock_updater::update::{UpdateError, UpdateLock};

pub async fn restore(config: &Config, force: bool, output: &Output) -> Result<i32> {
    let mut diag = Diagnostics::default();
    let lock = UpdateLock::acquire(&config.install_location, force, &mut diag)?;

    let layout = TempLayout::new(config.temp_location.clone());
    let manifest = backup::read_manifest(&layout.backup_manifest_path())
        .ok_or_else(|| Error::NoSnapshot(layout.backup_dir()))?;

    output.progress(&format!(
        "Restoring {} from backup taken {}",
        config.install_location.display(),
        manifest.taken_at
    ));

    let backup_dir = layout.backup_dir();
    let install_dir = config.install_location.clone();
    tokio::task::spawn_blocking(move || backup::restore(&backup_dir, &install_dir))
        .await
        .map_err(std::io::Error::other)?
        .map_err(UpdateError::from)?;

    if let Err(e) = lock.release() {
        output.warning(&format!("failed to remove lock file: {e}"));
    }
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    let version = manifest
        .version
        .map_or_else(|| "an empty install".to_string(), |v| v.to_string());
    output.success(&format!("Restored {version}"));
    Ok(0)
}
