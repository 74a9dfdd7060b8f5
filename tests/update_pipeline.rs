// ABOUTME: End-to-end tests for the update pipeline against fake transport and validator.
// ABOUTME: Covers first install, no-op, rollback from each destructive step, aborts, and locking.

mod support;

use bedrock_updater::diagnostics::Diagnostics;
use bedrock_updater::layout::TempLayout;
use bedrock_updater::oracle::{LinkFormat, PageScraper, PinnedSource};
use bedrock_updater::types::PathPattern;
use bedrock_updater::update::{
    LockInfo, Outcome, RunOptions, UpdateErrorKind, UpdateLock, UpdatePhase, run_update,
};
use std::fs;
use support::{FakeTransport, PAGE_URL, Sandbox, ScriptedValidator, tree};

const OLD: &str = "1.14.30.1";
const NEW: &str = "1.14.30.2";

// =============================================================================
// Happy Paths
// =============================================================================

#[tokio::test]
async fn first_install_commits_and_records_version() {
    support::init_tracing();
    let sandbox = Sandbox::new();
    let config = sandbox.config();
    let transport = FakeTransport::publishing(NEW);
    let source = PageScraper::from_config(&transport, &config);
    let validator = ScriptedValidator::ready();

    let report = run_update(config, &source, &transport, &validator, RunOptions::default()).await;

    assert_eq!(report.outcome, Outcome::Committed);
    assert_eq!(report.exit_code(), 0);
    assert!(report.from_version.is_none());
    assert_eq!(report.to_version.as_ref().unwrap().as_str(), NEW);
    assert!(report.error.is_none());

    assert_eq!(sandbox.installed_version().as_deref(), Some(NEW));
    assert_eq!(sandbox.read("bedrock_server"), format!("new server {NEW}"));
    assert_eq!(validator.calls(), 1);

    let layout = TempLayout::new(&sandbox.temp);
    assert!(!layout.download_dir().exists(), "staging area is cleaned up");
    assert!(layout.backup_manifest_path().exists(), "backup kept by default");
    assert!(!LockInfo::lock_path(&sandbox.install).exists());
}

#[tokio::test]
async fn upgrade_keeps_worlds_and_operator_settings() {
    let sandbox = Sandbox::new();
    sandbox.install_existing(OLD);
    let config = sandbox.config();
    let transport = FakeTransport::publishing(NEW);
    let source = PageScraper::from_config(&transport, &config);

    let report = run_update(
        config,
        &source,
        &transport,
        &ScriptedValidator::ready(),
        RunOptions::default(),
    )
    .await;

    assert_eq!(report.outcome, Outcome::Committed);
    assert_eq!(report.from_version.as_ref().unwrap().as_str(), OLD);
    assert_eq!(sandbox.installed_version().as_deref(), Some(NEW));

    // New binary from the archive, user data from the old install
    assert_eq!(sandbox.read("bedrock_server"), format!("new server {NEW}"));
    assert_eq!(sandbox.read("server.properties"), "level-name=Survival\n");
    assert_eq!(sandbox.read("worlds/Survival/db/000001.ldb"), "chunks");
    // Not preserved from the old install, so the archive default wins
    assert_eq!(sandbox.read("permissions.json"), "[]");
}

#[tokio::test]
async fn same_version_is_a_no_op() {
    let sandbox = Sandbox::new();
    sandbox.install_existing(NEW);
    let before = tree(&sandbox.install);
    let config = sandbox.config();
    let transport = FakeTransport::publishing(NEW);
    let source = PageScraper::from_config(&transport, &config);
    let validator = ScriptedValidator::ready();

    let report = run_update(config, &source, &transport, &validator, RunOptions::default()).await;

    assert_eq!(report.outcome, Outcome::UpToDate);
    assert_eq!(report.final_phase, UpdatePhase::UpToDate);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(transport.download_count(), 0);
    assert_eq!(validator.calls(), 0);
    assert_eq!(tree(&sandbox.install), before);
    assert!(!sandbox.temp.exists(), "no scratch data for a no-op run");
}

#[tokio::test]
async fn pinned_uri_skips_the_download_page() {
    let sandbox = Sandbox::new();
    let mut config = sandbox.config();
    config.download_uri = Some(support::archive_uri(NEW));
    // No page registered: scraping would fail
    let transport =
        FakeTransport::new().with_file(&support::archive_uri(NEW), support::server_archive(NEW));
    let source = PinnedSource::new(
        config.download_uri.clone().unwrap(),
        LinkFormat::from_config(&config.source),
    );

    let report = run_update(
        config,
        &source,
        &transport,
        &ScriptedValidator::ready(),
        RunOptions::default(),
    )
    .await;

    assert_eq!(report.outcome, Outcome::Committed);
    assert_eq!(sandbox.installed_version().as_deref(), Some(NEW));
}

#[tokio::test]
async fn excluded_paths_never_reach_the_install() {
    let sandbox = Sandbox::new();
    let mut config = sandbox.config();
    config.exclude = vec![
        PathPattern::new("behavior_packs").unwrap(),
        PathPattern::new("*.txt").unwrap(),
    ];
    let transport = FakeTransport::publishing(NEW);
    let source = PageScraper::from_config(&transport, &config);

    let report = run_update(
        config,
        &source,
        &transport,
        &ScriptedValidator::ready(),
        RunOptions::default(),
    )
    .await;

    assert_eq!(report.outcome, Outcome::Committed);
    assert!(!sandbox.install.join("behavior_packs").exists());
    assert!(!sandbox.install.join("release-notes.txt").exists());
    assert!(sandbox.install.join("bedrock_server").exists());
}

#[tokio::test]
async fn backup_is_discarded_when_not_retained() {
    let sandbox = Sandbox::new();
    sandbox.install_existing(OLD);
    let mut config = sandbox.config();
    config.retention.keep_backup = false;
    let transport = FakeTransport::publishing(NEW);
    let source = PageScraper::from_config(&transport, &config);

    let report = run_update(
        config,
        &source,
        &transport,
        &ScriptedValidator::ready(),
        RunOptions::default(),
    )
    .await;

    assert_eq!(report.outcome, Outcome::Committed);
    let layout = TempLayout::new(&sandbox.temp);
    assert!(!layout.backup_dir().exists());
    assert!(!layout.backup_manifest_path().exists());
}

// =============================================================================
// Rollback
// =============================================================================

#[tokio::test]
async fn failed_launch_rolls_back_to_previous_install() {
    let sandbox = Sandbox::new();
    sandbox.install_existing(OLD);
    let before = tree(&sandbox.install);
    let config = sandbox.config();
    let transport = FakeTransport::publishing(NEW);
    let source = PageScraper::from_config(&transport, &config);
    let validator = ScriptedValidator::crashing();

    let report = run_update(config, &source, &transport, &validator, RunOptions::default()).await;

    assert_eq!(report.outcome, Outcome::RolledBack);
    assert_eq!(report.final_phase, UpdatePhase::RolledBack);
    assert_eq!(report.exit_code(), 2);
    let error = report.error.as_ref().unwrap();
    assert_eq!(error.kind, UpdateErrorKind::ValidationFailed);
    assert_eq!(error.phase, UpdatePhase::Validating);
    assert!(report.rollback_error.is_none());

    assert_eq!(tree(&sandbox.install), before);
    assert_eq!(sandbox.installed_version().as_deref(), Some(OLD));
    assert!(
        TempLayout::new(&sandbox.temp).backup_manifest_path().exists(),
        "snapshot kept for manual restore"
    );
}

#[tokio::test]
async fn validator_sees_the_new_install() {
    let sandbox = Sandbox::new();
    sandbox.install_existing(OLD);
    let config = sandbox.config();
    let transport = FakeTransport::publishing(NEW);
    let source = PageScraper::from_config(&transport, &config);
    let validator = ScriptedValidator::crashing().with_hook(|install| {
        let binary = fs::read_to_string(install.join("bedrock_server")).unwrap();
        assert!(binary.starts_with("new server"));
        assert!(install.join("worlds/Survival/level.dat").exists());
    });

    let report = run_update(config, &source, &transport, &validator, RunOptions::default()).await;
    assert_eq!(report.outcome, Outcome::RolledBack);
    assert_eq!(sandbox.read("bedrock_server"), "old server");
}

#[tokio::test]
async fn lost_snapshot_reports_rollback_failure() {
    let sandbox = Sandbox::new();
    sandbox.install_existing(OLD);
    let config = sandbox.config();
    let backup_dir = TempLayout::new(&sandbox.temp).backup_dir();
    let transport = FakeTransport::publishing(NEW);
    let source = PageScraper::from_config(&transport, &config);
    let validator = ScriptedValidator::crashing().with_hook(move |_| {
        fs::remove_dir_all(&backup_dir).unwrap();
    });

    let report = run_update(config, &source, &transport, &validator, RunOptions::default()).await;

    assert_eq!(report.outcome, Outcome::RollbackFailed);
    assert_eq!(report.exit_code(), 3);
    assert_eq!(
        report.error.as_ref().unwrap().kind,
        UpdateErrorKind::ValidationFailed
    );
    assert_eq!(
        report.rollback_error.as_ref().unwrap().kind,
        UpdateErrorKind::RestoreFailed
    );
}

#[tokio::test]
async fn install_failure_restores_previous_install() {
    let sandbox = Sandbox::new();
    sandbox.install_existing(OLD);
    let before = tree(&sandbox.install);
    let mut config = sandbox.config();
    config.preserve = vec![PathPattern::new("worlds/*").unwrap()];
    // The archive ships `worlds` as a file, so the preserved world cannot be placed under it
    let archive = support::zip_bytes(&[
        ("bedrock_server", b"new server"),
        ("worlds", b"not a directory"),
    ]);
    let transport = FakeTransport::new()
        .with_page(PAGE_URL, support::download_page(NEW))
        .with_file(&support::archive_uri(NEW), archive);
    let source = PageScraper::from_config(&transport, &config);
    let validator = ScriptedValidator::ready();

    let report = run_update(config, &source, &transport, &validator, RunOptions::default()).await;

    assert_eq!(report.outcome, Outcome::RolledBack);
    assert_eq!(report.exit_code(), 2);
    let error = report.error.as_ref().unwrap();
    assert_eq!(error.kind, UpdateErrorKind::InstallFailed);
    assert_eq!(error.phase, UpdatePhase::Installing);
    assert!(report.rollback_error.is_none());
    assert_eq!(validator.calls(), 0);

    assert_eq!(tree(&sandbox.install), before);
    assert_eq!(sandbox.installed_version().as_deref(), Some(OLD));
}

#[tokio::test]
async fn commit_failure_restores_previous_install() {
    let sandbox = Sandbox::new();
    sandbox.install_existing(OLD);
    let before = tree(&sandbox.install);
    let config = sandbox.config();
    let transport = FakeTransport::publishing(NEW);
    let source = PageScraper::from_config(&transport, &config);
    // A non-empty directory where the metadata file belongs cannot be renamed over
    let validator = ScriptedValidator::ready().with_hook(|install| {
        let blocker = install.join("serverData.json");
        fs::create_dir_all(&blocker).unwrap();
        fs::write(blocker.join("keep"), b"x").unwrap();
    });

    let report = run_update(config, &source, &transport, &validator, RunOptions::default()).await;

    assert_eq!(report.outcome, Outcome::RolledBack);
    let error = report.error.as_ref().unwrap();
    assert_eq!(error.kind, UpdateErrorKind::InstallFailed);
    assert_eq!(error.phase, UpdatePhase::Committing);
    assert!(report.rollback_error.is_none());

    assert_eq!(tree(&sandbox.install), before);
    assert_eq!(sandbox.installed_version().as_deref(), Some(OLD));
}

// =============================================================================
// Pre-install Failures
// =============================================================================

#[tokio::test]
async fn missing_link_aborts_without_touching_install() {
    let sandbox = Sandbox::new();
    sandbox.install_existing(OLD);
    let before = tree(&sandbox.install);
    let config = sandbox.config();
    let transport =
        FakeTransport::new().with_page(PAGE_URL, "<html><body>Maintenance</body></html>");
    let source = PageScraper::from_config(&transport, &config);

    let report = run_update(
        config,
        &source,
        &transport,
        &ScriptedValidator::ready(),
        RunOptions::default(),
    )
    .await;

    assert_eq!(report.outcome, Outcome::AbortedPreInstall);
    assert_eq!(report.exit_code(), 1);
    let error = report.error.as_ref().unwrap();
    assert_eq!(error.kind, UpdateErrorKind::NoLinkFound);
    assert_eq!(error.phase, UpdatePhase::CheckingVersions);
    assert_eq!(transport.download_count(), 0);
    assert_eq!(tree(&sandbox.install), before);
}

#[tokio::test]
async fn unreachable_page_is_reported() {
    let sandbox = Sandbox::new();
    let config = sandbox.config();
    let transport = FakeTransport::new();
    let source = PageScraper::from_config(&transport, &config);

    let report = run_update(
        config,
        &source,
        &transport,
        &ScriptedValidator::ready(),
        RunOptions::default(),
    )
    .await;

    assert_eq!(report.outcome, Outcome::AbortedPreInstall);
    assert_eq!(
        report.error.as_ref().unwrap().kind,
        UpdateErrorKind::SourceUnreachable
    );
}

#[tokio::test]
async fn failed_download_cleans_staging() {
    let sandbox = Sandbox::new();
    sandbox.install_existing(OLD);
    let before = tree(&sandbox.install);
    let config = sandbox.config();
    // Page advertises a build whose archive is missing
    let transport = FakeTransport::new().with_page(PAGE_URL, support::download_page(NEW));
    let source = PageScraper::from_config(&transport, &config);

    let report = run_update(
        config,
        &source,
        &transport,
        &ScriptedValidator::ready(),
        RunOptions::default(),
    )
    .await;

    assert_eq!(report.outcome, Outcome::AbortedPreInstall);
    let error = report.error.as_ref().unwrap();
    assert_eq!(error.kind, UpdateErrorKind::DownloadFailed);
    assert_eq!(error.phase, UpdatePhase::Downloading);
    assert!(!TempLayout::new(&sandbox.temp).download_dir().exists());
    assert_eq!(tree(&sandbox.install), before);
}

#[tokio::test]
async fn corrupt_archive_is_rejected_before_backup() {
    let sandbox = Sandbox::new();
    sandbox.install_existing(OLD);
    let before = tree(&sandbox.install);
    let config = sandbox.config();
    let transport = FakeTransport::new()
        .with_page(PAGE_URL, support::download_page(NEW))
        .with_file(&support::archive_uri(NEW), b"this is not a zip".to_vec());
    let source = PageScraper::from_config(&transport, &config);
    let validator = ScriptedValidator::ready();

    let report = run_update(config, &source, &transport, &validator, RunOptions::default()).await;

    assert_eq!(report.outcome, Outcome::AbortedPreInstall);
    let error = report.error.as_ref().unwrap();
    assert_eq!(error.kind, UpdateErrorKind::ArchiveCorrupt);
    assert_eq!(error.phase, UpdatePhase::Extracting);
    assert_eq!(validator.calls(), 0);
    assert!(!TempLayout::new(&sandbox.temp).backup_manifest_path().exists());
    assert_eq!(tree(&sandbox.install), before);
}

#[tokio::test]
async fn backup_failure_aborts_before_install() {
    let sandbox = Sandbox::new();
    sandbox.install_existing(OLD);
    let before = tree(&sandbox.install);
    let config = sandbox.config();
    // A plain file where the snapshot directory belongs
    let layout = TempLayout::new(&sandbox.temp);
    fs::create_dir_all(&sandbox.temp).unwrap();
    fs::write(layout.backup_dir(), b"not a directory").unwrap();
    let transport = FakeTransport::publishing(NEW);
    let source = PageScraper::from_config(&transport, &config);
    let validator = ScriptedValidator::ready();

    let report = run_update(config, &source, &transport, &validator, RunOptions::default()).await;

    assert_eq!(report.outcome, Outcome::AbortedPreInstall);
    assert_eq!(report.final_phase, UpdatePhase::BackingUp);
    assert_eq!(report.exit_code(), 1);
    let error = report.error.as_ref().unwrap();
    assert_eq!(error.kind, UpdateErrorKind::BackupFailed);
    assert_eq!(error.phase, UpdatePhase::BackingUp);
    assert!(report.rollback_error.is_none());
    assert_eq!(validator.calls(), 0);
    assert!(!layout.backup_manifest_path().exists());
    assert_eq!(tree(&sandbox.install), before);
}

#[tokio::test]
async fn traversal_archive_is_rejected() {
    let sandbox = Sandbox::new();
    let config = sandbox.config();
    let evil = support::zip_bytes(&[
        ("bedrock_server", b"bin"),
        ("../../escaped.txt", b"gotcha"),
    ]);
    let transport = FakeTransport::new()
        .with_page(PAGE_URL, support::download_page(NEW))
        .with_file(&support::archive_uri(NEW), evil);
    let source = PageScraper::from_config(&transport, &config);

    let report = run_update(
        config,
        &source,
        &transport,
        &ScriptedValidator::ready(),
        RunOptions::default(),
    )
    .await;

    assert_eq!(report.outcome, Outcome::AbortedPreInstall);
    assert_eq!(
        report.error.as_ref().unwrap().kind,
        UpdateErrorKind::ArchiveCorrupt
    );
    assert!(!sandbox.dir.path().join("escaped.txt").exists());
}

// =============================================================================
// Locking
// =============================================================================

#[tokio::test]
async fn concurrent_update_is_refused() {
    let sandbox = Sandbox::new();
    sandbox.install_existing(OLD);
    let mut diag = Diagnostics::default();
    let _held = UpdateLock::acquire(&sandbox.install, false, &mut diag).unwrap();

    let config = sandbox.config();
    let transport = FakeTransport::publishing(NEW);
    let source = PageScraper::from_config(&transport, &config);

    let report = run_update(
        config,
        &source,
        &transport,
        &ScriptedValidator::ready(),
        RunOptions::default(),
    )
    .await;

    assert_eq!(report.outcome, Outcome::AbortedPreInstall);
    assert_eq!(
        report.error.as_ref().unwrap().kind,
        UpdateErrorKind::UpdateInProgress
    );
    assert_eq!(transport.download_count(), 0);
    assert_eq!(sandbox.installed_version().as_deref(), Some(OLD));
}

#[tokio::test]
async fn forced_run_breaks_lock_with_warning() {
    let sandbox = Sandbox::new();
    let mut diag = Diagnostics::default();
    let held = UpdateLock::acquire(&sandbox.install, false, &mut diag).unwrap();

    let config = sandbox.config();
    let transport = FakeTransport::publishing(NEW);
    let source = PageScraper::from_config(&transport, &config);

    let report = run_update(
        config,
        &source,
        &transport,
        &ScriptedValidator::ready(),
        RunOptions { force_lock: true },
    )
    .await;
    // The broken guard must not run its drop after the new run released the lock
    std::mem::forget(held);

    assert_eq!(report.outcome, Outcome::Committed);
    assert_eq!(report.warnings.len(), 1);
}
