// ABOUTME: Test support utilities.
// ABOUTME: In-memory transport, scripted launch validator, and server archive builders.

use async_trait::async_trait;
use bedrock_updater::config::Config;
use bedrock_updater::launch::{LaunchError, LaunchOutcome, LaunchValidator};
use bedrock_updater::oracle::InstallMetadata;
use bedrock_updater::transport::{HttpTransport, TransportError};
use bedrock_updater::types::VersionTag;
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

static TRACING_INIT: Once = Once::new();

#[allow(dead_code)]
pub const PAGE_URL: &str = "https://downloads.test/bedrock";

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("bedrock_updater=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Archive URI in the vendor's naming scheme.
#[allow(dead_code)]
pub fn archive_uri(version: &str) -> String {
    format!("https://minecraft.azureedge.net/bin-linux/bedrock-server-{version}.zip")
}

/// Download page containing a single Linux archive link.
#[allow(dead_code)]
pub fn download_page(version: &str) -> String {
    format!(
        r#"<html><body>
<a href="https://minecraft.azureedge.net/bin-win/bedrock-server-{version}.zip">Windows</a>
<a href="{}" class="btn">Ubuntu</a>
</body></html>"#,
        archive_uri(version)
    )
}

/// Build a zip archive in memory from `(path, contents)` pairs.
/// Paths ending in '/' become directory entries.
#[allow(dead_code)]
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().unix_permissions(0o755);
    for (name, contents) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// A small server distribution for `version`.
#[allow(dead_code)]
pub fn server_archive(version: &str) -> Vec<u8> {
    let binary = format!("new server {version}");
    zip_bytes(&[
        ("bedrock_server", binary.as_bytes()),
        ("server.properties", b"level-name=Bedrock level\n"),
        ("permissions.json", b"[]"),
        ("behavior_packs/", b""),
        ("behavior_packs/vanilla/manifest.json", b"{}"),
        ("release-notes.txt", b"notes"),
    ])
}

/// Serves fixed pages and files; everything else is a 404.
#[derive(Default)]
#[allow(dead_code)]
pub struct FakeTransport {
    pages: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    downloads: AtomicUsize,
}

#[allow(dead_code)]
impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vendor page advertising `version`, plus the matching archive.
    pub fn publishing(version: &str) -> Self {
        Self::new()
            .with_page(PAGE_URL, download_page(version))
            .with_file(&archive_uri(version), server_archive(version))
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub fn with_file(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(url.to_string(), bytes);
        self
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

fn not_found(url: &str) -> TransportError {
    TransportError::Status {
        url: url.to_string(),
        status: 404,
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get_text(&self, url: &str) -> Result<String, TransportError> {
        self.pages.get(url).cloned().ok_or_else(|| not_found(url))
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, TransportError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let bytes = self.files.get(url).ok_or_else(|| not_found(url))?;
        tokio::fs::write(dest, bytes)
            .await
            .map_err(|source| TransportError::Write {
                path: dest.display().to_string(),
                source,
            })?;
        Ok(bytes.len() as u64)
    }
}

#[allow(dead_code)]
type Hook = Box<dyn Fn(&Path) + Send + Sync>;

/// Returns a fixed outcome, optionally running a hook against the install dir first.
#[allow(dead_code)]
pub struct ScriptedValidator {
    outcome: LaunchOutcome,
    hook: Option<Hook>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedValidator {
    pub fn ready() -> Self {
        Self::returning(LaunchOutcome::Ready {
            elapsed: Duration::from_millis(10),
        })
    }

    pub fn crashing() -> Self {
        Self::returning(LaunchOutcome::Crashed { code: Some(1) })
    }

    pub fn returning(outcome: LaunchOutcome) -> Self {
        Self {
            outcome,
            hook: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_hook(mut self, hook: impl Fn(&Path) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LaunchValidator for ScriptedValidator {
    async fn validate(
        &self,
        install_dir: &Path,
        _timeout: Duration,
    ) -> Result<LaunchOutcome, LaunchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.hook {
            hook(install_dir);
        }
        Ok(self.outcome.clone())
    }
}

/// Install and temp locations inside a scratch directory.
#[allow(dead_code)]
pub struct Sandbox {
    pub dir: TempDir,
    pub install: PathBuf,
    pub temp: PathBuf,
}

#[allow(dead_code)]
impl Sandbox {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let install = dir.path().join("bedrock");
        let temp = dir.path().join("updater-tmp");
        Self { dir, install, temp }
    }

    pub fn config(&self) -> Config {
        let mut config = Config::new(&self.install, &self.temp);
        config.source.page_url = PAGE_URL.to_string();
        config
    }

    /// Populate the install dir with an existing server at `version`.
    pub fn install_existing(&self, version: &str) {
        fs::create_dir_all(self.install.join("worlds/Survival/db")).unwrap();
        fs::write(self.install.join("bedrock_server"), b"old server").unwrap();
        fs::write(self.install.join("server.properties"), b"level-name=Survival\n").unwrap();
        fs::write(self.install.join("worlds/Survival/level.dat"), b"level").unwrap();
        fs::write(self.install.join("worlds/Survival/db/000001.ldb"), b"chunks").unwrap();
        InstallMetadata::new(VersionTag::new(version).unwrap())
            .write_atomic(&self.install)
            .unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.install.join(rel)).unwrap()
    }

    pub fn installed_version(&self) -> Option<String> {
        InstallMetadata::read(&self.install)
            .unwrap()
            .map(|m| m.version.to_string())
    }
}

/// Every regular file under `root`, relative, with its contents.
#[allow(dead_code)]
pub fn tree(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<_> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}
