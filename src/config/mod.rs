// ABOUTME: Configuration types and parsing for bedrock-updater.yml.
// ABOUTME: Handles YAML parsing, discovery, defaults, and pre-run validation.

mod deserialize;
mod init;
mod launch;
mod source;

pub use init::init_config;
pub use launch::LaunchConfig;
pub use source::{
    DEFAULT_LINK_PATTERN, DEFAULT_LINK_PREFIX, DEFAULT_LINK_SUFFIX, DEFAULT_PAGE_URL, SourceConfig,
};

use crate::error::{Error, Result};
use crate::types::PathPattern;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "bedrock-updater.yml";
pub const CONFIG_FILENAME_ALT: &str = "bedrock-updater.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".bedrock-updater/config.yml";

/// Paths preserved from the previous install when no `preserve` list is given.
pub const DEFAULT_PRESERVE: &[&str] = &[
    "worlds",
    "development_behavior_packs",
    "development_resource_packs",
    "server.properties",
    "permissions.json",
    "allowlist.json",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub install_location: PathBuf,

    pub temp_location: PathBuf,

    /// Pins the archive URI and skips scraping the vendor page.
    #[serde(default)]
    pub download_uri: Option<String>,

    #[serde(default = "default_launch_timeout", with = "humantime_serde")]
    pub launch_timeout: Duration,

    /// Removed from the staged update before install. Empty means nothing is purged.
    #[serde(default)]
    pub exclude: Vec<PathPattern>,

    /// Copied back from the snapshot over the fresh install.
    #[serde(default = "default_preserve")]
    pub preserve: Vec<PathPattern>,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub launch: LaunchConfig,

    #[serde(default)]
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Keep the pre-update snapshot after a successful update.
    #[serde(default = "default_true")]
    pub keep_backup: bool,

    /// Leave the download/extract area in place for inspection.
    #[serde(default)]
    pub keep_staging: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            keep_backup: true,
            keep_staging: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_launch_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_preserve() -> Vec<PathPattern> {
    DEFAULT_PRESERVE
        .iter()
        .map(|p| PathPattern::new(p).expect("default preserve patterns are valid"))
        .collect()
}

impl Config {
    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Reject configurations that would make the pipeline unsafe to run.
    pub fn validate(&self) -> Result<()> {
        if self.install_location.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "install_location cannot be empty".to_string(),
            ));
        }

        if self.temp_location.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "temp_location cannot be empty".to_string(),
            ));
        }

        let install = resolve_location(&self.install_location)?;
        let temp = resolve_location(&self.temp_location)?;

        if install.file_name().is_none() {
            return Err(Error::InvalidConfig(format!(
                "install_location must name a directory, got {}",
                self.install_location.display()
            )));
        }

        if install == temp {
            return Err(Error::InvalidConfig(
                "install_location and temp_location must differ".to_string(),
            ));
        }

        // Emptying the install dir must never reach the staging area, and
        // restoring into the temp dir must never reach the install.
        if temp.starts_with(&install) || install.starts_with(&temp) {
            return Err(Error::InvalidConfig(format!(
                "install_location ({}) and temp_location ({}) cannot be nested",
                install.display(),
                temp.display()
            )));
        }

        if self.launch_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "launch_timeout must be greater than zero".to_string(),
            ));
        }

        if self.source.link_suffix.is_empty() {
            return Err(Error::InvalidConfig(
                "source.link_suffix cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Minimal configuration with defaults for everything but the two locations.
    pub fn new(install_location: impl Into<PathBuf>, temp_location: impl Into<PathBuf>) -> Self {
        Config {
            install_location: install_location.into(),
            temp_location: temp_location.into(),
            download_uri: None,
            launch_timeout: default_launch_timeout(),
            exclude: Vec::new(),
            preserve: default_preserve(),
            source: SourceConfig::default(),
            launch: LaunchConfig::default(),
            retention: RetentionConfig::default(),
        }
    }

    pub fn template() -> Self {
        Self::new("/opt/bedrock-server", "/var/tmp/bedrock-updater")
    }
}

/// Resolve a location the way the filesystem will see it.
///
/// The deepest existing ancestor is canonicalized (following symlinks and
/// `..`); the components that do not exist yet are appended lexically.
fn resolve_location(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let components: Vec<Component<'_>> = absolute.components().collect();

    for split in (1..=components.len()).rev() {
        let existing: PathBuf = components[..split].iter().collect();
        let mut resolved = match existing.canonicalize() {
            Ok(resolved) => resolved,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                continue;
            }
            Err(err) => return Err(err),
        };

        for component in &components[split..] {
            match component {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(name) => resolved.push(name),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        return Ok(resolved);
    }

    Ok(absolute)
}
