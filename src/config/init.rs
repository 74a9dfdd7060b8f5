// ABOUTME: Config scaffolding for new installations.
// ABOUTME: Writes a commented bedrock-updater.yml template.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config, DEFAULT_PRESERVE};

pub fn init_config(
    dir: &Path,
    install_location: Option<&Path>,
    temp_location: Option<&Path>,
    force: bool,
) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(path) = install_location {
        config.install_location = path.to_path_buf();
    }

    if let Some(path) = temp_location {
        config.temp_location = path.to_path_buf();
    }

    config.validate()?;

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(config_path)
}

fn generate_template_yaml(config: &Config) -> String {
    let preserve = DEFAULT_PRESERVE
        .iter()
        .map(|p| format!("  - {p}\n"))
        .collect::<String>();

    format!(
        r#"install_location: {}
temp_location: {}

# Pin a specific archive instead of scraping the download page.
# download_uri: https://minecraft.azureedge.net/bin-linux/bedrock-server-1.20.81.01.zip

launch_timeout: {}s

# Files the vendor ships that should never be installed (glob, relative to the server root).
exclude: []

# World saves, add-ons and operator configuration carried over from the previous install.
preserve:
{}
retention:
  keep_backup: true
  keep_staging: false
"#,
        config.install_location.display(),
        config.temp_location.display(),
        config.launch_timeout.as_secs(),
        preserve
    )
}
