// ABOUTME: Check command implementation.
// ABOUTME: Compares installed and latest versions without modifying anything.

use bedrock_updater::config::Config;
use bedrock_updater::error::Result;
use bedrock_updater::oracle::{self, configured_source};
use bedrock_updater::output::Output;
use bedrock_updater::transport::ReqwestTransport;
use serde::Serialize;

/// Exit code when a newer build is available.
pub const UPDATE_AVAILABLE_EXIT_CODE: i32 = 10;

#[derive(Serialize)]
struct CheckResult {
    installed: Option<String>,
    latest: String,
    download_uri: String,
    update_available: bool,
}

pub async fn check(config: &Config, output: &Output) -> Result<i32> {
    let transport = ReqwestTransport::from_config(&config.source)?;
    let source = configured_source(config, &transport);

    let installed = oracle::current_version(&config.install_location)?;
    let candidate = source.latest().await?;
    let comparison = oracle::compare(&installed, &candidate);

    let text = if comparison.is_up_to_date() {
        format!("Up to date ({installed})")
    } else {
        format!("Update available: {installed} -> {}", candidate.version)
    };
    let result = CheckResult {
        installed: installed.tag().map(ToString::to_string),
        latest: candidate.version.to_string(),
        download_uri: candidate.download_uri,
        update_available: !comparison.is_up_to_date(),
    };
    output.value(&result, &text);

    Ok(if comparison.is_up_to_date() {
        0
    } else {
        UPDATE_AVAILABLE_EXIT_CODE
    })
}
