// ABOUTME: Update command implementation.
// ABOUTME: Wires the real transport, source and launch validator into the update pipeline.

use bedrock_updater::config::Config;
use bedrock_updater::error::Result;
use bedrock_updater::launch::ProcessValidator;
use bedrock_updater::oracle::configured_source;
use bedrock_updater::output::Output;
use bedrock_updater::transport::ReqwestTransport;
use bedrock_updater::update::{RunOptions, run_update};

/// Run one update and print its report. Returns the outcome's exit code.
pub async fn update(config: Config, force: bool, output: &Output) -> Result<i32> {
    let transport = ReqwestTransport::from_config(&config.source)?;
    let source = configured_source(&config, &transport);
    let validator = ProcessValidator::new(config.launch.clone());

    output.progress(&format!(
        "Updating {} (launch timeout {:?})",
        config.install_location.display(),
        config.launch_timeout
    ));

    let options = RunOptions { force_lock: force };
    let report = run_update(config, source.as_ref(), &transport, &validator, options).await;

    output.report(&report);
    Ok(report.exit_code())
}
