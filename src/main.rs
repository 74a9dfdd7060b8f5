// ABOUTME: Entry point for the bedrock-updater CLI application.
// ABOUTME: Parses arguments, sets up tracing, and dispatches to command handlers.

mod cli;
mod commands;

use bedrock_updater::config::{self, Config};
use bedrock_updater::error::Result;
use bedrock_updater::output::{Output, OutputMode};
use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise the verbose flag picks the level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode);

    match run(cli, &output).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            output.error(&e.to_string());
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli, output: &Output) -> Result<i32> {
    match cli.command {
        Commands::Init {
            install_location,
            temp_location,
            force,
        } => {
            let cwd = env::current_dir()?;
            let path = config::init_config(
                &cwd,
                install_location.as_deref(),
                temp_location.as_deref(),
                force,
            )?;
            output.success(&format!("Created {}", path.display()));
            Ok(0)
        }
        Commands::Status => {
            let config = load_config(cli.config.as_deref())?;
            commands::status(&config, output)
        }
        Commands::Check => {
            let config = load_config(cli.config.as_deref())?;
            commands::check(&config, output).await
        }
        Commands::Update { force } => {
            let config = load_config(cli.config.as_deref())?;
            commands::update(config, force, output).await
        }
        Commands::Restore { force } => {
            let config = load_config(cli.config.as_deref())?;
            commands::restore(&config, force, output).await
        }
    }
}

/// Load the explicit config file, or discover one in the current directory.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::discover(&env::current_dir()?),
    }
}
