// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bedrock-updater")]
#[command(about = "Unattended updates for Minecraft Bedrock dedicated servers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file (default: discovered in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output (for cron/CI)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Output as JSON lines
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new bedrock-updater.yml configuration file
    Init {
        /// Server install directory
        #[arg(long)]
        install_location: Option<PathBuf>,

        /// Scratch directory for downloads and backups
        #[arg(long)]
        temp_location: Option<PathBuf>,

        /// Overwrite existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the installed version and last backup (no network access)
    Status,

    /// Compare the installed version with the latest published build
    Check,

    /// Download, install and validate the latest build, rolling back on failure
    Update {
        /// Break an existing update lock
        #[arg(short, long)]
        force: bool,
    },

    /// Restore the install directory from the last complete backup
    Restore {
        /// Break an existing update lock
        #[arg(short, long)]
        force: bool,
    },
}
