// ABOUTME: Library root for bedrock-updater - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod backup;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fetch;
pub mod fileset;
pub mod fsops;
pub mod install;
pub mod launch;
pub mod layout;
pub mod oracle;
pub mod output;
pub mod transport;
pub mod types;
pub mod update;
