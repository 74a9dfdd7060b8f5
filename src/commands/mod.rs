// ABOUTME: Command module aggregator for the bedrock-updater CLI.
// ABOUTME: Re-exports status, check, update, and restore command handlers.

mod check;
mod restore;
mod status;
mod update;

pub use check::check;
pub use restore::restore;
pub use status::status;
pub use update::update;
