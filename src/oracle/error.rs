// ABOUTME: Error types for version discovery.
// ABOUTME: Distinguishes unreachable sources, missing links, bad formats, and corrupt metadata.

use std::path::PathBuf;

/// Errors raised while determining installed or available versions.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Vendor page could not be fetched.
    #[error("update source unreachable: {0}")]
    SourceUnreachable(String),

    /// Page fetched but no download link matched.
    #[error("no download link matching '{pattern}' found on {url}")]
    NoLinkFound { url: String, pattern: String },

    /// A link matched but the version could not be derived from it.
    #[error("unexpected download link format: {0}")]
    UnexpectedFormat(String),

    /// Install metadata exists but cannot be used.
    #[error("install metadata {} is corrupt: {reason}", path.display())]
    MetadataCorrupt { path: PathBuf, reason: String },
}
