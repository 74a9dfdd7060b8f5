// ABOUTME: Archive fetcher: staged download and extraction of the update.
// ABOUTME: Downloads go to a .part file and are renamed only once complete.

mod error;
mod extract;

pub use error::{FetchError, FetchErrorKind};
pub use extract::extract;

use snafu::ResultExt;
use std::fs;
use std::path::PathBuf;

use crate::fsops::{empty_dir, remove_path};
use crate::layout::TempLayout;
use crate::transport::HttpTransport;
use error::{DownloadSnafu, FinalizeSnafu, StagingSnafu};

/// Download `uri` into a freshly emptied staging directory.
///
/// The archive only appears at its final path once fully written; on any
/// failure the partial file is removed.
pub async fn fetch<T: HttpTransport + ?Sized>(
    transport: &T,
    uri: &str,
    layout: &TempLayout,
) -> Result<PathBuf, FetchError> {
    let staging = layout.download_dir();
    empty_dir(&staging).context(StagingSnafu { path: &staging })?;

    let partial = layout.partial_archive_path();
    let archive = layout.archive_path();

    let bytes = match transport.download(uri, &partial).await {
        Ok(bytes) => bytes,
        Err(source) => {
            let _ = remove_path(&partial);
            return Err(source).context(DownloadSnafu { uri });
        }
    };

    if let Err(source) = fs::rename(&partial, &archive) {
        let _ = remove_path(&partial);
        return Err(source).context(FinalizeSnafu { path: &archive });
    }

    tracing::info!("downloaded {} ({} bytes)", uri, bytes);
    Ok(archive)
}
