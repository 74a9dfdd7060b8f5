// ABOUTME: Zip extraction into the staging tree.
// ABOUTME: Rejects path traversal and symlink entries; keeps unix permission bits.

use snafu::{OptionExt, ResultExt, ensure};
use std::fs;
use std::io;
use std::path::Path;

use super::error::{
    FetchError, OpenArchiveSnafu, ReadEntrySnafu, SymlinkEntrySnafu, UnsafeEntrySnafu,
    WriteEntrySnafu,
};
use crate::fsops::empty_dir;

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Extract every entry of `archive` into an emptied `dest`.
///
/// Returns the number of files written.
pub fn extract(archive: &Path, dest: &Path) -> Result<usize, FetchError> {
    empty_dir(dest).context(WriteEntrySnafu { path: dest })?;

    let file = fs::File::open(archive).context(WriteEntrySnafu { path: archive })?;
    let mut zip = zip::ZipArchive::new(io::BufReader::new(file))
        .context(OpenArchiveSnafu { path: archive })?;

    let mut written = 0;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).context(ReadEntrySnafu { index })?;
        let name = entry.name().to_string();

        let rel = entry
            .enclosed_name()
            .context(UnsafeEntrySnafu { name: name.clone() })?;
        ensure!(
            !entry.unix_mode().is_some_and(|mode| mode & S_IFMT == S_IFLNK),
            SymlinkEntrySnafu { name }
        );

        let target = dest.join(&rel);
        if entry.is_dir() {
            fs::create_dir_all(&target).context(WriteEntrySnafu { path: &target })?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).context(WriteEntrySnafu { path: parent })?;
        }
        let mut out = fs::File::create(&target).context(WriteEntrySnafu { path: &target })?;
        io::copy(&mut entry, &mut out).context(WriteEntrySnafu { path: &target })?;

        // Entries without permission bits keep the umask default.
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode().map(|mode| mode & 0o777).filter(|&m| m != 0) {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode))
                .context(WriteEntrySnafu { path: &target })?;
        }

        written += 1;
    }

    tracing::debug!(
        "extracted {} files from {} into {}",
        written,
        archive.display(),
        dest.display()
    );
    Ok(written)
}
