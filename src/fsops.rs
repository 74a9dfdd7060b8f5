// ABOUTME: Directory-level filesystem primitives shared by backup, install, and curation.
// ABOUTME: Recursive copy, emptying a directory in place, and path-annotated I/O errors.

use std::fs;
use std::io;
use std::path::Path;

/// Attach the offending path to an I/O error, keeping its kind.
pub(crate) fn at(path: &Path) -> impl FnOnce(io::Error) -> io::Error + '_ {
    move |err| io::Error::new(err.kind(), format!("{}: {err}", path.display()))
}

/// Remove everything inside `dir`, creating it if missing. The directory itself stays.
pub fn empty_dir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        return fs::create_dir_all(dir).map_err(at(dir));
    }

    for entry in fs::read_dir(dir).map_err(at(dir))? {
        let entry = entry.map_err(at(dir))?;
        remove_path(&entry.path())?;
    }
    Ok(())
}

/// Remove a file, symlink, or directory tree. Missing paths are not an error.
pub fn remove_path(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(at(path)(err)),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path).map_err(at(path))
    } else {
        fs::remove_file(path).map_err(at(path))
    }
}

/// Copy the contents of `src` into `dst`, merging with anything already there.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst).map_err(at(dst))?;
    for entry in fs::read_dir(src).map_err(at(src))? {
        let entry = entry.map_err(at(src))?;
        copy_entry(&entry.path(), &dst.join(entry.file_name()))?;
    }
    Ok(())
}

/// Copy a single file, symlink, or directory tree to `dst`.
pub fn copy_entry(src: &Path, dst: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(src).map_err(at(src))?;

    if metadata.is_dir() {
        return copy_dir_recursive(src, dst);
    }

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(at(parent))?;
    }

    #[cfg(unix)]
    if metadata.file_type().is_symlink() {
        let target = fs::read_link(src).map_err(at(src))?;
        return std::os::unix::fs::symlink(&target, dst).map_err(at(dst));
    }

    fs::copy(src, dst).map_err(at(dst))?;
    Ok(())
}
