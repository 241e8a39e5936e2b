//! Crash-safe file writes.
//!
//! Content goes to a temp file next to the destination, gets its final
//! permissions, and is renamed into place. Readers see either the old file
//! or the complete new one, never a partial write. Until the rename
//! succeeds the temp file is removed on every error path.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::{Builder, NamedTempFile, PersistError};
use tracing::{debug, warn};

use crate::error::{FsError, Result};

/// Atomically write `data` to `path` with the given permission bits.
///
/// Missing parent directories are created. When `overwrite` is false an
/// existing destination is an error and is left untouched.
///
/// # Errors
///
/// Returns `FsError::Exists` when the destination exists and `overwrite`
/// is false, `FsError::Replace` when both rename attempts fail, and
/// `FsError::Io` for any other filesystem failure.
pub fn write(path: &Path, data: &[u8], mode: u32, overwrite: bool) -> Result<()> {
    write_with(path, mode, overwrite, |file| file.write_all(data))
}

/// Like `write`, with the temp file filled by `fill`.
pub(crate) fn write_with<F>(path: &Path, mode: u32, overwrite: bool, fill: F) -> Result<()>
where
    F: FnOnce(&mut fs::File) -> io::Result<()>,
{
    write_inner(path, mode, overwrite, fill, persist)
}

// Moves the temp file into place. On failure the temp file comes back
// inside the error so it can be retried or dropped.
fn persist(temp: NamedTempFile, path: &Path) -> std::result::Result<(), PersistError> {
    temp.persist(path).map(|_| ())
}

/// Like `write_with`, with the final rename performed by `rename`.
pub(crate) fn write_inner<F, R>(
    path: &Path,
    mode: u32,
    overwrite: bool,
    fill: F,
    mut rename: R,
) -> Result<()>
where
    F: FnOnce(&mut fs::File) -> io::Result<()>,
    R: FnMut(NamedTempFile, &Path) -> std::result::Result<(), PersistError>,
{
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;

    if !overwrite && fs::symlink_metadata(path).is_ok() {
        return Err(FsError::Exists(path.to_path_buf()).into());
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut temp = Builder::new()
        .prefix(&format!(".{}.", file_name))
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| FsError::io(parent, e))?;
    debug!(temp = %temp.path().display(), "writing temp file");

    fill(temp.as_file_mut()).map_err(|e| FsError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| FsError::io(temp.path(), e))?;
    set_mode(&temp, mode)?;

    match rename(temp, path) {
        Ok(()) => Ok(()),
        Err(PersistError { error, file }) if overwrite => replace(path, error, file, rename),
        Err(PersistError { error, .. }) => Err(FsError::io(path, error).into()),
    }
}

// Remove whatever occupies the destination and retry the rename once.
fn replace<R>(path: &Path, first: io::Error, temp: NamedTempFile, mut rename: R) -> Result<()>
where
    R: FnMut(NamedTempFile, &Path) -> std::result::Result<(), PersistError>,
{
    warn!(path = %path.display(), error = %first, "rename failed, removing destination and retrying");

    let removed = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };
    match removed {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(FsError::Replace {
                path: path.to_path_buf(),
                first,
                retry: e,
            }
            .into())
        }
    }

    rename(temp, path).map_err(|e| {
        FsError::Replace {
            path: path.to_path_buf(),
            first,
            retry: e.error,
        }
        .into()
    })
}

#[cfg(unix)]
fn set_mode(temp: &NamedTempFile, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(temp.path(), fs::Permissions::from_mode(mode))
        .map_err(|e| FsError::io(temp.path(), e).into())
}

#[cfg(not(unix))]
fn set_mode(_temp: &NamedTempFile, _mode: u32) -> Result<()> {
    Ok(())
}
