//! File primitives shared by metadata and context persistence
//!
//! Every file is written whole in a single call and every directory gets
//! an explicit mode after creation, so the process umask never decides
//! who can read volume state.

use std::fs::{self, DirBuilder, OpenOptions, Permissions};
use std::io::{self, Write};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::layout::{DIR_MODE, FILE_MODE};
use crate::error::{Result, VolumeError};

/// `mkdir -p leaf`, forcing DIR_MODE on `root` and every directory between
/// it and `leaf`. Existing directories are not an error.
///
/// The tree under `root` is partly workload-visible, so nothing below the
/// host root is followed if it turned into a symlink: that is an error, and
/// modes are applied through the opened directory, never by path.
pub(crate) fn create_dirs(root: &Path, leaf: &Path) -> Result<()> {
    let rel = leaf.strip_prefix(root).map_err(|_| {
        VolumeError::io(
            "mkdir",
            io::Error::new(io::ErrorKind::InvalidInput, "leaf is not under the volume root"),
        )
    })?;

    if let Some(host_root) = root.parent() {
        DirBuilder::new()
            .recursive(true)
            .mode(DIR_MODE)
            .create(host_root)
            .map_err(|e| VolumeError::io("mkdir", e))?;
    }

    let mut dir = root.to_path_buf();
    ensure_private_dir(&dir)?;
    for part in rel.components() {
        dir.push(part);
        ensure_private_dir(&dir)?;
    }
    Ok(())
}

fn ensure_private_dir(dir: &Path) -> Result<()> {
    let mkdir = |e: io::Error| VolumeError::io("mkdir", e);

    match fs::symlink_metadata(dir) {
        Ok(meta) if meta.file_type().is_symlink() => {
            return Err(mkdir(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to follow symlink {}", dir.display()),
            )));
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            match DirBuilder::new().mode(DIR_MODE).create(dir) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(mkdir(e)),
            }
        }
        Err(e) => return Err(mkdir(e)),
    }

    // O_NOFOLLOW | O_DIRECTORY also catches a swap after the check above
    let handle = OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NOFOLLOW | libc::O_DIRECTORY)
        .open(dir)
        .map_err(mkdir)?;
    handle
        .set_permissions(Permissions::from_mode(DIR_MODE))
        .map_err(mkdir)
}

/// Write raw bytes to `path` with FILE_MODE, replacing any previous content.
/// A symlink at `path` is refused rather than written through.
pub(crate) fn write_file(what: &str, path: &Path, data: &[u8]) -> Result<()> {
    let op = || format!("write {what} file");

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(FILE_MODE)
        .custom_flags(libc::O_NOFOLLOW)
        .open(path)
        .map_err(|e| VolumeError::io(op(), e))?;
    file.write_all(data).map_err(|e| VolumeError::io(op(), e))?;

    // mode() only applies on creation; an overwritten file keeps its old bits
    file.set_permissions(Permissions::from_mode(FILE_MODE))
        .map_err(|e| VolumeError::io(op(), e))?;
    Ok(())
}

/// Serialize `value` as JSON and write it to `path`
pub(crate) fn write_json<T>(what: &str, path: &Path, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec(value).map_err(VolumeError::Encode)?;
    tracing::debug!(file = %path.display(), bytes = bytes.len(), "writing {} file", what);
    write_file(what, path, &bytes)
}

/// Read `path` and decode it as JSON.
///
/// A missing file comes back as an `Io` error of kind `NotFound`; callers
/// that give absence a meaning of their own map it themselves.
pub(crate) fn read_json<T>(what: &'static str, path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let bytes = fs::read(path).map_err(|e| VolumeError::io(format!("read {what} file"), e))?;
    serde_json::from_slice(&bytes).map_err(|source| VolumeError::Decode { what, source })
}

/// `rm -rf dir`; a directory that is already gone is fine
pub(crate) fn remove_dir_all(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(VolumeError::io("remove volume", e)),
    }
}
