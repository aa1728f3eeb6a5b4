//! Atomic file replacement and permission hardening.
//!
//! A write goes to a temporary file in the target's directory (same
//! filesystem, so the rename is atomic), is flushed and fsynced, gets
//! owner-only permissions, and is renamed over the target. The directory is
//! fsynced afterwards so the rename itself survives a crash.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use lockbox_common::{Error, Result};

/// Mode for vault files on POSIX systems.
pub const FILE_MODE: u32 = 0o600;

/// Mode for the vault directory on POSIX systems.
pub const DIR_MODE: u32 = 0o700;

/// A fully written, fsynced temp file waiting to be renamed into place.
///
/// Dropping a `StagedWrite` without calling [`StagedWrite::commit`] deletes
/// the temp file and leaves the target untouched.
pub struct StagedWrite {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedWrite {
    /// Write `bytes` to a fresh temp file next to `target`.
    pub fn stage(target: &Path, bytes: &[u8]) -> Result<Self> {
        let dir = parent_dir(target)?;
        let prefix = format!(
            ".{}.",
            target
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("lockbox")
        );

        let mut temp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(dir)?;
        temp.write_all(bytes)?;
        temp.flush()?;
        temp.as_file().sync_all()?;
        restrict_file(temp.path())?;

        Ok(Self {
            temp,
            target: target.to_path_buf(),
        })
    }

    /// Location of the temp file.
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Rename the temp file over the target and fsync the directory.
    ///
    /// A failed directory fsync after the rename is logged, not returned:
    /// the new content is in place, but the rename may not survive a crash.
    pub fn commit(self) -> Result<()> {
        let Self { temp, target } = self;

        // On failure the returned PersistError owns the temp file and
        // removes it when dropped.
        temp.persist(&target).map_err(|e| Error::Io(e.error))?;
        debug!(path = %target.display(), "atomic rename complete");
        sync_parent(&target)
    }

    /// Like [`StagedWrite::commit`], but never replaces an existing target.
    ///
    /// # Errors
    /// - `AlreadyExists` if `target` exists; the temp file is removed
    pub fn commit_new(self) -> Result<()> {
        let Self { temp, target } = self;

        temp.persist_noclobber(&target).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                Error::AlreadyExists(target.display().to_string())
            } else {
                Error::Io(e.error)
            }
        })?;
        debug!(path = %target.display(), "atomic create complete");
        sync_parent(&target)
    }
}

fn sync_parent(target: &Path) -> Result<()> {
    if let Err(e) = sync_directory(parent_dir(target)?) {
        // The rename already happened; report rather than pretend the
        // write failed.
        warn!(error = %e, path = %target.display(), "directory fsync failed");
    }
    Ok(())
}

/// Atomically replace `target` with `bytes`.
///
/// # Postconditions
/// - On success `target` holds exactly `bytes` with owner-only permissions
/// - On failure `target` is unchanged and no temp file remains
/// - Durability of the rename is best effort: if the directory fsync fails
///   the call still succeeds and the failure is only logged
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    StagedWrite::stage(target, bytes)?.commit()
}

fn parent_dir(target: &Path) -> Result<&Path> {
    match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(dir),
        Some(_) => Ok(Path::new(".")),
        None => Err(Error::InvalidInput(format!(
            "no parent directory for {}",
            target.display()
        ))),
    }
}

/// Restrict a file to owner read/write.
#[cfg(unix)]
pub fn restrict_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(FILE_MODE))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn restrict_file(_path: &Path) -> Result<()> {
    Ok(())
}

/// Restrict a directory to owner access.
#[cfg(unix)]
pub fn restrict_dir(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(DIR_MODE))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn restrict_dir(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn sync_directory(dir: &Path) -> Result<()> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

// Directory handles cannot be fsynced here.
#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> Result<()> {
    Ok(())
}
