//! Local filesystem vault store.

use std::fs::{self, OpenOptions};

use tracing::{debug, info};

use crate::atomic::{restrict_dir, restrict_file, StagedWrite};
use crate::paths::VaultPaths;
use crate::provider::BlobStore;
use lockbox_common::{Error, Result};

/// Filesystem-backed vault store.
///
/// Stores the salt, the encrypted vault and its backup in one directory
/// laid out by [`VaultPaths`].
pub struct VaultStore {
    paths: VaultPaths,
    bytes_written: u64,
}

impl VaultStore {
    /// Create a store over the given layout. Nothing is touched on disk
    /// until the first write.
    pub fn new(paths: VaultPaths) -> Self {
        Self {
            paths,
            bytes_written: 0,
        }
    }

    /// The directory layout.
    pub fn paths(&self) -> &VaultPaths {
        &self.paths
    }

    /// Copy the current vault file to the backup path.
    ///
    /// The copy keeps the source's modification time and is then restricted
    /// to the owner. Only one generation is kept: the previous backup is
    /// overwritten. A missing vault file is not an error.
    pub fn backup(&self) -> Result<()> {
        let vault = self.paths.vault();
        if !vault.is_file() {
            return Ok(());
        }

        let backup = self.paths.backup();
        fs::copy(&vault, &backup)?;

        if let Ok(modified) = fs::metadata(&vault).and_then(|m| m.modified()) {
            let file = OpenOptions::new().write(true).open(&backup)?;
            file.set_modified(modified)?;
        }
        restrict_file(&backup)?;

        debug!(path = %backup.display(), "vault backup refreshed");
        Ok(())
    }

    /// Back up, then atomically replace the vault file.
    ///
    /// On failure the temp file is removed and the existing vault file is
    /// left as it was.
    pub fn atomic_write(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_directory()?;
        self.backup()?;

        let staged = StagedWrite::stage(&self.paths.vault(), bytes)?;
        staged.commit()?;

        self.bytes_written += bytes.len() as u64;
        info!(bytes = bytes.len(), "vault written");
        Ok(())
    }
}

impl BlobStore for VaultStore {
    fn name(&self) -> &str {
        "file"
    }

    fn ensure_directory(&mut self) -> Result<()> {
        let dir = self.paths.dir();
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            debug!(path = %dir.display(), "created vault directory");
        }
        restrict_dir(dir)
    }

    fn vault_exists(&self) -> bool {
        self.paths.vault().is_file()
    }

    fn load_salt(&self) -> Result<Option<Vec<u8>>> {
        let path = self.paths.salt();
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    fn save_salt(&mut self, salt: &[u8]) -> Result<()> {
        self.ensure_directory()?;

        // Staged so a crash never leaves a short salt file behind.
        let path = self.paths.salt();
        StagedWrite::stage(&path, salt)?
            .commit_new()
            .map_err(|e| match e {
                Error::AlreadyExists(_) => {
                    Error::AlreadyExists(format!("salt file {}", path.display()))
                }
                other => other,
            })?;

        debug!(path = %path.display(), "salt written");
        Ok(())
    }

    fn discard_salt(&mut self) -> Result<()> {
        if self.vault_exists() {
            return Err(Error::AlreadyExists(format!(
                "vault {} depends on its salt",
                self.paths.vault().display()
            )));
        }
        let path = self.paths.salt();
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "salt discarded");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn read_vault(&self) -> Result<Vec<u8>> {
        let path = self.paths.vault();
        if !path.is_file() {
            return Err(Error::NotFound(format!("no vault at {}", path.display())));
        }
        Ok(fs::read(path)?)
    }

    fn write_vault(&mut self, bytes: &[u8]) -> Result<()> {
        self.atomic_write(bytes)
    }

    fn read_backup(&self) -> Result<Option<Vec<u8>>> {
        let path = self.paths.backup();
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}
