//! On-disk layout of a vault directory.

use std::path::{Path, PathBuf};

/// Salt file name.
pub const SALT_FILENAME: &str = "salt";

/// Encrypted vault file name.
pub const VAULT_FILENAME: &str = "vault.enc";

/// Backup of the previous vault file.
pub const BACKUP_FILENAME: &str = "vault.enc.bak";

/// Plain-text settings file name.
pub const CONFIG_FILENAME: &str = "config.json";

/// Default vault directory name under the home directory.
pub const DEFAULT_DIRNAME: &str = ".lockbox";

/// Resolved paths of every file in a vault directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultPaths {
    dir: PathBuf,
}

impl VaultPaths {
    /// Layout rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.lockbox`, or `./.lockbox` when no home directory is known.
    pub fn default_location() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(home.join(DEFAULT_DIRNAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn salt(&self) -> PathBuf {
        self.dir.join(SALT_FILENAME)
    }

    pub fn vault(&self) -> PathBuf {
        self.dir.join(VAULT_FILENAME)
    }

    pub fn backup(&self) -> PathBuf {
        self.dir.join(BACKUP_FILENAME)
    }

    pub fn config(&self) -> PathBuf {
        self.dir.join(CONFIG_FILENAME)
    }
}
