//! Non-secret user settings stored next to the vault.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use lockbox_common::{Error, Result};
use lockbox_crypto::KdfParams;
use lockbox_storage::write_atomic;

/// Settings format version.
pub const SETTINGS_VERSION: u32 = 1;

/// Default inactivity period before auto-lock.
pub const DEFAULT_AUTO_LOCK_MINUTES: u64 = 5;

/// Default delay before a copied secret is cleared from the clipboard.
pub const DEFAULT_CLIPBOARD_CLEAR_SECONDS: u64 = 30;

/// Contents of `config.json`.
///
/// Unknown keys are ignored and missing keys take their defaults, so files
/// written by older builds keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    pub version: u32,
    /// Minutes of inactivity before auto-lock; 0 disables it.
    pub auto_lock_minutes: u64,
    pub clipboard_clear_seconds: u64,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            auto_lock_minutes: DEFAULT_AUTO_LOCK_MINUTES,
            clipboard_clear_seconds: DEFAULT_CLIPBOARD_CLEAR_SECONDS,
        }
    }
}

impl VaultSettings {
    /// Load settings from `path`.
    ///
    /// # Errors
    /// - `Serialization` if the file exists but is not valid settings JSON
    /// - `Io` if the file exists but cannot be read
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Write settings to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.to_json()?.as_bytes())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Auto-lock threshold; zero disables auto-lock.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.auto_lock_minutes.saturating_mul(60))
    }

    pub fn clipboard_timeout(&self) -> Duration {
        Duration::from_secs(self.clipboard_clear_seconds)
    }
}

/// Tunables a [`crate::Vault`] is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultOptions {
    /// Key derivation parameters used by `create` and `unlock`.
    pub kdf: KdfParams,
    /// Inactivity threshold for [`crate::Vault::check_timeout`].
    pub lock_timeout: Duration,
}

impl Default for VaultOptions {
    fn default() -> Self {
        VaultSettings::default().into()
    }
}

impl From<&VaultSettings> for VaultOptions {
    fn from(settings: &VaultSettings) -> Self {
        Self {
            kdf: KdfParams::default(),
            lock_timeout: settings.lock_timeout(),
        }
    }
}

impl From<VaultSettings> for VaultOptions {
    fn from(settings: VaultSettings) -> Self {
        Self::from(&settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = VaultSettings::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(settings, VaultSettings::default());
        assert_eq!(settings.lock_timeout(), Duration::from_secs(300));
        assert_eq!(settings.clipboard_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let settings = VaultSettings {
            auto_lock_minutes: 0,
            ..Default::default()
        };
        settings.save(&path).unwrap();

        let loaded = VaultSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.lock_timeout(), Duration::ZERO);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings = VaultSettings::from_json(r#"{"auto_lock_minutes": 15}"#).unwrap();
        assert_eq!(settings.auto_lock_minutes, 15);
        assert_eq!(settings.clipboard_clear_seconds, DEFAULT_CLIPBOARD_CLEAR_SECONDS);
    }

    #[test]
    fn test_malformed_file_is_error() {
        assert!(matches!(
            VaultSettings::from_json("{ nope"),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_options_follow_settings() {
        let options = VaultOptions::default();
        assert_eq!(options.lock_timeout, Duration::from_secs(300));
        assert_eq!(options.kdf, KdfParams::default());
    }
}
