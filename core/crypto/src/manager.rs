//! Session-scoped owner of the derived vault key.

use tracing::debug;

use crate::cipher;
use crate::kdf::{derive_key, KdfParams};
use crate::keys::{MasterKey, Salt};
use lockbox_common::{Error, Result, SensitiveBytes};

/// Holds the derived key for one unlocked session and performs bundle
/// encryption with it.
///
/// After [`CryptoManager::wipe`] every operation fails; the manager cannot be
/// re-armed; derive a new one instead.
pub struct CryptoManager {
    key: Option<MasterKey>,
}

impl CryptoManager {
    /// Derive the key from `password` and `salt`.
    pub fn new(password: &[u8], salt: &Salt, params: &KdfParams) -> Self {
        Self::from_key(derive_key(password, salt, params))
    }

    /// Wrap an already derived key.
    pub fn from_key(key: MasterKey) -> Self {
        Self { key: Some(key) }
    }

    fn key(&self) -> Result<&MasterKey> {
        self.key
            .as_ref()
            .ok_or_else(|| Error::Crypto("key material has been wiped".to_string()))
    }

    /// Encrypt and authenticate `plaintext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        cipher::encrypt(self.key()?, plaintext)
    }

    /// Authenticate and decrypt a bundle.
    ///
    /// # Errors
    /// - `Decryption` on any MAC failure, wrong password included
    pub fn decrypt(&self, bundle: &[u8]) -> Result<SensitiveBytes> {
        cipher::decrypt(self.key()?, bundle)
    }

    /// Overwrite all key material held by this manager.
    ///
    /// Best effort: copies made elsewhere (registers, swapped pages) are out
    /// of reach.
    pub fn wipe(&mut self) {
        if self.key.take().is_some() {
            // MasterKey is ZeroizeOnDrop
            debug!("crypto key material wiped");
        }
    }

    /// Whether [`CryptoManager::wipe`] has run.
    pub fn is_wiped(&self) -> bool {
        self.key.is_none()
    }
}

impl Drop for CryptoManager {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl std::fmt::Debug for CryptoManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoManager")
            .field("wiped", &self.is_wiped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(password: &[u8]) -> CryptoManager {
        let salt = Salt::from_bytes([5u8; 32]);
        CryptoManager::new(password, &salt, &KdfParams::with_iterations(1_000))
    }

    #[test]
    fn test_roundtrip_with_same_password() {
        let bundle = manager(b"pw").encrypt(b"secret").unwrap();
        let plaintext = manager(b"pw").decrypt(&bundle).unwrap();
        assert_eq!(plaintext.as_bytes(), b"secret");
    }

    #[test]
    fn test_wrong_password_is_decryption_error() {
        let bundle = manager(b"right").encrypt(b"secret").unwrap();
        assert!(matches!(
            manager(b"wrong").decrypt(&bundle),
            Err(Error::Decryption)
        ));
    }

    #[test]
    fn test_wipe_disables_manager() {
        let mut crypto = manager(b"pw");
        let bundle = crypto.encrypt(b"x").unwrap();

        crypto.wipe();
        crypto.wipe();

        assert!(crypto.is_wiped());
        assert!(crypto.encrypt(b"x").is_err());
        assert!(crypto.decrypt(&bundle).is_err());
    }
}
