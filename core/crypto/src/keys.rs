//! Key types with secure memory handling.
//!
//! All key types automatically zeroize their memory on drop to prevent
//! sensitive data from persisting in memory.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use lockbox_common::{Error, Result};

/// Length of encryption keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Length of the key-derivation salt in bytes.
pub const SALT_LENGTH: usize = 32;

/// Key material derived from the master password.
///
/// The password-derived secret is never used directly. It is split into a
/// cipher key and a MAC key with distinct domain labels so the two
/// primitives never share key bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    encryption_key: [u8; KEY_LENGTH],
    mac_key: [u8; KEY_LENGTH],
}

impl MasterKey {
    /// Split a raw derived secret into cipher and MAC keys.
    pub fn from_bytes(mut secret: [u8; KEY_LENGTH]) -> Self {
        let encryption_key = subkey(&secret, b"lockbox.v1.encryption");
        let mac_key = subkey(&secret, b"lockbox.v1.authentication");
        secret.zeroize();
        Self {
            encryption_key,
            mac_key,
        }
    }

    /// AES-256 key.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn encryption_key(&self) -> &[u8; KEY_LENGTH] {
        &self.encryption_key
    }

    /// HMAC-SHA256 key.
    pub fn mac_key(&self) -> &[u8; KEY_LENGTH] {
        &self.mac_key
    }
}

fn subkey(secret: &[u8; KEY_LENGTH], label: &[u8]) -> [u8; KEY_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(label);
    hasher.update(secret);

    let result = hasher.finalize();
    let mut derived = [0u8; KEY_LENGTH];
    derived.copy_from_slice(&result);
    derived
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterKey([REDACTED])")
    }
}

/// Salt for key derivation.
///
/// Generated once when a vault is created and never changed afterwards:
/// a different salt derives a different key, which makes every existing
/// ciphertext undecryptable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salt(pub [u8; SALT_LENGTH]);

impl Salt {
    /// Generate a random salt.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut salt = [0u8; SALT_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        Self(salt)
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; SALT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse salt bytes read from disk.
    ///
    /// # Errors
    /// - `Corrupted` if the slice is not exactly `SALT_LENGTH` bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let salt: [u8; SALT_LENGTH] = bytes.try_into().map_err(|_| {
            Error::Corrupted(format!(
                "salt must be {} bytes, found {}",
                SALT_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(salt))
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LENGTH] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subkeys_are_distinct() {
        let master = MasterKey::from_bytes([7u8; KEY_LENGTH]);
        assert_ne!(master.encryption_key(), master.mac_key());
        assert_ne!(master.encryption_key(), &[7u8; KEY_LENGTH]);
    }

    #[test]
    fn test_subkeys_deterministic() {
        let a = MasterKey::from_bytes([1u8; KEY_LENGTH]);
        let b = MasterKey::from_bytes([1u8; KEY_LENGTH]);
        assert_eq!(a.encryption_key(), b.encryption_key());
        assert_eq!(a.mac_key(), b.mac_key());
    }

    #[test]
    fn test_debug_redacts() {
        let master = MasterKey::from_bytes([1u8; KEY_LENGTH]);
        assert_eq!(format!("{:?}", master), "MasterKey([REDACTED])");
    }

    #[test]
    fn test_salt_generate() {
        let salt1 = Salt::generate();
        let salt2 = Salt::generate();

        // Random salts should be different
        assert_ne!(salt1.as_bytes(), salt2.as_bytes());
    }

    #[test]
    fn test_salt_from_slice_rejects_wrong_length() {
        assert!(matches!(Salt::from_slice(&[0u8; 16]), Err(Error::Corrupted(_))));
        assert!(Salt::from_slice(&[0u8; SALT_LENGTH]).is_ok());
    }
}
