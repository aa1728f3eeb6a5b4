//! Key derivation using PBKDF2-HMAC-SHA256.
//!
//! The iteration count is a compile-time constant sized to make offline
//! brute force of a stolen vault file expensive.

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::keys::{MasterKey, Salt, KEY_LENGTH};

/// Default PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 480_000;

/// Parameters for PBKDF2 key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Number of HMAC-SHA256 iterations.
    pub iterations: u32,
}

impl KdfParams {
    /// Parameters with a custom iteration count.
    ///
    /// Anything below [`PBKDF2_ITERATIONS`] is only suitable for tests. A
    /// count of zero is raised to one.
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
        }
    }
}

/// Derive the vault key from a password and salt.
///
/// # Postconditions
/// - The derived key is deterministic given the same inputs
/// - Never fails; an empty password is accepted and simply weak
///
/// # Security
/// - Password is not stored or logged
/// - The intermediate secret is zeroized after the key split
pub fn derive_key(password: &[u8], salt: &Salt, params: &KdfParams) -> MasterKey {
    let mut secret = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password, salt.as_bytes(), params.iterations, &mut secret);

    let key = MasterKey::from_bytes(secret);
    secret.zeroize();

    tracing::debug!(iterations = params.iterations, "derived vault key");
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams::with_iterations(1_000)
    }

    #[test]
    fn test_default_iterations() {
        assert!(KdfParams::default().iterations >= 400_000);
    }

    #[test]
    fn test_derive_key_deterministic() {
        let password = b"test-password-123";
        let salt = Salt::from_bytes([42u8; 32]);

        let key1 = derive_key(password, &salt, &fast());
        let key2 = derive_key(password, &salt, &fast());

        assert_eq!(key1.encryption_key(), key2.encryption_key());
        assert_eq!(key1.mac_key(), key2.mac_key());
    }

    #[test]
    fn test_derive_key_different_salt() {
        let password = b"test-password-123";
        let salt1 = Salt::from_bytes([1u8; 32]);
        let salt2 = Salt::from_bytes([2u8; 32]);

        let key1 = derive_key(password, &salt1, &fast());
        let key2 = derive_key(password, &salt2, &fast());

        assert_ne!(key1.encryption_key(), key2.encryption_key());
    }

    #[test]
    fn test_derive_key_different_password() {
        let salt = Salt::from_bytes([42u8; 32]);

        let key1 = derive_key(b"password1", &salt, &fast());
        let key2 = derive_key(b"password2", &salt, &fast());

        assert_ne!(key1.encryption_key(), key2.encryption_key());
    }

    #[test]
    fn test_zero_iterations_clamped() {
        assert_eq!(KdfParams::with_iterations(0).iterations, 1);
    }
}
