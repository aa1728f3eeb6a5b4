//! Encrypt-then-MAC bundles using AES-256-CBC and HMAC-SHA256.
//!
//! Bundle layout:
//!
//! ```text
//! version (1) || iv (16) || ciphertext (n * 16) || tag (32)
//! ```
//!
//! The tag is HMAC-SHA256 over `version || iv || ciphertext`, keyed with the
//! MAC half of the [`MasterKey`]. Decryption verifies the tag in constant
//! time and only then touches the cipher.

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::keys::MasterKey;
use lockbox_common::{Error, Result, SensitiveBytes};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Bundle format version.
pub const BUNDLE_VERSION: u8 = 1;

/// IV size for AES-CBC (16 bytes).
pub const IV_SIZE: usize = 16;

/// AES block size.
pub const BLOCK_SIZE: usize = 16;

/// HMAC-SHA256 tag size (32 bytes).
pub const TAG_SIZE: usize = 32;

/// Smallest well-formed bundle: header, IV, one padded block and the tag.
pub const MIN_BUNDLE_SIZE: usize = 1 + IV_SIZE + BLOCK_SIZE + TAG_SIZE;

/// Encrypt plaintext into an authenticated bundle.
///
/// # Postconditions
/// - Returns version || iv || ciphertext || tag
/// - The IV is freshly generated from the OS CSPRNG
///
/// # Errors
/// - Returns error if the MAC cannot be initialized
pub fn encrypt(key: &MasterKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new(key.encryption_key().into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut bundle = Vec::with_capacity(1 + IV_SIZE + ciphertext.len() + TAG_SIZE);
    bundle.push(BUNDLE_VERSION);
    bundle.extend_from_slice(&iv);
    bundle.extend_from_slice(&ciphertext);

    let tag = compute_tag(key, &bundle)?;
    bundle.extend_from_slice(&tag);

    Ok(bundle)
}

/// Verify and decrypt a bundle.
///
/// # Errors
/// - `Decryption` if the bundle is malformed, the tag does not verify, or
///   the padding is invalid. No plaintext fragment is returned in any of
///   these cases, and the error does not say which check failed.
pub fn decrypt(key: &MasterKey, bundle: &[u8]) -> Result<SensitiveBytes> {
    if bundle.len() < MIN_BUNDLE_SIZE || bundle[0] != BUNDLE_VERSION {
        return Err(Error::Decryption);
    }

    let (authenticated, tag) = bundle.split_at(bundle.len() - TAG_SIZE);
    let ciphertext = &authenticated[1 + IV_SIZE..];
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(Error::Decryption);
    }

    let expected = compute_tag(key, authenticated)?;
    if expected[..].ct_eq(tag).unwrap_u8() != 1 {
        return Err(Error::Decryption);
    }

    let mut iv = [0u8; IV_SIZE];
    iv.copy_from_slice(&authenticated[1..1 + IV_SIZE]);

    let plaintext = Aes256CbcDec::new(key.encryption_key().into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::Decryption)?;

    Ok(SensitiveBytes::new(plaintext))
}

fn compute_tag(key: &MasterKey, data: &[u8]) -> Result<[u8; TAG_SIZE]> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key.mac_key())
        .map_err(|e| Error::Crypto(format!("HMAC init failed: {}", e)))?;
    mac.update(data);

    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KEY_LENGTH;
    use proptest::prelude::*;

    fn key(byte: u8) -> MasterKey {
        MasterKey::from_bytes([byte; KEY_LENGTH])
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = key(42);
        let plaintext = b"Hello, World!";

        let bundle = encrypt(&key, plaintext).unwrap();
        let decrypted = decrypt(&key, &bundle).unwrap();

        assert_eq!(decrypted.as_bytes(), plaintext);
    }

    #[test]
    fn test_bundle_size() {
        let key = key(42);
        let plaintext = [0u8; 20];

        let bundle = encrypt(&key, &plaintext).unwrap();

        // 20 bytes pads to two blocks
        assert_eq!(bundle.len(), 1 + IV_SIZE + 2 * BLOCK_SIZE + TAG_SIZE);
        assert_eq!(bundle[0], BUNDLE_VERSION);
    }

    #[test]
    fn test_different_iv_each_time() {
        let key = key(42);
        let plaintext = b"Same plaintext";

        let b1 = encrypt(&key, plaintext).unwrap();
        let b2 = encrypt(&key, plaintext).unwrap();

        assert_ne!(&b1[1..1 + IV_SIZE], &b2[1..1 + IV_SIZE]);
        assert_ne!(b1, b2);
    }

    #[test]
    fn test_wrong_key_fails() {
        let bundle = encrypt(&key(1), b"Secret data").unwrap();
        assert!(matches!(decrypt(&key(2), &bundle), Err(Error::Decryption)));
    }

    #[test]
    fn test_truncated_bundle_fails() {
        let key = key(3);
        let bundle = encrypt(&key, b"data").unwrap();

        assert!(matches!(decrypt(&key, &bundle[..10]), Err(Error::Decryption)));
        assert!(matches!(decrypt(&key, &[]), Err(Error::Decryption)));
        assert!(matches!(
            decrypt(&key, &bundle[..bundle.len() - 1]),
            Err(Error::Decryption)
        ));
    }

    #[test]
    fn test_empty_plaintext() {
        let key = key(42);

        let bundle = encrypt(&key, b"").unwrap();
        let decrypted = decrypt(&key, &bundle).unwrap();

        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_large_plaintext() {
        let key = key(42);
        let plaintext = vec![0xABu8; 1_000_000]; // 1 MB

        let bundle = encrypt(&key, &plaintext).unwrap();
        let decrypted = decrypt(&key, &bundle).unwrap();

        assert_eq!(decrypted.as_bytes(), plaintext.as_slice());
    }

    proptest! {
        #[test]
        fn prop_roundtrip(plaintext in proptest::collection::vec(any::<u8>(), 0..512), seed in any::<u8>()) {
            let key = key(seed);
            let bundle = encrypt(&key, &plaintext).unwrap();
            let decrypted = decrypt(&key, &bundle).unwrap();
            prop_assert_eq!(decrypted.as_bytes(), plaintext.as_slice());
        }

        #[test]
        fn prop_single_byte_flip_rejected(
            plaintext in proptest::collection::vec(any::<u8>(), 0..256),
            position in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let key = key(9);
            let mut bundle = encrypt(&key, &plaintext).unwrap();
            let i = position.index(bundle.len());
            bundle[i] ^= flip;
            prop_assert!(matches!(decrypt(&key, &bundle), Err(Error::Decryption)));
        }
    }
}
