//! Cryptographic primitives for Lockbox.
//!
//! This module provides:
//! - Key derivation using PBKDF2-HMAC-SHA256
//! - Encrypt-then-MAC bundles using AES-256-CBC and HMAC-SHA256
//! - Secure key management with automatic zeroization
//! - Password, passphrase and PIN generation and strength estimation
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged
//! - The MAC is verified in constant time before any decryption happens

pub mod cipher;
pub mod generator;
pub mod kdf;
pub mod keys;
pub mod manager;
pub mod strength;
mod wordlist;

pub use cipher::{decrypt, encrypt};
pub use generator::{generate_passphrase, generate_password, generate_pin, PasswordOptions};
pub use kdf::{derive_key, KdfParams, PBKDF2_ITERATIONS};
pub use keys::{MasterKey, Salt};
pub use manager::CryptoManager;
pub use strength::{check_strength, meets_requirements, StrengthResult};
