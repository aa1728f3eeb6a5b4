//! Vault engine for Lockbox.
//!
//! This module provides:
//! - The six credential record kinds and their tagged on-disk form
//! - A schema-versioned vault document with an ordered migration chain
//! - The locked/unlocked session state machine with per-collection CRUD
//! - Inactivity tracking for auto-lock
//! - Non-secret settings stored next to the vault
//!
//! # Architecture
//! The vault sits between the application and the blob store, encrypting
//! the whole working set on every mutation and decrypting it on unlock.

pub mod data;
pub mod document;
pub mod model;
pub mod session;
pub mod settings;

pub use data::{CollectionCounts, VaultData};
pub use document::SCHEMA_VERSION;
pub use model::{
    CardPatch, CreditCard, EmailCredential, EmailPatch, EnvEntry, EnvPatch, NoteEntry, NotePatch,
    PhoneCredential, PhonePatch, Record, RecoveryEntry, RecoveryPatch, VaultRecord,
};
pub use session::Vault;
pub use settings::{VaultOptions, VaultSettings};
