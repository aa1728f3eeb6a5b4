//! Crash-safe persistence for the encrypted vault blob.
//!
//! This module provides a trait-based interface over where the vault bytes
//! live, a filesystem implementation with atomic replace semantics, and an
//! in-memory implementation for tests.
//!
//! # Design Principles
//! - All-or-nothing writes: a reader sees either the old blob or the new one
//! - Owner-only permissions on every file and on the vault directory
//! - Single writer: atomic rename is a crash barrier, not a lock

pub mod atomic;
pub mod local;
pub mod memory;
pub mod paths;
pub mod provider;

pub use atomic::{write_atomic, StagedWrite};
pub use local::VaultStore;
pub use memory::MemoryStore;
pub use paths::VaultPaths;
pub use provider::BlobStore;
