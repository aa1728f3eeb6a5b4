//! In-memory blob store for testing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lockbox_common::{Error, Result};

use crate::provider::BlobStore;

#[derive(Debug, Default)]
struct Inner {
    salt: Option<Vec<u8>>,
    vault: Option<Vec<u8>>,
    backup: Option<Vec<u8>>,
    bytes_written: u64,
    fail_writes: bool,
}

/// In-memory blob store.
///
/// Clones share the same storage, so a test can hand one clone to a vault
/// and inspect or sabotage it through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent [`BlobStore::write_vault`] fail with an I/O
    /// error while leaving stored data untouched.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Overwrite the stored blob directly, bypassing backup and accounting.
    pub fn tamper(&self, bytes: Vec<u8>) {
        self.lock().vault = Some(bytes);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BlobStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn ensure_directory(&mut self) -> Result<()> {
        Ok(())
    }

    fn vault_exists(&self) -> bool {
        self.lock().vault.is_some()
    }

    fn load_salt(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.lock().salt.clone())
    }

    fn save_salt(&mut self, salt: &[u8]) -> Result<()> {
        let mut inner = self.lock();
        if inner.salt.is_some() {
            return Err(Error::AlreadyExists("salt".to_string()));
        }
        inner.salt = Some(salt.to_vec());
        Ok(())
    }

    fn discard_salt(&mut self) -> Result<()> {
        let mut inner = self.lock();
        if inner.vault.is_some() {
            return Err(Error::AlreadyExists("vault depends on salt".to_string()));
        }
        inner.salt = None;
        Ok(())
    }

    fn read_vault(&self) -> Result<Vec<u8>> {
        self.lock()
            .vault
            .clone()
            .ok_or_else(|| Error::NotFound("no vault in memory store".to_string()))
    }

    fn write_vault(&mut self, bytes: &[u8]) -> Result<()> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "simulated write failure",
            )));
        }
        inner.backup = inner.vault.take();
        inner.vault = Some(bytes.to_vec());
        inner.bytes_written += bytes.len() as u64;
        Ok(())
    }

    fn read_backup(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.lock().backup.clone())
    }

    fn bytes_written(&self) -> u64 {
        self.lock().bytes_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_storage() {
        let mut a = MemoryStore::new();
        let b = a.clone();

        a.write_vault(b"blob").unwrap();
        assert!(b.vault_exists());
        assert_eq!(b.read_vault().unwrap(), b"blob");
    }

    #[test]
    fn test_backup_and_salt() {
        let mut store = MemoryStore::new();
        store.save_salt(&[7; 32]).unwrap();
        assert!(matches!(store.save_salt(&[8; 32]), Err(Error::AlreadyExists(_))));
        store.discard_salt().unwrap();
        assert_eq!(store.load_salt().unwrap(), None);

        store.write_vault(b"one").unwrap();
        store.write_vault(b"two").unwrap();
        assert_eq!(store.read_backup().unwrap(), Some(b"one".to_vec()));
        assert_eq!(store.bytes_written(), 6);
    }

    #[test]
    fn test_failed_write_leaves_data() {
        let mut store = MemoryStore::new();
        store.write_vault(b"keep").unwrap();

        store.set_fail_writes(true);
        assert!(store.write_vault(b"lost").is_err());
        assert_eq!(store.read_vault().unwrap(), b"keep");

        store.set_fail_writes(false);
        store.write_vault(b"next").unwrap();
        assert_eq!(store.read_vault().unwrap(), b"next");
    }
}
