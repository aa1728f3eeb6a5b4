//! Blob store trait definition.

use lockbox_common::Result;

/// Storage for one vault: its salt and its encrypted blob.
///
/// Implementations must make [`BlobStore::write_vault`] all-or-nothing: after
/// an error the previously stored blob is still readable, byte for byte.
pub trait BlobStore: Send {
    /// Get the store name (e.g., "file", "memory").
    fn name(&self) -> &str;

    /// Create the backing location if absent and restrict it to the owner.
    fn ensure_directory(&mut self) -> Result<()>;

    /// Whether a vault blob has been written.
    fn vault_exists(&self) -> bool;

    /// Read the salt, `None` if it was never written.
    fn load_salt(&self) -> Result<Option<Vec<u8>>>;

    /// Persist the salt.
    ///
    /// # Errors
    /// - `AlreadyExists` if a salt is already stored; the salt is write-once
    fn save_salt(&mut self, salt: &[u8]) -> Result<()>;

    /// Remove a stored salt. Only valid while no vault blob depends on it.
    ///
    /// # Errors
    /// - `AlreadyExists` if a vault blob is stored
    fn discard_salt(&mut self) -> Result<()>;

    /// Read the encrypted blob.
    ///
    /// # Errors
    /// - `NotFound` if no blob exists
    fn read_vault(&self) -> Result<Vec<u8>>;

    /// Replace the encrypted blob, keeping the previous one as the backup.
    fn write_vault(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read the single-generation backup, if any.
    fn read_backup(&self) -> Result<Option<Vec<u8>>>;

    /// Total blob bytes written through this store instance.
    fn bytes_written(&self) -> u64;
}
