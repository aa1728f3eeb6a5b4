//! Vault session management.
//!
//! A [`Vault`] is either locked (no key, no records in memory) or unlocked
//! (derived key and decrypted working set held in memory). Every mutation
//! re-encrypts the whole working set and replaces the vault file atomically
//! before returning.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use zeroize::Zeroize;

use lockbox_common::{Error, Result};
use lockbox_crypto::{CryptoManager, Salt};
use lockbox_storage::{BlobStore, VaultPaths, VaultStore};

use crate::data::{CollectionCounts, VaultData};
use crate::document;
use crate::model::{Record, VaultRecord};
use crate::settings::VaultOptions;

enum Session {
    Locked,
    Unlocked {
        crypto: CryptoManager,
        data: VaultData,
    },
}

/// Encrypted credential vault.
///
/// Driven by a single thread; there is no internal locking. Two processes
/// writing the same vault race at the rename and the last writer wins.
pub struct Vault {
    store: Box<dyn BlobStore>,
    options: VaultOptions,
    session: Session,
    last_activity: Instant,
}

impl Vault {
    /// Vault backed by the files in `paths`.
    pub fn open(paths: VaultPaths, options: VaultOptions) -> Self {
        Self::with_store(VaultStore::new(paths), options)
    }

    /// Vault backed by any blob store.
    pub fn with_store(store: impl BlobStore + 'static, options: VaultOptions) -> Self {
        Self {
            store: Box::new(store),
            options,
            session: Session::Locked,
            last_activity: Instant::now(),
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.session, Session::Locked)
    }

    /// Whether a vault has been written to the store.
    pub fn exists(&self) -> bool {
        self.store.vault_exists()
    }

    /// Name of the backing store.
    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Total vault bytes written through this instance's store.
    pub fn bytes_written(&self) -> u64 {
        self.store.bytes_written()
    }

    /// Create a new, empty vault and unlock it.
    ///
    /// # Preconditions
    /// - No vault exists in the store
    ///
    /// # Postconditions
    /// - Salt and an encrypted empty working set are persisted
    /// - The vault is unlocked
    ///
    /// # Errors
    /// - `AlreadyExists` if a vault is already present
    /// - `Io` on storage failure; the vault stays locked
    pub fn create(&mut self, password: &str) -> Result<()> {
        if self.store.vault_exists() {
            return Err(Error::AlreadyExists(
                "a vault already exists; unlock it instead".to_string(),
            ));
        }
        self.lock();
        self.store.ensure_directory()?;

        // A salt without a vault is left over from an interrupted create.
        // No ciphertext depends on it yet, so it is reused, or replaced if
        // it was only partly written.
        let leftover = match self.store.load_salt()? {
            Some(bytes) => match Salt::from_slice(&bytes) {
                Ok(salt) => Some(salt),
                Err(_) => {
                    warn!(len = bytes.len(), "discarding malformed leftover salt");
                    self.store.discard_salt()?;
                    None
                }
            },
            None => None,
        };
        let salt = match leftover {
            Some(salt) => salt,
            None => {
                let salt = Salt::generate();
                self.store.save_salt(salt.as_bytes())?;
                salt
            }
        };

        let crypto = CryptoManager::new(password.as_bytes(), &salt, &self.options.kdf);
        let data = VaultData::new();
        persist(self.store.as_mut(), &crypto, &data)?;

        self.session = Session::Unlocked { crypto, data };
        self.touch();
        info!(store = self.store.name(), "vault created");
        Ok(())
    }

    /// Unlock the vault with the master password.
    ///
    /// Any current session is locked first.
    ///
    /// # Errors
    /// - `NotFound` if no vault exists
    /// - `Corrupted` if the salt is missing or the decrypted document is
    ///   damaged
    /// - `UnknownVariant` if a record has a type tag this build does not know
    /// - `Decryption` on a wrong password or tampered vault file
    ///
    /// The vault stays locked on every error.
    pub fn unlock(&mut self, password: &str) -> Result<()> {
        self.lock();

        if !self.store.vault_exists() {
            return Err(Error::NotFound(
                "no vault found; create one first".to_string(),
            ));
        }
        let salt = self
            .store
            .load_salt()?
            .ok_or_else(|| Error::Corrupted("salt file missing".to_string()))?;
        let salt = Salt::from_slice(&salt)?;
        let blob = self.store.read_vault()?;

        let crypto = CryptoManager::new(password.as_bytes(), &salt, &self.options.kdf);
        let plaintext = match crypto.decrypt(&blob) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!("vault unlock failed authentication");
                return Err(e);
            }
        };
        let data = document::decode(plaintext.as_bytes())?;

        info!(records = data.len(), "vault unlocked");
        self.session = Session::Unlocked { crypto, data };
        self.touch();
        Ok(())
    }

    /// Lock the vault, wiping the key and the working set.
    ///
    /// Calling this on a locked vault does nothing.
    pub fn lock(&mut self) {
        if let Session::Unlocked { mut crypto, mut data } =
            std::mem::replace(&mut self.session, Session::Locked)
        {
            crypto.wipe();
            data.zeroize();
            info!("vault locked");
        }
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// When the vault was last used.
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn lock_timeout(&self) -> Duration {
        self.options.lock_timeout
    }

    /// Set the auto-lock threshold; zero disables auto-lock.
    pub fn set_lock_timeout(&mut self, timeout: Duration) {
        self.options.lock_timeout = timeout;
    }

    /// Whether the inactivity threshold has passed.
    ///
    /// This does not lock; on `true` the caller locks the vault and clears
    /// any cached secrets such as the clipboard.
    pub fn check_timeout(&self) -> bool {
        self.check_timeout_at(Instant::now())
    }

    /// [`Vault::check_timeout`] against an explicit clock reading.
    pub fn check_timeout_at(&self, now: Instant) -> bool {
        let timeout = self.options.lock_timeout;
        if timeout.is_zero() {
            return false;
        }
        now.saturating_duration_since(self.last_activity) > timeout
    }

    fn data(&mut self) -> Result<&VaultData> {
        self.touch();
        match &self.session {
            Session::Unlocked { data, .. } => Ok(data),
            Session::Locked => Err(Error::Locked),
        }
    }

    /// Apply `mutate` to a copy of the working set, persist the copy, then
    /// install it.
    ///
    /// If `mutate` or the persist fails, neither memory nor disk changes.
    fn commit<T>(&mut self, mutate: impl FnOnce(&mut VaultData) -> Result<T>) -> Result<T> {
        self.touch();
        let Session::Unlocked { crypto, data } = &mut self.session else {
            return Err(Error::Locked);
        };

        let mut next = data.clone();
        let outcome = mutate(&mut next)
            .and_then(|value| persist(self.store.as_mut(), crypto, &next).map(|()| value));
        match outcome {
            Ok(value) => {
                let mut previous = std::mem::replace(data, next);
                previous.zeroize();
                Ok(value)
            }
            Err(e) => {
                next.zeroize();
                Err(e)
            }
        }
    }

    /// Add a record and persist.
    ///
    /// # Errors
    /// - `AlreadyExists` if any collection already holds the record's id
    pub fn add<R: VaultRecord>(&mut self, record: R) -> Result<()> {
        self.commit(|data| {
            if data.contains_id(record.id()) {
                return Err(Error::AlreadyExists(format!("record {}", record.id())));
            }
            debug!(kind = %R::KIND, id = record.id(), "adding record");
            R::collection_mut(data).push(record);
            Ok(())
        })
    }

    /// Copy of every record of one kind.
    pub fn get_all<R: VaultRecord>(&mut self) -> Result<Vec<R>> {
        Ok(R::collection(self.data()?).clone())
    }

    /// Copy of the record with `id`, if present.
    pub fn get_by_id<R: VaultRecord>(&mut self, id: &str) -> Result<Option<R>> {
        Ok(R::collection(self.data()?)
            .iter()
            .find(|r| r.id() == id)
            .cloned())
    }

    fn holds<R: VaultRecord>(&mut self, id: &str) -> Result<bool> {
        Ok(R::collection(self.data()?).iter().any(|r| r.id() == id))
    }

    /// Apply `patch` to the record with `id` and persist.
    ///
    /// Returns the updated record, or `None` without writing if no record
    /// has that id.
    pub fn update<R: VaultRecord>(&mut self, id: &str, patch: R::Patch) -> Result<Option<R>> {
        if !self.holds::<R>(id)? {
            return Ok(None);
        }
        self.commit(|data| {
            let record = R::collection_mut(data)
                .iter_mut()
                .find(|r| r.id() == id)
                .ok_or_else(|| Error::NotFound(format!("record {}", id)))?;
            record.apply(patch);
            debug!(kind = %R::KIND, id, "updated record");
            Ok(Some(record.clone()))
        })
    }

    /// Remove the record with `id` and persist.
    ///
    /// Returns `false` without writing if no record has that id.
    pub fn delete<R: VaultRecord>(&mut self, id: &str) -> Result<bool> {
        if !self.holds::<R>(id)? {
            return Ok(false);
        }
        self.commit(|data| {
            let records = R::collection_mut(data);
            if let Some(index) = records.iter().position(|r| r.id() == id) {
                let mut removed = records.remove(index);
                removed.zeroize();
            }
            debug!(kind = %R::KIND, id, "deleted record");
            Ok(true)
        })
    }

    /// Case-insensitive substring match over non-secret display fields.
    ///
    /// Results are unranked, in collection order.
    pub fn search(&mut self, query: &str) -> Result<Vec<Record>> {
        let query = query.to_lowercase();
        let data = self.data()?;

        let mut results = Vec::new();
        collect_matches(&data.emails, &query, &mut results);
        collect_matches(&data.phones, &query, &mut results);
        collect_matches(&data.cards, &query, &mut results);
        collect_matches(&data.envs, &query, &mut results);
        collect_matches(&data.recovery, &query, &mut results);
        collect_matches(&data.notes, &query, &mut results);
        Ok(results)
    }

    /// Record counts per collection.
    pub fn get_stats(&mut self) -> Result<CollectionCounts> {
        Ok(self.data()?.counts())
    }

    /// Copy of the whole working set, for export.
    pub fn get_all_data(&mut self) -> Result<VaultData> {
        Ok(self.data()?.clone())
    }

    /// Import records and persist once.
    ///
    /// With `merge` the incoming records are added to the existing ones,
    /// skipping any whose id is already present in any collection. Without
    /// `merge` the working set is replaced. Returns the number of records
    /// added per collection.
    pub fn import_data(&mut self, incoming: VaultData, merge: bool) -> Result<CollectionCounts> {
        let counts = self
            .commit(|data| {
                if !merge {
                    data.zeroize();
                }
                let mut seen = data.ids();
                Ok(data.merge_new(incoming, &mut seen))
            })
            .map_err(|e| Error::import_export("import failed", e))?;

        info!(added = counts.total(), merge, "vault import complete");
        Ok(counts)
    }
}

impl Drop for Vault {
    fn drop(&mut self) {
        self.lock();
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("store", &self.store.name())
            .field("locked", &self.is_locked())
            .field("options", &self.options)
            .finish()
    }
}

fn persist(store: &mut dyn BlobStore, crypto: &CryptoManager, data: &VaultData) -> Result<()> {
    let plaintext = document::encode(data)?;
    let blob = crypto.encrypt(&plaintext)?;
    store.write_vault(&blob)?;
    debug!(records = data.len(), bytes = blob.len(), "vault persisted");
    Ok(())
}

fn collect_matches<R: VaultRecord>(records: &[R], query: &str, out: &mut Vec<Record>) {
    for record in records {
        if record
            .public_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(query))
        {
            out.push(record.clone().into_record());
        }
    }
}
