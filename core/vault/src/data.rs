//! The working set: all six record collections of an unlocked vault.

use std::collections::HashSet;

use serde::Serialize;
use zeroize::Zeroize;

use lockbox_common::CollectionKind;

use crate::model::{
    CreditCard, EmailCredential, EnvEntry, NoteEntry, PhoneCredential, Record, RecoveryEntry,
    VaultRecord,
};

/// Decrypted contents of a vault.
///
/// Also the unit of export and import: [`crate::Vault::get_all_data`] returns
/// one and [`crate::Vault::import_data`] consumes one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultData {
    pub emails: Vec<EmailCredential>,
    pub phones: Vec<PhoneCredential>,
    pub cards: Vec<CreditCard>,
    pub envs: Vec<EnvEntry>,
    pub recovery: Vec<RecoveryEntry>,
    pub notes: Vec<NoteEntry>,
}

impl VaultData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in one collection.
    pub fn count(&self, kind: CollectionKind) -> usize {
        match kind {
            CollectionKind::Emails => self.emails.len(),
            CollectionKind::Phones => self.phones.len(),
            CollectionKind::Cards => self.cards.len(),
            CollectionKind::Envs => self.envs.len(),
            CollectionKind::Recovery => self.recovery.len(),
            CollectionKind::Notes => self.notes.len(),
        }
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        CollectionKind::ALL.iter().map(|&kind| self.count(kind)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids across all six collections.
    pub fn ids(&self) -> HashSet<String> {
        let mut ids = HashSet::with_capacity(self.len());
        collect_ids(&self.emails, &mut ids);
        collect_ids(&self.phones, &mut ids);
        collect_ids(&self.cards, &mut ids);
        collect_ids(&self.envs, &mut ids);
        collect_ids(&self.recovery, &mut ids);
        collect_ids(&self.notes, &mut ids);
        ids
    }

    /// Whether any collection holds a record with this id.
    pub fn contains_id(&self, id: &str) -> bool {
        has_id(&self.emails, id)
            || has_id(&self.phones, id)
            || has_id(&self.cards, id)
            || has_id(&self.envs, id)
            || has_id(&self.recovery, id)
            || has_id(&self.notes, id)
    }

    /// Append a record to the collection matching its kind.
    pub fn push(&mut self, record: Record) {
        match record {
            Record::Email(r) => self.emails.push(r),
            Record::Phone(r) => self.phones.push(r),
            Record::Card(r) => self.cards.push(r),
            Record::Env(r) => self.envs.push(r),
            Record::Recovery(r) => self.recovery.push(r),
            Record::Note(r) => self.notes.push(r),
        }
    }

    /// Per-collection record counts.
    pub fn counts(&self) -> CollectionCounts {
        CollectionCounts {
            emails: self.emails.len(),
            phones: self.phones.len(),
            cards: self.cards.len(),
            envs: self.envs.len(),
            recovery: self.recovery.len(),
            notes: self.notes.len(),
        }
    }

    /// Append the records of `incoming` whose ids are not in `seen`.
    ///
    /// Every appended id is added to `seen`, so duplicates inside `incoming`
    /// are dropped too. Returns how many records were appended per collection.
    pub fn merge_new(&mut self, incoming: VaultData, seen: &mut HashSet<String>) -> CollectionCounts {
        let VaultData {
            emails,
            phones,
            cards,
            envs,
            recovery,
            notes,
        } = incoming;

        CollectionCounts {
            emails: append_new(&mut self.emails, emails, seen),
            phones: append_new(&mut self.phones, phones, seen),
            cards: append_new(&mut self.cards, cards, seen),
            envs: append_new(&mut self.envs, envs, seen),
            recovery: append_new(&mut self.recovery, recovery, seen),
            notes: append_new(&mut self.notes, notes, seen),
        }
    }
}

impl Zeroize for VaultData {
    fn zeroize(&mut self) {
        self.emails.zeroize();
        self.phones.zeroize();
        self.cards.zeroize();
        self.envs.zeroize();
        self.recovery.zeroize();
        self.notes.zeroize();
    }
}

fn collect_ids<R: VaultRecord>(records: &[R], ids: &mut HashSet<String>) {
    ids.extend(records.iter().map(|r| r.id().to_string()));
}

fn has_id<R: VaultRecord>(records: &[R], id: &str) -> bool {
    records.iter().any(|r| r.id() == id)
}

fn append_new<R: VaultRecord>(
    target: &mut Vec<R>,
    incoming: Vec<R>,
    seen: &mut HashSet<String>,
) -> usize {
    let mut added = 0;
    for mut record in incoming {
        if seen.insert(record.id().to_string()) {
            target.push(record);
            added += 1;
        } else {
            record.zeroize();
        }
    }
    added
}

/// Record counts per collection.
///
/// Returned by [`crate::Vault::get_stats`] and, as the number of records
/// added, by [`crate::Vault::import_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionCounts {
    pub emails: usize,
    pub phones: usize,
    pub cards: usize,
    pub envs: usize,
    pub recovery: usize,
    pub notes: usize,
}

impl CollectionCounts {
    pub fn get(&self, kind: CollectionKind) -> usize {
        match kind {
            CollectionKind::Emails => self.emails,
            CollectionKind::Phones => self.phones,
            CollectionKind::Cards => self.cards,
            CollectionKind::Envs => self.envs,
            CollectionKind::Recovery => self.recovery,
            CollectionKind::Notes => self.notes,
        }
    }

    pub fn total(&self) -> usize {
        CollectionKind::ALL.iter().map(|&kind| self.get(kind)).sum()
    }
}
