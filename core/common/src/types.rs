//! Common types used throughout Lockbox.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use zeroize::Zeroize;

/// Length of generated record identifiers.
pub const RECORD_ID_LEN: usize = 8;

/// Generate a fresh record identifier.
///
/// Identifiers are the first eight hex characters of a random UUID. They are
/// short enough to type, and the vault rejects an insert whose id is already
/// present so collisions never go unnoticed.
pub fn new_record_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(RECORD_ID_LEN);
    id
}

/// The six record collections held by a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Emails,
    Phones,
    Cards,
    Envs,
    Recovery,
    Notes,
}

impl CollectionKind {
    /// All collections in document order.
    pub const ALL: [CollectionKind; 6] = [
        CollectionKind::Emails,
        CollectionKind::Phones,
        CollectionKind::Cards,
        CollectionKind::Envs,
        CollectionKind::Recovery,
        CollectionKind::Notes,
    ];

    /// Key of this collection in the serialized document.
    pub fn name(&self) -> &'static str {
        match self {
            CollectionKind::Emails => "emails",
            CollectionKind::Phones => "phones",
            CollectionKind::Cards => "cards",
            CollectionKind::Envs => "envs",
            CollectionKind::Recovery => "recovery",
            CollectionKind::Notes => "notes",
        }
    }

    /// Record type tag stored on every record of this collection.
    pub fn tag(&self) -> &'static str {
        match self {
            CollectionKind::Emails => "email",
            CollectionKind::Phones => "phone",
            CollectionKind::Cards => "card",
            CollectionKind::Envs => "env",
            CollectionKind::Recovery => "recovery",
            CollectionKind::Notes => "note",
        }
    }

    /// Resolve a record type tag back to its collection.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sensitive data wrapper that zeroizes on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SensitiveBytes(Vec<u8>);

impl SensitiveBytes {
    /// Create new sensitive bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    /// Get a reference to the inner bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SensitiveBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveBytes([REDACTED; {} bytes])", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_shape() {
        let id = new_record_id();
        assert_eq!(id.len(), RECORD_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_record_ids_differ() {
        assert_ne!(new_record_id(), new_record_id());
    }

    #[test]
    fn test_tag_roundtrip() {
        for kind in CollectionKind::ALL {
            assert_eq!(CollectionKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(CollectionKind::from_tag("password"), None);
    }

    #[test]
    fn test_sensitive_bytes_debug_redacts() {
        let bytes = SensitiveBytes::new(b"hunter2".to_vec());
        assert_eq!(format!("{:?}", bytes), "SensitiveBytes([REDACTED; 7 bytes])");
    }
}
