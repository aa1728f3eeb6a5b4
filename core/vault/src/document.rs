//! Serialized vault document and its schema migrations.
//!
//! The plaintext inside `vault.enc` is a JSON object with a `schema_version`
//! and one array per collection. Older documents are upgraded on load by an
//! ordered chain of migrations; each one is idempotent and runs at most once
//! per load.

use chrono::{DateTime, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::debug;
use zeroize::Zeroizing;

use lockbox_common::{CollectionKind, Error, Result};

use crate::data::VaultData;
use crate::model::{Record, VaultRecord};

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 2;

const VERSION_KEY: &str = "schema_version";

type Migration = fn(&mut Map<String, Value>);

/// Entry `n` upgrades a version `n` document to version `n + 1`.
const MIGRATIONS: &[Migration] = &[upgrade_legacy_layout, stamp_type_tags];

const TIMESTAMP_KEYS: [&str; 2] = ["created_at", "updated_at"];

/// Serialize the working set at the current schema version.
pub fn encode(data: &VaultData) -> Result<Zeroizing<Vec<u8>>> {
    let mut doc = Map::new();
    doc.insert(VERSION_KEY.to_string(), Value::from(SCHEMA_VERSION));
    doc.insert(CollectionKind::Emails.name().to_string(), tagged(&data.emails)?);
    doc.insert(CollectionKind::Phones.name().to_string(), tagged(&data.phones)?);
    doc.insert(CollectionKind::Cards.name().to_string(), tagged(&data.cards)?);
    doc.insert(CollectionKind::Envs.name().to_string(), tagged(&data.envs)?);
    doc.insert(CollectionKind::Recovery.name().to_string(), tagged(&data.recovery)?);
    doc.insert(CollectionKind::Notes.name().to_string(), tagged(&data.notes)?);

    Ok(Zeroizing::new(serde_json::to_vec(&Value::Object(doc))?))
}

fn tagged<R: VaultRecord>(records: &[R]) -> Result<Value> {
    records
        .iter()
        .map(R::to_tagged_value)
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

/// Parse decrypted bytes into a working set, migrating as needed.
///
/// # Errors
/// - `Corrupted` if the bytes are not a vault document, a collection is not a
///   list, a record is malformed or filed under the wrong collection, or the
///   schema version is newer than this build understands
/// - `UnknownVariant` if a record carries an unrecognized type tag
pub fn decode(bytes: &[u8]) -> Result<VaultData> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| Error::Corrupted(format!("vault document is not valid JSON: {}", e)))?;
    let Value::Object(mut doc) = value else {
        return Err(Error::Corrupted("vault document is not an object".to_string()));
    };

    migrate(&mut doc)?;

    let mut data = VaultData::new();
    for kind in CollectionKind::ALL {
        let items = match doc.remove(kind.name()) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::Corrupted(format!(
                    "collection {} is missing or not a list",
                    kind
                )))
            }
        };
        for item in items {
            let record = Record::from_value(item)?;
            if record.kind() != kind {
                return Err(Error::Corrupted(format!(
                    "{} record {} filed under {}",
                    record.kind().tag(),
                    record.id(),
                    kind
                )));
            }
            data.push(record);
        }
    }
    Ok(data)
}

/// Schema version of a raw document; absent means 0.
pub fn schema_version(doc: &Map<String, Value>) -> Result<u32> {
    match doc.get(VERSION_KEY) {
        None => Ok(0),
        Some(value) => value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| Error::Corrupted(format!("invalid schema version: {}", value))),
    }
}

/// Upgrade a raw document to [`SCHEMA_VERSION`] in place.
///
/// Returns the version the document had before migrating.
pub fn migrate(doc: &mut Map<String, Value>) -> Result<u32> {
    let from = schema_version(doc)?;
    if from > SCHEMA_VERSION {
        return Err(Error::Corrupted(format!(
            "schema version {} is newer than supported version {}",
            from, SCHEMA_VERSION
        )));
    }

    for (step, migration) in MIGRATIONS.iter().enumerate().skip(from as usize) {
        migration(doc);
        let to = step as u32 + 1;
        doc.insert(VERSION_KEY.to_string(), Value::from(to));
        debug!(from = step, to, "applied vault schema migration");
    }
    Ok(from)
}

/// v0 -> v1: every collection exists and every timestamp has an offset.
fn upgrade_legacy_layout(doc: &mut Map<String, Value>) {
    add_missing_collections(doc);
    timestamps_as_utc(doc);
}

fn add_missing_collections(doc: &mut Map<String, Value>) {
    for kind in CollectionKind::ALL {
        let slot = doc.entry(kind.name()).or_insert(Value::Null);
        if slot.is_null() {
            *slot = Value::Array(Vec::new());
        }
    }
}

/// Legacy documents hold naive local timestamps; they are read as UTC.
fn timestamps_as_utc(doc: &mut Map<String, Value>) {
    for kind in CollectionKind::ALL {
        let Some(Value::Array(items)) = doc.get_mut(kind.name()) else {
            continue;
        };
        for item in items.iter_mut() {
            let Value::Object(record) = item else {
                continue;
            };
            for key in TIMESTAMP_KEYS {
                if let Some(Value::String(stamp)) = record.get_mut(key) {
                    if let Some(fixed) = naive_as_utc(stamp) {
                        *stamp = fixed;
                    }
                }
            }
        }
    }
}

fn naive_as_utc(stamp: &str) -> Option<String> {
    if DateTime::parse_from_rfc3339(stamp).is_ok() {
        return None;
    }
    stamp
        .parse::<NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc().to_rfc3339())
}

/// v1 -> v2: every record carries its collection's type tag.
fn stamp_type_tags(doc: &mut Map<String, Value>) {
    for kind in CollectionKind::ALL {
        if let Some(Value::Array(items)) = doc.get_mut(kind.name()) {
            for item in items.iter_mut() {
                if let Value::Object(record) = item {
                    record
                        .entry("type")
                        .or_insert_with(|| Value::String(kind.tag().to_string()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EmailCredential, NoteEntry};
    use proptest::prelude::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_migration_chain_covers_every_version() {
        assert_eq!(MIGRATIONS.len(), SCHEMA_VERSION as usize);
    }

    #[test]
    fn test_encode_decode() {
        let mut data = VaultData::new();
        data.emails.push(EmailCredential::new("GitHub", "me@x.io", "pw"));
        data.notes.push(NoteEntry::new("Todo", "milk"));

        let bytes = encode(&data).unwrap();
        let raw: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(raw["schema_version"], SCHEMA_VERSION);
        assert_eq!(raw["emails"][0]["type"], "email");

        assert_eq!(decode(&bytes).unwrap(), data);
    }

    #[test]
    fn test_v0_document_is_upgraded() {
        let legacy = json!({
            "emails": [{
                "id": "abcd1234",
                "label": "GitHub",
                "email": "me@x.io",
                "password": "pw",
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-01T00:00:00Z"
            }],
            "phones": [],
            "cards": []
        });
        let mut doc = as_map(legacy);
        assert_eq!(migrate(&mut doc).unwrap(), 0);
        assert_eq!(schema_version(&doc).unwrap(), SCHEMA_VERSION);
        assert_eq!(doc["notes"], json!([]));
        assert_eq!(doc["emails"][0]["type"], "email");

        let data = decode(&serde_json::to_vec(&doc).unwrap()).unwrap();
        assert_eq!(data.emails[0].id, "abcd1234");
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let mut doc = as_map(json!({
            "emails": [{"label": "x", "created_at": "2024-01-01T12:00:00"}]
        }));
        upgrade_legacy_layout(&mut doc);
        stamp_type_tags(&mut doc);
        let once = doc.clone();
        upgrade_legacy_layout(&mut doc);
        stamp_type_tags(&mut doc);
        assert_eq!(doc, once);
    }

    #[test]
    fn test_legacy_document_with_naive_timestamps() {
        // Record shape as written by the earlier application.
        let legacy = json!({
            "emails": [{
                "type": "email",
                "id": "abcd1234",
                "label": "GitHub",
                "email": "me@x.io",
                "password": "pw",
                "notes": null,
                "created_at": "2024-01-01T12:00:00.123456",
                "updated_at": "2024-03-05T08:30:00"
            }],
            "phones": [],
            "cards": [],
            "envs": [],
            "recovery": []
        });

        let data = decode(&serde_json::to_vec(&legacy).unwrap()).unwrap();
        let email = &data.emails[0];
        assert_eq!(email.id, "abcd1234");
        assert_eq!(email.notes, None);
        assert_eq!(
            email.created_at,
            "2024-01-01T12:00:00.123456Z".parse::<DateTime<chrono::Utc>>().unwrap()
        );
        assert_eq!(
            email.updated_at,
            "2024-03-05T08:30:00Z".parse::<DateTime<chrono::Utc>>().unwrap()
        );
        assert!(data.notes.is_empty());
    }

    #[test]
    fn test_naive_as_utc_leaves_offsets_alone() {
        assert_eq!(naive_as_utc("2024-01-01T00:00:00Z"), None);
        assert_eq!(naive_as_utc("2024-01-01T00:00:00+02:00"), None);
        assert_eq!(naive_as_utc("yesterday"), None);
        assert_eq!(
            naive_as_utc("2024-01-01T00:00:00").as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_newer_schema_rejected() {
        let bytes = serde_json::to_vec(&json!({"schema_version": 99})).unwrap();
        assert!(matches!(decode(&bytes), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_garbage_is_corruption() {
        assert!(matches!(decode(b"not json"), Err(Error::Corrupted(_))));
        assert!(matches!(decode(b"[1, 2]"), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_misfiled_record_is_corruption() {
        let doc = json!({
            "schema_version": SCHEMA_VERSION,
            "emails": [NoteEntry::new("Todo", "milk").to_tagged_value().unwrap()],
            "phones": [], "cards": [], "envs": [], "recovery": [], "notes": []
        });
        let bytes = serde_json::to_vec(&doc).unwrap();
        assert!(matches!(decode(&bytes), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_unknown_variant_surfaces() {
        let doc = json!({
            "schema_version": SCHEMA_VERSION,
            "emails": [], "phones": [], "cards": [], "envs": [], "recovery": [],
            "notes": [{"type": "sticker", "id": "x"}]
        });
        let bytes = serde_json::to_vec(&doc).unwrap();
        assert!(matches!(decode(&bytes), Err(Error::UnknownVariant(_))));
    }

    proptest! {
        #[test]
        fn prop_arbitrary_plaintext_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            match decode(&bytes) {
                Ok(_) | Err(Error::Corrupted(_)) | Err(Error::UnknownVariant(_)) => {}
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }
}
