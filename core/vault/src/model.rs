//! Credential record types.
//!
//! Six record kinds share one shape: an immutable `id` and `created_at`, an
//! `updated_at` refreshed on every update, and kind-specific fields. On disk
//! every record carries a `"type"` tag naming its kind, and [`Record`] is the
//! closed union over all six.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::Zeroize;

use lockbox_common::{new_record_id, CollectionKind, Error, Result};

use crate::data::VaultData;

/// Number of characters of a note's body treated as displayable.
pub const CONTENT_PREVIEW_CHARS: usize = 50;

/// Behaviour shared by the six record kinds.
///
/// The vault's CRUD operations are generic over this trait; each
/// implementation knows which collection of a [`VaultData`] holds it.
pub trait VaultRecord: Clone + Serialize + Zeroize + fmt::Debug {
    /// Collection holding records of this kind.
    const KIND: CollectionKind;

    /// Partial update accepted by [`VaultRecord::apply`].
    type Patch;

    fn id(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;

    /// Apply the `Some` fields of `patch` and refresh `updated_at`.
    ///
    /// `id` and `created_at` are not patchable.
    fn apply(&mut self, patch: Self::Patch);

    /// Non-secret display fields, for substring search.
    fn public_fields(&self) -> Vec<&str>;

    fn collection(data: &VaultData) -> &Vec<Self>;

    fn collection_mut(data: &mut VaultData) -> &mut Vec<Self>;

    fn into_record(self) -> Record;

    /// Serialize with the `"type"` tag attached.
    fn to_tagged_value(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.insert("type".to_string(), Value::String(Self::KIND.tag().to_string()));
        }
        Ok(value)
    }
}

macro_rules! vault_record {
    (
        $ty:ident, $patch:ident, $kind:ident, $variant:ident, $field:ident,
        patch = [$($f:ident),*],
        public = |$r:ident| [$($pf:expr),*]
    ) => {
        impl VaultRecord for $ty {
            const KIND: CollectionKind = CollectionKind::$kind;
            type Patch = $patch;

            fn id(&self) -> &str {
                &self.id
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }

            fn updated_at(&self) -> DateTime<Utc> {
                self.updated_at
            }

            fn apply(&mut self, patch: $patch) {
                $(
                    if let Some(value) = patch.$f {
                        self.$f.zeroize();
                        self.$f = value;
                    }
                )*
                if let Some(notes) = patch.notes {
                    self.notes.zeroize();
                    self.notes = notes;
                }
                self.updated_at = Utc::now();
            }

            fn public_fields(&self) -> Vec<&str> {
                let $r = self;
                let mut fields = vec![$($pf),*];
                if let Some(notes) = &self.notes {
                    fields.push(notes.as_str());
                }
                fields
            }

            fn collection(data: &VaultData) -> &Vec<Self> {
                &data.$field
            }

            fn collection_mut(data: &mut VaultData) -> &mut Vec<Self> {
                &mut data.$field
            }

            fn into_record(self) -> Record {
                Record::$variant(self)
            }
        }

        // Field values never reach logs.
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("id", &self.id)
                    .finish_non_exhaustive()
            }
        }
    };
}

/// Email or username with a password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct EmailCredential {
    #[serde(default = "new_record_id")]
    pub id: String,
    pub label: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    #[zeroize(skip)]
    pub updated_at: DateTime<Utc>,
}

impl EmailCredential {
    pub fn new(
        label: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_record_id(),
            label: label.into(),
            email: email.into(),
            password: password.into(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Partial update for [`EmailCredential`].
#[derive(Clone, Default)]
pub struct EmailPatch {
    pub label: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// `Some(None)` clears the notes.
    pub notes: Option<Option<String>>,
}

vault_record!(
    EmailCredential, EmailPatch, Emails, Email, emails,
    patch = [label, email, password],
    public = |r| [r.label.as_str(), r.email.as_str()]
);

/// Phone number with its PIN or password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct PhoneCredential {
    #[serde(default = "new_record_id")]
    pub id: String,
    pub label: String,
    pub phone: String,
    pub password: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    #[zeroize(skip)]
    pub updated_at: DateTime<Utc>,
}

impl PhoneCredential {
    pub fn new(
        label: impl Into<String>,
        phone: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_record_id(),
            label: label.into(),
            phone: phone.into(),
            password: password.into(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Clone, Default)]
pub struct PhonePatch {
    pub label: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub notes: Option<Option<String>>,
}

vault_record!(
    PhoneCredential, PhonePatch, Phones, Phone, phones,
    patch = [label, phone, password],
    public = |r| [r.label.as_str(), r.phone.as_str()]
);

/// Payment card.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct CreditCard {
    #[serde(default = "new_record_id")]
    pub id: String,
    pub label: String,
    pub card_number: String,
    /// `MM/YY`.
    pub expiry: String,
    pub cvv: String,
    pub cardholder_name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    #[zeroize(skip)]
    pub updated_at: DateTime<Utc>,
}

impl CreditCard {
    pub fn new(
        label: impl Into<String>,
        card_number: impl Into<String>,
        expiry: impl Into<String>,
        cvv: impl Into<String>,
        cardholder_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_record_id(),
            label: label.into(),
            card_number: card_number.into(),
            expiry: expiry.into(),
            cvv: cvv.into(),
            cardholder_name: cardholder_name.into(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Card number with everything but the last four digits hidden.
    ///
    /// Non-digit characters are ignored. With fewer than four digits every
    /// digit is hidden.
    pub fn masked_number(&self) -> String {
        let digits: Vec<char> = self.card_number.chars().filter(char::is_ascii_digit).collect();
        if digits.len() < 4 {
            return "•".repeat(digits.len());
        }
        let last_four: String = digits[digits.len() - 4..].iter().collect();
        format!("•••• •••• •••• {}", last_four)
    }
}

#[derive(Clone, Default)]
pub struct CardPatch {
    pub label: Option<String>,
    pub card_number: Option<String>,
    pub expiry: Option<String>,
    pub cvv: Option<String>,
    pub cardholder_name: Option<String>,
    pub notes: Option<Option<String>>,
}

vault_record!(
    CreditCard, CardPatch, Cards, Card, cards,
    patch = [label, card_number, expiry, cvv, cardholder_name],
    public = |r| [r.label.as_str(), r.cardholder_name.as_str()]
);

/// Environment file such as a `.env`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct EnvEntry {
    #[serde(default = "new_record_id")]
    pub id: String,
    pub title: String,
    pub filename: String,
    pub content: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    #[zeroize(skip)]
    pub updated_at: DateTime<Utc>,
}

impl EnvEntry {
    pub fn new(
        title: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_record_id(),
            title: title.into(),
            filename: filename.into(),
            content: content.into(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Number of lines in the file body.
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

#[derive(Clone, Default)]
pub struct EnvPatch {
    pub title: Option<String>,
    pub filename: Option<String>,
    pub content: Option<String>,
    pub notes: Option<Option<String>>,
}

vault_record!(
    EnvEntry, EnvPatch, Envs, Env, envs,
    patch = [title, filename, content],
    public = |r| [r.title.as_str(), r.filename.as_str()]
);

/// Recovery codes or seed phrase.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct RecoveryEntry {
    #[serde(default = "new_record_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    #[zeroize(skip)]
    pub updated_at: DateTime<Utc>,
}

impl RecoveryEntry {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_record_id(),
            title: title.into(),
            content: content.into(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Clone, Default)]
pub struct RecoveryPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub notes: Option<Option<String>>,
}

vault_record!(
    RecoveryEntry, RecoveryPatch, Recovery, Recovery, recovery,
    patch = [title, content],
    public = |r| [r.title.as_str()]
);

/// Free-form secure note.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct NoteEntry {
    #[serde(default = "new_record_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    #[zeroize(skip)]
    pub updated_at: DateTime<Utc>,
}

impl NoteEntry {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_record_id(),
            title: title.into(),
            content: content.into(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Leading part of the body shown in listings.
    pub fn preview(&self) -> &str {
        preview(&self.content)
    }
}

#[derive(Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub notes: Option<Option<String>>,
}

vault_record!(
    NoteEntry, NotePatch, Notes, Note, notes,
    patch = [title, content],
    public = |r| [r.title.as_str(), r.preview()]
);

fn preview(content: &str) -> &str {
    match content.char_indices().nth(CONTENT_PREVIEW_CHARS) {
        Some((end, _)) => &content[..end],
        None => content,
    }
}

/// Any record, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    Email(EmailCredential),
    Phone(PhoneCredential),
    Card(CreditCard),
    Env(EnvEntry),
    Recovery(RecoveryEntry),
    Note(NoteEntry),
}

impl Record {
    /// Collection this record belongs to.
    pub fn kind(&self) -> CollectionKind {
        match self {
            Record::Email(_) => CollectionKind::Emails,
            Record::Phone(_) => CollectionKind::Phones,
            Record::Card(_) => CollectionKind::Cards,
            Record::Env(_) => CollectionKind::Envs,
            Record::Recovery(_) => CollectionKind::Recovery,
            Record::Note(_) => CollectionKind::Notes,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Record::Email(r) => r.id(),
            Record::Phone(r) => r.id(),
            Record::Card(r) => r.id(),
            Record::Env(r) => r.id(),
            Record::Recovery(r) => r.id(),
            Record::Note(r) => r.id(),
        }
    }

    /// Decode a tagged record.
    ///
    /// # Errors
    /// - `UnknownVariant` if the `"type"` tag names no known kind
    /// - `Corrupted` if the tag is missing or the fields do not fit the kind
    pub fn from_value(value: Value) -> Result<Self> {
        let tag = match value.get("type") {
            Some(Value::String(tag)) => tag.clone(),
            Some(_) => return Err(Error::Corrupted("record type tag is not a string".to_string())),
            None => return Err(Error::Corrupted("record has no type tag".to_string())),
        };
        if CollectionKind::from_tag(&tag).is_none() {
            return Err(Error::UnknownVariant(tag));
        }
        serde_json::from_value(value)
            .map_err(|e| Error::Corrupted(format!("malformed {} record: {}", tag, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_patch_keeps_identity() {
        let mut cred = EmailCredential::new("GitHub", "me@example.com", "hunter2");
        let id = cred.id.clone();
        let created = cred.created_at;
        let before = cred.updated_at;

        cred.apply(EmailPatch {
            password: Some("correct horse".to_string()),
            notes: Some(Some("rotated".to_string())),
            ..Default::default()
        });

        assert_eq!(cred.id, id);
        assert_eq!(cred.created_at, created);
        assert!(cred.updated_at >= before);
        assert_eq!(cred.label, "GitHub");
        assert_eq!(cred.password, "correct horse");
        assert_eq!(cred.notes.as_deref(), Some("rotated"));

        cred.apply(EmailPatch {
            notes: Some(None),
            ..Default::default()
        });
        assert_eq!(cred.notes, None);
    }

    #[test]
    fn test_masked_number() {
        let card = CreditCard::new("Visa", "4111 1111 1111 1234", "01/30", "123", "A B");
        assert_eq!(card.masked_number(), "•••• •••• •••• 1234");

        let short = CreditCard::new("Odd", "12", "01/30", "123", "A B");
        assert_eq!(short.masked_number(), "••");
    }

    #[test]
    fn test_public_fields_exclude_secrets() {
        let card = CreditCard::new("Visa", "4111111111111234", "01/30", "987", "Ada Lovelace")
            .with_notes("travel");
        let fields = card.public_fields();
        assert_eq!(fields, vec!["Visa", "Ada Lovelace", "travel"]);

        let email = EmailCredential::new("GitHub", "me@example.com", "s3cret");
        assert!(!email.public_fields().contains(&"s3cret"));
    }

    #[test]
    fn test_note_preview_truncates_on_char_boundary() {
        let body = "é".repeat(80);
        let note = NoteEntry::new("Diary", body);
        assert_eq!(note.preview().chars().count(), CONTENT_PREVIEW_CHARS);
    }

    #[test]
    fn test_record_tagging() {
        let phone = PhoneCredential::new("Bank", "+1 555 0100", "4321");
        let value = phone.to_tagged_value().unwrap();
        assert_eq!(value["type"], "phone");

        let record = Record::from_value(value).unwrap();
        assert_eq!(record.kind(), CollectionKind::Phones);
        assert_eq!(record, Record::Phone(phone));
    }

    #[test]
    fn test_unknown_tag_fails_closed() {
        let value = json!({"type": "passkey", "id": "abcd1234", "title": "x"});
        assert!(matches!(
            Record::from_value(value),
            Err(Error::UnknownVariant(tag)) if tag == "passkey"
        ));
    }

    #[test]
    fn test_missing_fields_are_corruption() {
        let value = json!({"type": "card", "id": "abcd1234", "label": "Visa"});
        assert!(matches!(Record::from_value(value), Err(Error::Corrupted(_))));

        let untagged = json!({"id": "abcd1234", "label": "Visa"});
        assert!(matches!(Record::from_value(untagged), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_debug_hides_fields() {
        let cred = EmailCredential::new("GitHub", "me@example.com", "hunter2");
        let shown = format!("{:?}", cred);
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains(&cred.id));
    }
}
