//! Ranked search index over non-secret record fields.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use lockbox_common::CollectionKind;
use lockbox_vault::{
    CreditCard, EmailCredential, EnvEntry, NoteEntry, PhoneCredential, RecoveryEntry, VaultData,
    VaultRecord,
};

use crate::distance::levenshtein_bounded;
use crate::normalize::{normalize, tokenize};

/// Default cap on returned results.
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Largest edit distance accepted by the typo rule.
pub const MAX_EDIT_DISTANCE: usize = 2;

/// Shortest query, and shortest entry token, the typo rule applies to.
pub const MIN_FUZZY_LEN: usize = 3;

/// A field the index may read.
///
/// There is no variant for passwords, PINs, CVVs, card numbers or file and
/// recovery contents, so those can never be indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    Label,
    Email,
    Phone,
    CardholderName,
    Title,
    Filename,
    Notes,
}

impl SearchField {
    pub fn name(&self) -> &'static str {
        match self {
            SearchField::Label => "label",
            SearchField::Email => "email",
            SearchField::Phone => "phone",
            SearchField::CardholderName => "cardholder_name",
            SearchField::Title => "title",
            SearchField::Filename => "filename",
            SearchField::Notes => "notes",
        }
    }
}

/// Per-kind allow-list of indexable fields.
pub trait Searchable: VaultRecord {
    /// Main display field; matches here score higher.
    const PRIMARY: SearchField;
    /// Context shown next to the primary text.
    const SECONDARY: Option<SearchField>;
    /// Every field that is indexed.
    const FIELDS: &'static [SearchField];

    /// Value of an allow-listed field; `None` for fields this kind lacks.
    fn field(&self, field: SearchField) -> Option<&str>;
}

impl Searchable for EmailCredential {
    const PRIMARY: SearchField = SearchField::Label;
    const SECONDARY: Option<SearchField> = Some(SearchField::Email);
    const FIELDS: &'static [SearchField] = &[SearchField::Label, SearchField::Email, SearchField::Notes];

    fn field(&self, field: SearchField) -> Option<&str> {
        match field {
            SearchField::Label => Some(&self.label),
            SearchField::Email => Some(&self.email),
            SearchField::Notes => self.notes.as_deref(),
            _ => None,
        }
    }
}

impl Searchable for PhoneCredential {
    const PRIMARY: SearchField = SearchField::Label;
    const SECONDARY: Option<SearchField> = Some(SearchField::Phone);
    const FIELDS: &'static [SearchField] = &[SearchField::Label, SearchField::Phone, SearchField::Notes];

    fn field(&self, field: SearchField) -> Option<&str> {
        match field {
            SearchField::Label => Some(&self.label),
            SearchField::Phone => Some(&self.phone),
            SearchField::Notes => self.notes.as_deref(),
            _ => None,
        }
    }
}

impl Searchable for CreditCard {
    const PRIMARY: SearchField = SearchField::Label;
    const SECONDARY: Option<SearchField> = Some(SearchField::CardholderName);
    const FIELDS: &'static [SearchField] = &[
        SearchField::Label,
        SearchField::CardholderName,
        SearchField::Notes,
    ];

    fn field(&self, field: SearchField) -> Option<&str> {
        match field {
            SearchField::Label => Some(&self.label),
            SearchField::CardholderName => Some(&self.cardholder_name),
            SearchField::Notes => self.notes.as_deref(),
            _ => None,
        }
    }
}

impl Searchable for EnvEntry {
    const PRIMARY: SearchField = SearchField::Title;
    const SECONDARY: Option<SearchField> = Some(SearchField::Filename);
    const FIELDS: &'static [SearchField] = &[SearchField::Title, SearchField::Filename, SearchField::Notes];

    fn field(&self, field: SearchField) -> Option<&str> {
        match field {
            SearchField::Title => Some(&self.title),
            SearchField::Filename => Some(&self.filename),
            SearchField::Notes => self.notes.as_deref(),
            _ => None,
        }
    }
}

impl Searchable for RecoveryEntry {
    const PRIMARY: SearchField = SearchField::Title;
    const SECONDARY: Option<SearchField> = None;
    const FIELDS: &'static [SearchField] = &[SearchField::Title, SearchField::Notes];

    fn field(&self, field: SearchField) -> Option<&str> {
        match field {
            SearchField::Title => Some(&self.title),
            SearchField::Notes => self.notes.as_deref(),
            _ => None,
        }
    }
}

impl Searchable for NoteEntry {
    const PRIMARY: SearchField = SearchField::Title;
    const SECONDARY: Option<SearchField> = None;
    const FIELDS: &'static [SearchField] = &[SearchField::Title, SearchField::Notes];

    fn field(&self, field: SearchField) -> Option<&str> {
        match field {
            SearchField::Title => Some(&self.title),
            SearchField::Notes => self.notes.as_deref(),
            _ => None,
        }
    }
}

/// One indexed (record, field) pair.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    kind: CollectionKind,
    record_id: String,
    field: SearchField,
    is_primary: bool,
    normalized: String,
    normalized_len: usize,
    tokens: Vec<String>,
    primary_text: String,
    secondary_text: Option<String>,
}

impl IndexEntry {
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn field(&self) -> SearchField {
        self.field
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Score this entry against a prepared query; 0 means no match.
    ///
    /// Rules are tried in order and the first that matches decides:
    /// prefix, substring, all-tokens, then bounded edit distance.
    fn score(&self, query: &Query) -> f64 {
        if self.normalized.starts_with(&query.text) {
            let base = if self.is_primary { 100.0 } else { 80.0 };
            let ratio = query.len as f64 / self.normalized_len.max(1) as f64;
            return base + ratio * 10.0;
        }

        if let Some(byte_pos) = self.normalized.find(&query.text) {
            let base = if self.is_primary { 60.0 } else { 40.0 };
            let pos = self.normalized[..byte_pos].chars().count();
            return base + 10usize.saturating_sub(pos) as f64;
        }

        // A substring test covers both "prefix of" and "inside" a token.
        if !query.tokens.is_empty()
            && query
                .tokens
                .iter()
                .all(|qt| self.tokens.iter().any(|et| et.contains(qt.as_str())))
        {
            return if self.is_primary { 30.0 } else { 25.0 };
        }

        if query.len >= MIN_FUZZY_LEN {
            for token in &self.tokens {
                if token.chars().count() < MIN_FUZZY_LEN {
                    continue;
                }
                if let Some(distance) = levenshtein_bounded(&query.text, token, MAX_EDIT_DISTANCE) {
                    return 20.0 - 5.0 * distance as f64;
                }
            }
        }

        0.0
    }
}

struct Query {
    text: String,
    len: usize,
    tokens: Vec<String>,
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub kind: CollectionKind,
    pub record_id: String,
    pub score: f64,
    pub primary_text: String,
    pub secondary_text: Option<String>,
    /// Field of the best-scoring entry.
    pub matched_field: SearchField,
}

/// In-memory search index.
///
/// Rebuilt wholesale with [`SearchIndex::build_index`] whenever the working
/// set changes; there is no incremental update.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index built from `data`.
    pub fn from_data(data: &VaultData) -> Self {
        let mut index = Self::new();
        index.build_index(data);
        index
    }

    /// Replace the index contents with entries for every record in `data`.
    pub fn build_index(&mut self, data: &VaultData) {
        self.entries.clear();
        self.index_records(&data.emails);
        self.index_records(&data.phones);
        self.index_records(&data.cards);
        self.index_records(&data.envs);
        self.index_records(&data.recovery);
        self.index_records(&data.notes);
        debug!(entries = self.entries.len(), "search index built");
    }

    fn index_records<R: Searchable>(&mut self, records: &[R]) {
        for record in records {
            let primary_text = record.field(R::PRIMARY).unwrap_or_default().to_string();
            let secondary_text = R::SECONDARY
                .and_then(|field| record.field(field))
                .map(str::to_string);

            for &field in R::FIELDS {
                let Some(value) = record.field(field).filter(|v| !v.is_empty()) else {
                    continue;
                };
                let normalized = normalize(value);
                let tokens = tokenize(&normalized);
                self.entries.push(IndexEntry {
                    kind: R::KIND,
                    record_id: record.id().to_string(),
                    field,
                    is_primary: field == R::PRIMARY,
                    normalized_len: normalized.chars().count(),
                    normalized,
                    tokens,
                    primary_text: primary_text.clone(),
                    secondary_text: secondary_text.clone(),
                });
            }
        }
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ranked search.
    ///
    /// Each record appears at most once, with its best entry's score.
    /// Results are ordered by descending score, then by case-insensitive
    /// primary text, and cut to `max_results`. A blank query returns nothing.
    pub fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        let text = normalize(query);
        if text.is_empty() {
            return Vec::new();
        }
        let query = Query {
            len: text.chars().count(),
            tokens: tokenize(&text),
            text,
        };

        let mut best: HashMap<&str, SearchResult> = HashMap::new();
        for entry in &self.entries {
            let score = entry.score(&query);
            if score <= 0.0 {
                continue;
            }
            let better = best
                .get(entry.record_id.as_str())
                .map_or(true, |current| score > current.score);
            if better {
                best.insert(
                    &entry.record_id,
                    SearchResult {
                        kind: entry.kind,
                        record_id: entry.record_id.clone(),
                        score,
                        primary_text: entry.primary_text.clone(),
                        secondary_text: entry.secondary_text.clone(),
                        matched_field: entry.field,
                    },
                );
            }
        }

        let mut results: Vec<SearchResult> = best.into_values().collect();
        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.primary_text.to_lowercase().cmp(&b.primary_text.to_lowercase()))
        });
        results.truncate(max_results);
        results
    }
}
