//! Ranked, typo-tolerant search over vault records.
//!
//! Only non-secret display fields are indexed; see [`SearchField`] for the
//! complete list. The index is rebuilt from the working set on demand and
//! queried without touching the vault.

pub mod distance;
pub mod index;
pub mod normalize;

pub use distance::levenshtein_bounded;
pub use index::{IndexEntry, SearchField, SearchIndex, SearchResult, Searchable, DEFAULT_MAX_RESULTS};
pub use normalize::{normalize, tokenize};
