//! The index engine boundary.
//!
//! [`IndexAdapter`] is everything the datastore needs from an inverted index.
//! [`InvertedIndex`] is the adapter shipped with the crate: immutable
//! segments, per-segment deletion bitmaps and a manifest that is swapped
//! atomically on every commit.
//!
//! # Module Structure
//!
//! - `segment`: immutable document batches and their postings
//! - `snapshot`: a point-in-time view of the segments and query evaluation
//! - `manifest`: the persisted list of segments
//! - `inverted`: the adapter tying them together

pub mod inverted;
pub mod manifest;
pub mod segment;
pub mod snapshot;

use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

use crate::codec::Document;
use crate::error::Result;
use crate::query::Query;

pub use inverted::{InvertedIndex, InvertedIndexConfig};

/// Name of the primary-key field every stored document carries.
pub const KEY_FIELD: &str = "_key";

/// An indexed `(field, token)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Term {
    pub field: String,
    pub text: String,
}

impl Term {
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        Term {
            field: field.into(),
            text: text.into(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.text)
    }
}

/// A ranked query result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub document: Document,
    pub score: f32,
}

/// The contract the datastore requires from an index engine.
///
/// Every mutating call commits durably before returning. Every read works on
/// a snapshot taken when the call starts: it sees all commits that completed
/// before it and none that complete while it runs.
pub trait IndexAdapter: Send + Sync + Debug {
    /// Replace every document whose [`KEY_FIELD`] equals `key` with
    /// `document`, or insert it. The adapter sets the key field itself.
    fn upsert(&self, key: &str, document: Document) -> Result<()>;

    /// Remove every document with this key. Unknown keys are a no-op.
    fn delete_by_key(&self, key: &str) -> Result<()>;

    /// The first live document with this key.
    fn get_by_key(&self, key: &str) -> Result<Option<Document>>;

    /// Matching documents, best first, at most `max_results`.
    fn query(&self, query: &Query, max_results: usize) -> Result<Vec<SearchHit>>;

    /// All live documents, in no particular order.
    fn scan_all(&self) -> Result<Vec<Document>>;

    /// Every indexed term of the live documents, sorted.
    fn list_terms(&self) -> Result<Vec<Term>>;

    /// Consolidate the index and persist it.
    fn optimize(&self) -> Result<()>;

    /// Release the writer. Later calls fail with `Closed`.
    fn close(&self) -> Result<()>;

    fn is_closed(&self) -> bool;
}
