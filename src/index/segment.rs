//! Immutable segments.
//!
//! A segment is a batch of documents written by one commit (or by a merge).
//! Only the documents are persisted; postings, positions and field lengths
//! are rebuilt when the segment is loaded, using the analyzer recorded on
//! each text field.

use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::codec::{Document, PropertyCodec};
use crate::error::{DocketError, Result};

/// Occurrences of one term in one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub doc: u32,
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn freq(&self) -> usize {
        self.positions.len()
    }
}

/// Term dictionary of one field: term → postings sorted by document.
pub type FieldTerms = BTreeMap<String, Vec<Posting>>;

/// On-disk form of a segment.
#[derive(Debug, Serialize, Deserialize)]
struct SegmentFile {
    id: u64,
    documents: Vec<Document>,
}

/// An immutable batch of indexed documents.
#[derive(Debug)]
pub struct Segment {
    id: u64,
    documents: Vec<Document>,
    terms: AHashMap<String, FieldTerms>,
    /// Token count of each field, per document ordinal.
    field_lengths: AHashMap<String, Vec<u32>>,
}

impl Segment {
    /// Index `documents` into a new segment.
    pub fn build(id: u64, documents: Vec<Document>) -> Result<Self> {
        let doc_count = u32::try_from(documents.len()).map_err(|_| {
            DocketError::index(format!(
                "segment {id} would hold {} documents",
                documents.len()
            ))
        })?;

        let mut terms: AHashMap<String, FieldTerms> = AHashMap::new();
        let mut field_lengths: AHashMap<String, Vec<u32>> = AHashMap::new();

        for (ordinal, doc) in (0..doc_count).zip(documents.iter()) {
            for field in doc.fields() {
                let tokens = PropertyCodec::index_tokens(field)?;

                field_lengths
                    .entry(field.name.clone())
                    .or_insert_with(|| vec![0; documents.len()])[ordinal as usize] =
                    tokens.len() as u32;

                let field_terms = terms.entry(field.name.clone()).or_default();
                for token in tokens {
                    let postings = field_terms.entry(token.text).or_default();
                    match postings.last_mut() {
                        Some(last) if last.doc == ordinal => {
                            last.positions.push(token.position as u32)
                        }
                        _ => postings.push(Posting {
                            doc: ordinal,
                            positions: vec![token.position as u32],
                        }),
                    }
                }
            }
        }

        Ok(Self {
            id,
            documents,
            terms,
            field_lengths,
        })
    }

    /// Decode a persisted segment and rebuild its postings.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let file: SegmentFile = serde_json::from_slice(bytes)?;
        Self::build(file.id, file.documents)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct SegmentFileRef<'a> {
            id: u64,
            documents: &'a [Document],
        }
        Ok(serde_json::to_vec(&SegmentFileRef {
            id: self.id,
            documents: &self.documents,
        })?)
    }

    pub fn file_name(id: u64) -> String {
        format!("seg_{id:06}.json")
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    pub fn document(&self, ordinal: u32) -> Option<&Document> {
        self.documents.get(ordinal as usize)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn field_terms(&self, field: &str) -> Option<&FieldTerms> {
        self.terms.get(field)
    }

    pub fn postings(&self, field: &str, term: &str) -> &[Posting] {
        self.terms
            .get(field)
            .and_then(|terms| terms.get(term))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of tokens `field` has in document `ordinal` (0 if absent).
    pub fn field_length(&self, field: &str, ordinal: u32) -> u32 {
        self.field_lengths
            .get(field)
            .and_then(|lengths| lengths.get(ordinal as usize))
            .copied()
            .unwrap_or(0)
    }

    /// Iterate `(field, terms)` pairs.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldTerms)> {
        self.terms.iter().map(|(field, terms)| (field.as_str(), terms))
    }
}
