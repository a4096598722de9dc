//! Point-in-time views of the index and query evaluation over them.
//!
//! An [`IndexSnapshot`] is immutable. Writers build a new one and swap it in;
//! readers clone the `Arc` of the current one and work on it without locks.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::Bound;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use bit_vec::BitVec;

use crate::codec::Document;
use crate::index::segment::{Posting, Segment};
use crate::index::{KEY_FIELD, SearchHit, Term};
use crate::query::{BooleanQuery, Occur, Query, RangeQuery};

/// BM25 term-frequency saturation.
const BM25_K1: f32 = 1.2;
/// BM25 length normalization.
const BM25_B: f32 = 0.75;

/// Scores of matching documents of one segment, by ordinal.
type Scores = AHashMap<u32, f32>;

/// A segment together with the deletions visible in one snapshot.
#[derive(Debug, Clone)]
pub struct SegmentView {
    pub segment: Arc<Segment>,
    pub deleted: Arc<BitVec>,
}

impl SegmentView {
    pub fn new(segment: Arc<Segment>) -> Self {
        let deleted = BitVec::from_elem(segment.doc_count(), false);
        Self {
            segment,
            deleted: Arc::new(deleted),
        }
    }

    pub fn is_live(&self, ordinal: u32) -> bool {
        !self.deleted.get(ordinal as usize).unwrap_or(true)
    }

    pub fn live_count(&self) -> usize {
        self.deleted.iter().filter(|deleted| !deleted).count()
    }

    /// Deleted ordinals, ascending.
    pub fn deleted_ordinals(&self) -> Vec<u32> {
        self.deleted
            .iter()
            .enumerate()
            .filter(|(_, deleted)| *deleted)
            .map(|(ordinal, _)| ordinal as u32)
            .collect()
    }

    fn live_ordinals(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.segment.doc_count() as u32).filter(|&ordinal| self.is_live(ordinal))
    }

    fn live_postings<'a>(&'a self, field: &str, term: &str) -> impl Iterator<Item = &'a Posting> {
        self.segment
            .postings(field, term)
            .iter()
            .filter(|posting| self.is_live(posting.doc))
    }
}

/// An immutable view of the committed index.
#[derive(Debug, Clone, Default)]
pub struct IndexSnapshot {
    generation: u64,
    segments: Vec<SegmentView>,
}

impl IndexSnapshot {
    pub fn new(generation: u64, segments: Vec<SegmentView>) -> Self {
        Self {
            generation,
            segments,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn segments(&self) -> &[SegmentView] {
        &self.segments
    }

    pub fn live_doc_count(&self) -> usize {
        self.segments.iter().map(SegmentView::live_count).sum()
    }

    /// `(segment position, ordinal)` of every live document with this key.
    pub fn locate_key(&self, key: &str) -> Vec<(usize, u32)> {
        self.segments
            .iter()
            .enumerate()
            .flat_map(|(idx, view)| {
                view.live_postings(KEY_FIELD, key)
                    .map(move |posting| (idx, posting.doc))
            })
            .collect()
    }

    /// The first live document with this key, in index order.
    pub fn get_by_key(&self, key: &str) -> Option<Document> {
        self.locate_key(key)
            .first()
            .and_then(|&(idx, ordinal)| self.segments[idx].segment.document(ordinal))
            .cloned()
    }

    pub fn live_documents(&self) -> Vec<Document> {
        self.segments
            .iter()
            .flat_map(|view| {
                view.live_ordinals()
                    .filter_map(|ordinal| view.segment.document(ordinal))
            })
            .cloned()
            .collect()
    }

    /// Every term with at least one live posting, sorted.
    pub fn terms(&self) -> Vec<Term> {
        let mut terms = BTreeSet::new();
        for view in &self.segments {
            for (field, field_terms) in view.segment.fields() {
                for (text, postings) in field_terms {
                    if postings.iter().any(|p| view.is_live(p.doc)) {
                        terms.insert(Term::new(field, text.as_str()));
                    }
                }
            }
        }
        terms.into_iter().collect()
    }

    /// Run a query and return at most `limit` hits, best first.
    ///
    /// Equal scores keep index order: older segments first, then ordinal.
    pub fn search(&self, query: &Query, limit: usize) -> Vec<SearchHit> {
        let mut searcher = Searcher::new(self);
        let per_segment = searcher.evaluate(query);

        let mut ranked: Vec<(f32, usize, u32)> = per_segment
            .into_iter()
            .enumerate()
            .flat_map(|(idx, scores)| {
                scores
                    .into_iter()
                    .map(move |(ordinal, score)| (score, idx, ordinal))
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });
        ranked.truncate(limit);

        ranked
            .into_iter()
            .filter_map(|(score, idx, ordinal)| {
                self.segments[idx]
                    .segment
                    .document(ordinal)
                    .map(|document| SearchHit {
                        document: document.clone(),
                        score,
                    })
            })
            .collect()
    }
}

/// Evaluates one query against a snapshot, caching collection statistics.
struct Searcher<'a> {
    snapshot: &'a IndexSnapshot,
    doc_count: usize,
    avg_field_length: AHashMap<String, f32>,
}

impl<'a> Searcher<'a> {
    fn new(snapshot: &'a IndexSnapshot) -> Self {
        Self {
            snapshot,
            doc_count: snapshot.live_doc_count(),
            avg_field_length: AHashMap::new(),
        }
    }

    fn views(&self) -> &'a [SegmentView] {
        &self.snapshot.segments
    }

    fn empty(&self) -> Vec<Scores> {
        vec![Scores::new(); self.views().len()]
    }

    fn evaluate(&mut self, query: &Query) -> Vec<Scores> {
        match query {
            Query::Term { field, term } => self.term(field, term),
            Query::Phrase { field, terms } => self.phrase(field, terms),
            Query::Wildcard(wildcard) => self.constant(|view| {
                let mut docs = AHashSet::new();
                if let Some(field_terms) = view.segment.field_terms(wildcard.field()) {
                    for (text, postings) in field_terms {
                        if wildcard.matches(text) {
                            docs.extend(postings.iter().map(|p| p.doc));
                        }
                    }
                }
                docs
            }),
            Query::Contains { field, value } => self.constant(|view| {
                view.live_ordinals()
                    .filter(|&ordinal| {
                        view.segment
                            .document(ordinal)
                            .and_then(|doc| doc.field(field))
                            .is_some_and(|f| f.value.to_string().contains(value.as_str()))
                    })
                    .collect()
            }),
            Query::Range(range) => self.constant(|view| range_matches(view, range)),
            Query::Boolean(boolean) => self.boolean(boolean),
            Query::MatchAll => self.constant(|view| view.live_ordinals().collect()),
        }
    }

    /// Score every live document in the selected set with 1.0.
    fn constant<F>(&self, select: F) -> Vec<Scores>
    where
        F: Fn(&SegmentView) -> AHashSet<u32>,
    {
        self.views()
            .iter()
            .map(|view| {
                select(view)
                    .into_iter()
                    .filter(|&ordinal| view.is_live(ordinal))
                    .map(|ordinal| (ordinal, 1.0))
                    .collect()
            })
            .collect()
    }

    fn document_frequency(&self, field: &str, term: &str) -> usize {
        self.views()
            .iter()
            .map(|view| view.live_postings(field, term).count())
            .sum()
    }

    fn idf(&self, doc_freq: usize) -> f32 {
        let n = self.doc_count as f32;
        let df = doc_freq as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    fn avg_field_length(&mut self, field: &str) -> f32 {
        if let Some(&avg) = self.avg_field_length.get(field) {
            return avg;
        }
        let total: u64 = self
            .views()
            .iter()
            .flat_map(|view| {
                view.live_ordinals()
                    .map(move |ordinal| view.segment.field_length(field, ordinal) as u64)
            })
            .sum();
        let avg = if self.doc_count == 0 {
            1.0
        } else {
            (total as f32 / self.doc_count as f32).max(1.0)
        };
        self.avg_field_length.insert(field.to_string(), avg);
        avg
    }

    fn bm25(&self, idf: f32, freq: usize, length: u32, avg_length: f32) -> f32 {
        let tf = freq as f32;
        let norm = 1.0 - BM25_B + BM25_B * (length as f32 / avg_length);
        idf * (tf * (BM25_K1 + 1.0)) / (tf + BM25_K1 * norm)
    }

    fn term(&mut self, field: &str, term: &str) -> Vec<Scores> {
        let doc_freq = self.document_frequency(field, term);
        if doc_freq == 0 {
            return self.empty();
        }
        let idf = self.idf(doc_freq);
        let avg_length = self.avg_field_length(field);

        self.views()
            .iter()
            .map(|view| {
                view.live_postings(field, term)
                    .map(|posting| {
                        let length = view.segment.field_length(field, posting.doc);
                        (posting.doc, self.bm25(idf, posting.freq(), length, avg_length))
                    })
                    .collect()
            })
            .collect()
    }

    fn phrase(&mut self, field: &str, terms: &[String]) -> Vec<Scores> {
        match terms {
            [] => return self.empty(),
            [single] => return self.term(field, single),
            _ => {}
        }
        let idf: f32 = terms
            .iter()
            .map(|term| self.idf(self.document_frequency(field, term)))
            .sum();
        let avg_length = self.avg_field_length(field);

        self.views()
            .iter()
            .map(|view| {
                let lists: Vec<&[Posting]> = terms
                    .iter()
                    .map(|term| view.segment.postings(field, term))
                    .collect();
                let mut scores = Scores::new();
                for first in lists[0].iter().filter(|p| view.is_live(p.doc)) {
                    let rest: Option<Vec<&Posting>> = lists[1..]
                        .iter()
                        .map(|list| find_posting(list, first.doc))
                        .collect();
                    let Some(rest) = rest else { continue };

                    let freq = first
                        .positions
                        .iter()
                        .filter(|&&start| {
                            rest.iter().enumerate().all(|(offset, posting)| {
                                posting.positions.contains(&(start + offset as u32 + 1))
                            })
                        })
                        .count();
                    if freq > 0 {
                        let length = view.segment.field_length(field, first.doc);
                        scores.insert(first.doc, self.bm25(idf, freq, length, avg_length));
                    }
                }
                scores
            })
            .collect()
    }

    fn boolean(&mut self, query: &BooleanQuery) -> Vec<Scores> {
        if query.is_empty() {
            return self.empty();
        }

        let mut required: Option<Vec<Scores>> = None;
        for clause in query.clauses() {
            let scoring = match clause.occur {
                Occur::Must => true,
                Occur::Filter => false,
                Occur::Should | Occur::MustNot => continue,
            };
            let mut matched = self.evaluate(&clause.query);
            if !scoring {
                matched
                    .iter_mut()
                    .for_each(|scores| scores.values_mut().for_each(|s| *s = 0.0));
            }
            required = Some(match required {
                None => matched,
                Some(acc) => intersect(acc, matched),
            });
        }

        let mut optional: Option<Vec<Scores>> = None;
        for clause in query.clauses_by_occur(Occur::Should) {
            let matched = self.evaluate(&clause.query);
            optional = Some(match optional {
                None => matched,
                Some(acc) => union(acc, matched),
            });
        }

        let mut result = match (required, optional) {
            (Some(required), Some(optional)) => boost(required, &optional),
            (Some(required), None) => required,
            (None, Some(optional)) => optional,
            (None, None) => self.evaluate(&Query::MatchAll),
        };

        for clause in query.clauses_by_occur(Occur::MustNot) {
            let excluded = self.evaluate(&clause.query);
            for (scores, excluded) in result.iter_mut().zip(excluded) {
                scores.retain(|ordinal, _| !excluded.contains_key(ordinal));
            }
        }
        result
    }
}

fn find_posting(list: &[Posting], doc: u32) -> Option<&Posting> {
    list.binary_search_by(|p| p.doc.cmp(&doc))
        .ok()
        .map(|idx| &list[idx])
}

fn intersect(acc: Vec<Scores>, other: Vec<Scores>) -> Vec<Scores> {
    acc.into_iter()
        .zip(other)
        .map(|(acc, other)| {
            acc.into_iter()
                .filter_map(|(ordinal, score)| other.get(&ordinal).map(|s| (ordinal, score + s)))
                .collect()
        })
        .collect()
}

fn union(acc: Vec<Scores>, other: Vec<Scores>) -> Vec<Scores> {
    acc.into_iter()
        .zip(other)
        .map(|(mut acc, other)| {
            for (ordinal, score) in other {
                *acc.entry(ordinal).or_insert(0.0) += score;
            }
            acc
        })
        .collect()
}

/// Add optional scores to documents that already matched.
fn boost(required: Vec<Scores>, optional: &[Scores]) -> Vec<Scores> {
    required
        .into_iter()
        .zip(optional)
        .map(|(mut required, optional)| {
            for (ordinal, score) in required.iter_mut() {
                if let Some(extra) = optional.get(ordinal) {
                    *score += extra;
                }
            }
            required
        })
        .collect()
}

fn range_matches(view: &SegmentView, range: &RangeQuery) -> AHashSet<u32> {
    let lower = range.lower.as_deref().map(|b| (b, b.parse::<f64>().ok()));
    let upper = range.upper.as_deref().map(|b| (b, b.parse::<f64>().ok()));
    let numeric_bounds = lower.is_none_or(|(_, n)| n.is_some())
        && upper.is_none_or(|(_, n)| n.is_some())
        && (lower.is_some() || upper.is_some());

    let mut docs = AHashSet::new();
    let mut numeric_docs = AHashSet::new();

    if numeric_bounds {
        for ordinal in view.live_ordinals() {
            let value = view
                .segment
                .document(ordinal)
                .and_then(|doc| doc.field(&range.field))
                .and_then(|field| field.value.as_f64());
            let Some(value) = value else { continue };
            numeric_docs.insert(ordinal);

            let above = match lower {
                Some((_, Some(lo))) => {
                    let ord = value.partial_cmp(&lo);
                    ord == Some(Ordering::Greater)
                        || (range.include_lower && ord == Some(Ordering::Equal))
                }
                _ => true,
            };
            let below = match upper {
                Some((_, Some(hi))) => {
                    let ord = value.partial_cmp(&hi);
                    ord == Some(Ordering::Less)
                        || (range.include_upper && ord == Some(Ordering::Equal))
                }
                _ => true,
            };
            if above && below {
                docs.insert(ordinal);
            }
        }
    }

    let Some(field_terms) = view.segment.field_terms(&range.field) else {
        return docs;
    };
    if let (Some((lo, _)), Some((hi, _))) = (lower, upper) {
        let empty = match lo.cmp(hi) {
            Ordering::Greater => true,
            Ordering::Equal => !(range.include_lower && range.include_upper),
            Ordering::Less => false,
        };
        if empty {
            return docs;
        }
    }
    let start = match lower {
        Some((lo, _)) if range.include_lower => Bound::Included(lo),
        Some((lo, _)) => Bound::Excluded(lo),
        None => Bound::Unbounded,
    };
    let end = match upper {
        Some((hi, _)) if range.include_upper => Bound::Included(hi),
        Some((hi, _)) => Bound::Excluded(hi),
        None => Bound::Unbounded,
    };
    for (_, postings) in field_terms.range::<str, _>((start, end)) {
        docs.extend(
            postings
                .iter()
                .map(|p| p.doc)
                .filter(|doc| !numeric_docs.contains(doc)),
        );
    }
    docs
}
