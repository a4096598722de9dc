//! The segment-based inverted index.
//!
//! Every commit writes at most one new segment file and then replaces the
//! manifest; the manifest swap is the commit point. Deletions are recorded
//! per segment as bitmaps that are copied on write, so snapshots handed to
//! readers never change underneath them.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bit_vec::BitVec;
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::codec::{Document, PropertyCodec};
use crate::error::{DocketError, Result};
use crate::index::manifest::{Manifest, SegmentEntry};
use crate::index::segment::Segment;
use crate::index::snapshot::{IndexSnapshot, SegmentView};
use crate::index::{IndexAdapter, KEY_FIELD, SearchHit, Term};
use crate::query::Query;
use crate::storage::Storage;

fn default_merge_threshold() -> usize {
    16
}

/// Tuning of the inverted index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvertedIndexConfig {
    /// Merge all segments into one when a commit leaves more than this many.
    #[serde(default = "default_merge_threshold")]
    pub merge_threshold: usize,
}

impl Default for InvertedIndexConfig {
    fn default() -> Self {
        Self {
            merge_threshold: default_merge_threshold(),
        }
    }
}

/// Writer bookkeeping. Only touched under the writer lock.
#[derive(Debug)]
struct WriterState {
    generation: u64,
    next_segment_id: u64,
}

/// An [`IndexAdapter`] over immutable segments in a [`Storage`].
#[derive(Debug)]
pub struct InvertedIndex {
    storage: Arc<dyn Storage>,
    config: InvertedIndexConfig,
    writer: Mutex<WriterState>,
    snapshot: RwLock<Arc<IndexSnapshot>>,
    closed: AtomicBool,
}

impl InvertedIndex {
    /// Open the index in `storage`, creating an empty one if none exists.
    pub fn open(storage: Arc<dyn Storage>, config: InvertedIndexConfig) -> Result<Self> {
        let manifest = match Manifest::load(storage.as_ref())? {
            Some(manifest) => manifest,
            None => {
                let manifest = Manifest::default();
                manifest.save(storage.as_ref())?;
                info!("created empty index");
                manifest
            }
        };

        let mut views = Vec::with_capacity(manifest.segments.len());
        for entry in &manifest.segments {
            views.push(Self::load_segment(storage.as_ref(), entry)?);
        }
        Self::remove_orphans(storage.as_ref(), &manifest);

        let snapshot = IndexSnapshot::new(manifest.generation, views);
        info!(
            "opened index generation {} with {} segments and {} live documents",
            manifest.generation,
            snapshot.segments().len(),
            snapshot.live_doc_count()
        );

        Ok(Self {
            storage,
            config,
            writer: Mutex::new(WriterState {
                generation: manifest.generation,
                next_segment_id: manifest.next_segment_id,
            }),
            snapshot: RwLock::new(Arc::new(snapshot)),
            closed: AtomicBool::new(false),
        })
    }

    fn load_segment(storage: &dyn Storage, entry: &SegmentEntry) -> Result<SegmentView> {
        let bytes = storage.read_file(&Segment::file_name(entry.id))?;
        let segment = Segment::from_bytes(&bytes)?;
        if segment.id() != entry.id || segment.doc_count() != entry.doc_count {
            return Err(DocketError::index(format!(
                "segment {} does not match the manifest (id {}, {} documents, expected {})",
                entry.id,
                segment.id(),
                segment.doc_count(),
                entry.doc_count
            )));
        }

        let mut deleted = BitVec::from_elem(segment.doc_count(), false);
        for &ordinal in &entry.deleted {
            if ordinal as usize >= segment.doc_count() {
                return Err(DocketError::index(format!(
                    "segment {} marks ordinal {ordinal} deleted but holds {} documents",
                    entry.id,
                    segment.doc_count()
                )));
            }
            deleted.set(ordinal as usize, true);
        }

        Ok(SegmentView {
            segment: Arc::new(segment),
            deleted: Arc::new(deleted),
        })
    }

    /// Delete segment files left behind by a commit that never reached the
    /// manifest swap.
    fn remove_orphans(storage: &dyn Storage, manifest: &Manifest) {
        let known: BTreeSet<String> = manifest
            .segments
            .iter()
            .map(|entry| Segment::file_name(entry.id))
            .collect();
        let files = match storage.list_files() {
            Ok(files) => files,
            Err(e) => {
                warn!("could not list index files: {e}");
                return;
            }
        };
        for name in files {
            if name.starts_with("seg_") && name.ends_with(".json") && !known.contains(&name) {
                warn!("removing orphaned segment file {name}");
                if let Err(e) = storage.delete_file(&name) {
                    warn!("could not remove {name}: {e}");
                }
            }
        }
    }

    /// The snapshot readers currently see.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot.read().clone()
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(DocketError::Closed)
        } else {
            Ok(())
        }
    }

    /// Segment views of `snapshot` with every live document of `key` marked
    /// deleted. Bitmaps that change are copied; the others stay shared.
    fn without_key(snapshot: &IndexSnapshot, key: &str) -> (Vec<SegmentView>, usize) {
        let mut views = snapshot.segments().to_vec();
        let located = snapshot.locate_key(key);
        for &(idx, ordinal) in &located {
            Arc::make_mut(&mut views[idx].deleted).set(ordinal as usize, true);
        }
        (views, located.len())
    }

    /// Persist `views` as the next generation and publish it.
    ///
    /// `new_segment`, if any, must already be part of `views`; its file is
    /// written before the manifest. Segments without live documents are
    /// dropped, and their files removed once the manifest is in place, along
    /// with the files of `retired` segments.
    fn commit(
        &self,
        state: &mut WriterState,
        views: Vec<SegmentView>,
        new_segment: Option<&Segment>,
        mut retired: Vec<u64>,
    ) -> Result<()> {
        let mut next_segment_id = state.next_segment_id;
        if let Some(segment) = new_segment {
            self.storage
                .write_file(&Segment::file_name(segment.id()), &segment.to_bytes()?)?;
            next_segment_id = next_segment_id.max(segment.id() + 1);
        }

        let (views, empty): (Vec<SegmentView>, Vec<SegmentView>) =
            views.into_iter().partition(|view| view.live_count() > 0);
        retired.extend(empty.iter().map(|view| view.segment.id()));

        let generation = state.generation + 1;
        let manifest = Manifest {
            generation,
            next_segment_id,
            segments: views
                .iter()
                .map(|view| SegmentEntry {
                    id: view.segment.id(),
                    doc_count: view.segment.doc_count(),
                    deleted: view.deleted_ordinals(),
                })
                .collect(),
            ..Default::default()
        };
        manifest.save(self.storage.as_ref())?;

        state.generation = generation;
        state.next_segment_id = next_segment_id;
        *self.snapshot.write() = Arc::new(IndexSnapshot::new(generation, views));
        debug!(
            "committed generation {generation} ({} segments, {} live documents)",
            manifest.segments.len(),
            manifest.live_doc_count()
        );

        for id in retired {
            if let Err(e) = self.storage.delete_file(&Segment::file_name(id)) {
                warn!("could not remove retired segment {id}: {e}");
            }
        }
        Ok(())
    }

    /// Rewrite all live documents into a single segment.
    fn merge(&self, state: &mut WriterState) -> Result<()> {
        let current = self.snapshot();
        let retired: Vec<u64> = current
            .segments()
            .iter()
            .map(|view| view.segment.id())
            .collect();
        let documents = current.live_documents();
        let merged_count = documents.len();

        if documents.is_empty() {
            self.commit(state, Vec::new(), None, retired)?;
        } else {
            let segment = Arc::new(Segment::build(state.next_segment_id, documents)?);
            let views = vec![SegmentView::new(segment.clone())];
            self.commit(state, views, Some(segment.as_ref()), retired)?;
        }
        info!(
            "merged {} segments into one ({merged_count} documents)",
            current.segments().len()
        );
        Ok(())
    }

    fn needs_merge(&self) -> bool {
        self.snapshot.read().segments().len() > self.config.merge_threshold
    }

    fn is_consolidated(&self) -> bool {
        let snapshot = self.snapshot.read();
        match snapshot.segments() {
            [] => true,
            [only] => only.live_count() == only.segment.doc_count(),
            _ => false,
        }
    }
}

impl IndexAdapter for InvertedIndex {
    fn upsert(&self, key: &str, mut document: Document) -> Result<()> {
        self.check_open()?;
        PropertyCodec::encode_keyword(&mut document, KEY_FIELD, key);

        let mut state = self.writer.lock();
        let current = self.snapshot();
        let (mut views, replaced) = Self::without_key(&current, key);

        let segment = Arc::new(Segment::build(state.next_segment_id, vec![document])?);
        views.push(SegmentView::new(segment.clone()));
        self.commit(&mut state, views, Some(segment.as_ref()), Vec::new())?;
        debug!("upserted '{key}' (replaced {replaced})");

        // The upsert is committed at this point. A failed merge is retried on
        // the next upsert or by optimize.
        if self.needs_merge() {
            if let Err(e) = self.merge(&mut state) {
                warn!("merge after upsert of '{key}' failed: {e}");
            }
        }
        Ok(())
    }

    fn delete_by_key(&self, key: &str) -> Result<()> {
        self.check_open()?;

        let mut state = self.writer.lock();
        let current = self.snapshot();
        let (views, removed) = Self::without_key(&current, key);
        if removed == 0 {
            debug!("delete of unknown key '{key}' ignored");
            return Ok(());
        }
        self.commit(&mut state, views, None, Vec::new())?;
        debug!("deleted '{key}' ({removed} documents)");
        Ok(())
    }

    fn get_by_key(&self, key: &str) -> Result<Option<Document>> {
        self.check_open()?;
        Ok(self.snapshot().get_by_key(key))
    }

    fn query(&self, query: &Query, max_results: usize) -> Result<Vec<SearchHit>> {
        self.check_open()?;
        let snapshot = self.snapshot();
        let hits = snapshot.search(query, max_results);
        debug!(
            "query {query} matched {} documents at generation {}",
            hits.len(),
            snapshot.generation()
        );
        Ok(hits)
    }

    fn scan_all(&self) -> Result<Vec<Document>> {
        self.check_open()?;
        Ok(self.snapshot().live_documents())
    }

    fn list_terms(&self) -> Result<Vec<Term>> {
        self.check_open()?;
        Ok(self.snapshot().terms())
    }

    fn optimize(&self) -> Result<()> {
        self.check_open()?;

        let mut state = self.writer.lock();
        if self.is_consolidated() {
            debug!("index already consolidated");
            return Ok(());
        }
        self.merge(&mut state)
    }

    fn close(&self) -> Result<()> {
        // Wait for an in-flight commit before refusing further work.
        let _state = self.writer.lock();
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("closed index");
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
