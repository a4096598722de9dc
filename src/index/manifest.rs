//! The persisted list of live segments.
//!
//! The manifest is the commit point of the index: segment files that it does
//! not name are not part of the index, and replacing it (atomically, through
//! [`Storage::write_file`]) is what publishes a commit.

use serde::{Deserialize, Serialize};

use crate::error::{DocketError, Result};
use crate::storage::Storage;

pub const MANIFEST_FILE: &str = "segments.json";

const MANIFEST_VERSION: u32 = 1;

/// One segment as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentEntry {
    pub id: u64,
    pub doc_count: usize,
    /// Deleted document ordinals, ascending.
    #[serde(default)]
    pub deleted: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    /// Incremented on every commit.
    pub generation: u64,
    pub next_segment_id: u64,
    pub segments: Vec<SegmentEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            generation: 0,
            next_segment_id: 0,
            segments: Vec::new(),
        }
    }
}

impl Manifest {
    /// Load the manifest, or `None` if the index has never been committed.
    pub fn load(storage: &dyn Storage) -> Result<Option<Self>> {
        if !storage.file_exists(MANIFEST_FILE) {
            return Ok(None);
        }
        let bytes = storage.read_file(MANIFEST_FILE)?;
        let manifest: Manifest = serde_json::from_slice(&bytes)?;
        if manifest.version != MANIFEST_VERSION {
            return Err(DocketError::index(format!(
                "unsupported manifest version {}",
                manifest.version
            )));
        }
        Ok(Some(manifest))
    }

    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        storage.write_file(MANIFEST_FILE, &bytes)
    }

    pub fn live_doc_count(&self) -> usize {
        self.segments
            .iter()
            .map(|s| s.doc_count - s.deleted.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::{MemoryStorage, MemoryStorageConfig};

    #[test]
    fn test_missing_manifest() {
        let storage = MemoryStorage::new(MemoryStorageConfig::default());
        assert!(Manifest::load(&storage).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new(MemoryStorageConfig::default());
        let manifest = Manifest {
            generation: 4,
            next_segment_id: 3,
            segments: vec![
                SegmentEntry {
                    id: 1,
                    doc_count: 2,
                    deleted: vec![0],
                },
                SegmentEntry {
                    id: 2,
                    doc_count: 1,
                    deleted: vec![],
                },
            ],
            ..Default::default()
        };
        manifest.save(&storage).unwrap();

        let loaded = Manifest::load(&storage).unwrap().unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.live_doc_count(), 2);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let storage = MemoryStorage::new(MemoryStorageConfig::default());
        let manifest = Manifest {
            version: 99,
            ..Default::default()
        };
        manifest.save(&storage).unwrap();

        let err = Manifest::load(&storage).unwrap_err();
        assert!(err.is_storage_error());
    }
}
