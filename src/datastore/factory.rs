use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::analysis::analyzer_by_name;
use crate::datastore::{Datastore, DatastoreConfig};
use crate::error::Result;
use crate::index::{IndexAdapter, InvertedIndex};
use crate::storage::StorageFactory;

/// Creates datastores. Each call yields an independent instance owning its
/// own index and writer.
pub struct DatastoreFactory;

impl DatastoreFactory {
    /// Open (or create) a datastore backed by the shipped inverted index.
    pub fn create(config: DatastoreConfig) -> Result<Datastore> {
        config.validate()?;
        let analyzer = analyzer_by_name(&config.analyzer)?;
        let storage = StorageFactory::create(config.storage.clone())?;
        let index = InvertedIndex::open(storage, config.index.clone())?;
        info!("opened datastore with {:?} storage", config.storage);
        Ok(Datastore::new(Arc::new(index), analyzer, config))
    }

    /// A throwaway datastore held in memory.
    pub fn create_in_memory() -> Result<Datastore> {
        Self::create(DatastoreConfig::default())
    }

    /// A datastore persisted in `path`, with default settings.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Datastore> {
        Self::create(DatastoreConfig::builder().directory(path).build())
    }

    /// A datastore over a caller-supplied index engine. The storage and
    /// index settings of `config` are ignored.
    pub fn with_index(index: Arc<dyn IndexAdapter>, config: DatastoreConfig) -> Result<Datastore> {
        config.validate()?;
        let analyzer = analyzer_by_name(&config.analyzer)?;
        Ok(Datastore::new(index, analyzer, config))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::error::DocketError;
    use crate::storage::memory::{MemoryStorage, MemoryStorageConfig};

    #[test]
    fn test_unknown_analyzer_rejected() {
        let config = DatastoreConfig::builder().analyzer("klingon").build();
        assert!(matches!(
            DatastoreFactory::create(config),
            Err(DocketError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_instances_are_independent() {
        let a = DatastoreFactory::create_in_memory().unwrap();
        let b = DatastoreFactory::create_in_memory().unwrap();
        a.create_and_save_entity([("name", "Alice")]).unwrap();

        assert_eq!(a.get_all_entities().unwrap().len(), 1);
        assert!(b.get_all_entities().unwrap().is_empty());
    }

    #[test]
    fn test_open_directory() {
        let dir = TempDir::new().unwrap();
        let store = DatastoreFactory::open(dir.path().join("store")).unwrap();
        store.create_and_save_entity([("name", "Alice")]).unwrap();
        assert!(dir.path().join("store").join("segments.json").exists());
    }

    #[test]
    fn test_with_index() {
        let storage = Arc::new(MemoryStorage::new(MemoryStorageConfig::default()));
        let index = InvertedIndex::open(storage, Default::default()).unwrap();
        let store =
            DatastoreFactory::with_index(Arc::new(index), DatastoreConfig::default()).unwrap();
        assert_eq!(store.analyzer(), "whitespace");
    }
}
