//! In-memory storage. Contents are lost when the storage is dropped.

use ahash::AHashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{DocketError, Result};
use crate::storage::Storage;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStorageConfig {
    /// Initial capacity of the file table.
    #[serde(default)]
    pub initial_capacity: usize,
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: RwLock<AHashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new(config: MemoryStorageConfig) -> Self {
        Self {
            files: RwLock::new(AHashMap::with_capacity(config.initial_capacity)),
        }
    }
}

impl Storage for MemoryStorage {
    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| DocketError::index(format!("file '{name}' does not exist")))
    }

    fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        self.files.write().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn file_exists(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.files.write().remove(name);
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.files.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new(MemoryStorageConfig::default());
        assert!(!storage.file_exists("a"));
        assert!(storage.read_file("a").is_err());

        storage.write_file("b", b"two").unwrap();
        storage.write_file("a", b"one").unwrap();
        assert_eq!(storage.read_file("a").unwrap(), b"one");
        assert_eq!(storage.list_files().unwrap(), vec!["a", "b"]);

        storage.delete_file("a").unwrap();
        storage.delete_file("a").unwrap();
        assert!(!storage.file_exists("a"));
    }

    #[test]
    fn test_initial_capacity() {
        let storage = MemoryStorage::new(MemoryStorageConfig {
            initial_capacity: 64,
        });
        assert!(storage.files.read().capacity() >= 64);
        assert!(storage.list_files().unwrap().is_empty());
    }
}
