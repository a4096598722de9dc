//! Byte-level backing storage for the index.
//!
//! The index persists a handful of whole files (segments and a manifest).
//! [`Storage`] abstracts where they live: in memory for throwaway stores, or
//! in a directory on disk.

pub mod file;
pub mod memory;

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use file::{FileStorage, FileStorageConfig};
pub use memory::{MemoryStorage, MemoryStorageConfig};

/// A flat namespace of named files.
pub trait Storage: Send + Sync + Debug {
    /// Read a whole file.
    fn read_file(&self, name: &str) -> Result<Vec<u8>>;

    /// Replace a file atomically. When this returns, the new content is
    /// durable and readers never observe a partial write.
    fn write_file(&self, name: &str, data: &[u8]) -> Result<()>;

    fn file_exists(&self, name: &str) -> bool;

    /// Delete a file. Deleting a missing file is not an error.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// Names of all files, sorted.
    fn list_files(&self) -> Result<Vec<String>>;
}

/// Where a datastore keeps its files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StorageConfig {
    Memory(MemoryStorageConfig),
    File(FileStorageConfig),
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Memory(MemoryStorageConfig::default())
    }
}

/// Creates storage backends from configuration.
pub struct StorageFactory;

impl StorageFactory {
    pub fn create(config: StorageConfig) -> Result<Arc<dyn Storage>> {
        match config {
            StorageConfig::Memory(config) => Ok(Arc::new(MemoryStorage::new(config))),
            StorageConfig::File(config) => Ok(Arc::new(FileStorage::new(config)?)),
        }
    }
}
