//! Directory-backed storage.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::Storage;

const TMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStorageConfig {
    /// Directory holding the index files. Created if missing.
    pub path: PathBuf,
}

impl FileStorageConfig {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// Stores each file as a regular file in one directory.
///
/// Writes go to a temporary file which is fsynced and then renamed over the
/// target, so a crash leaves either the old or the new content.
#[derive(Debug)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    pub fn new(config: FileStorageConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)?;
        Ok(Self {
            directory: config.path,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }

    fn sync_directory(&self) -> Result<()> {
        #[cfg(unix)]
        File::open(&self.directory)?.sync_all()?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.path(name))?)
    }

    fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        let tmp = self.path(&format!("{name}{TMP_SUFFIX}"));
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp)?;
            file.write_all(data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, self.path(name))?;
        self.sync_directory()
    }

    fn file_exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.ends_with(TMP_SUFFIX) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_storage_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(FileStorageConfig::new(temp_dir.path().join("idx"))).unwrap();

        storage.write_file("segments.json", b"{}").unwrap();
        storage.write_file("segments.json", b"{\"v\":1}").unwrap();
        assert_eq!(storage.read_file("segments.json").unwrap(), b"{\"v\":1}");
        assert_eq!(storage.list_files().unwrap(), vec!["segments.json"]);

        storage.delete_file("segments.json").unwrap();
        storage.delete_file("segments.json").unwrap();
        assert!(!storage.file_exists("segments.json"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(FileStorageConfig::new(temp_dir.path())).unwrap();
        let err = storage.read_file("nope").unwrap_err();
        assert!(err.is_storage_error());
    }
}
