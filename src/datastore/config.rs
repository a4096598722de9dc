use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::WhitespaceAnalyzer;
use crate::error::{DocketError, Result};
use crate::index::InvertedIndexConfig;
use crate::storage::{FileStorageConfig, StorageConfig};

/// Environment variable overriding [`DatastoreConfig::max_results`] at query
/// time.
pub const MAX_RESULTS_ENV: &str = "DOCKET_MAX_RESULTS";

/// Default cap on the number of results a search returns.
pub const DEFAULT_MAX_RESULTS: usize = 500;

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn default_analyzer() -> String {
    WhitespaceAnalyzer::NAME.to_string()
}

/// Configuration of a [`Datastore`](super::Datastore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatastoreConfig {
    /// Where the index lives.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Maximum number of results per search.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Analyzer for new text properties and query strings.
    #[serde(default = "default_analyzer")]
    pub analyzer: String,
    #[serde(default)]
    pub index: InvertedIndexConfig,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            max_results: default_max_results(),
            analyzer: default_analyzer(),
            index: InvertedIndexConfig::default(),
        }
    }
}

impl DatastoreConfig {
    pub fn builder() -> DatastoreConfigBuilder {
        DatastoreConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(DocketError::invalid_argument(
                "max_results must be greater than zero",
            ));
        }
        if self.index.merge_threshold == 0 {
            return Err(DocketError::invalid_argument(
                "merge_threshold must be greater than zero",
            ));
        }
        Ok(())
    }

    /// The effective result cap: `DOCKET_MAX_RESULTS` when it is set to a
    /// positive integer, the configured value otherwise.
    pub fn resolve_max_results(&self) -> usize {
        std::env::var(MAX_RESULTS_ENV)
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|&value| value > 0)
            .unwrap_or(self.max_results)
    }
}

#[derive(Debug, Default)]
pub struct DatastoreConfigBuilder {
    config: DatastoreConfig,
}

impl DatastoreConfigBuilder {
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.config.storage = storage;
        self
    }

    /// Keep the index in `path`.
    pub fn directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.storage = StorageConfig::File(FileStorageConfig::new(path));
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.config.max_results = max_results;
        self
    }

    pub fn analyzer(mut self, name: impl Into<String>) -> Self {
        self.config.analyzer = name.into();
        self
    }

    pub fn merge_threshold(mut self, threshold: usize) -> Self {
        self.config.index.merge_threshold = threshold;
        self
    }

    pub fn build(self) -> DatastoreConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DatastoreConfig::default();
        assert_eq!(config.max_results, 500);
        assert_eq!(config.analyzer, "whitespace");
        assert!(matches!(config.storage, StorageConfig::Memory(_)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: DatastoreConfig =
            serde_json::from_str(r#"{"storage":{"File":{"path":"/tmp/docket"}}}"#).unwrap();
        assert_eq!(config.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(config.analyzer, "whitespace");
        assert_eq!(config.index.merge_threshold, 16);
        assert!(matches!(config.storage, StorageConfig::File(_)));
    }

    #[test]
    fn test_builder_and_validate() {
        let config = DatastoreConfig::builder()
            .max_results(10)
            .analyzer("standard")
            .merge_threshold(4)
            .build();
        assert_eq!(config.max_results, 10);
        assert_eq!(config.analyzer, "standard");
        assert_eq!(config.index.merge_threshold, 4);

        let invalid = DatastoreConfig::builder().max_results(0).build();
        assert!(matches!(
            invalid.validate(),
            Err(DocketError::InvalidArgument(_))
        ));
    }
}
