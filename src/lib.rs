//! # Docket
//!
//! An embeddable, queryable document store.
//!
//! Callers create typed property bags ([`Entity`]), store them under a
//! generated unique id, and read them back by id, by exact property values,
//! by structured [`Query`] or by query string.
//!
//! ## Features
//!
//! - Typed properties: analyzed text, keywords, integers and floats
//! - Upsert-as-replace by entity id
//! - Lucene-style query strings and a programmatic query builder
//! - BM25-ranked search over an embedded segment-based inverted index
//! - In-memory or directory-backed storage with atomic commits
//!
//! ```
//! use docket::DatastoreFactory;
//!
//! let store = DatastoreFactory::create_in_memory().unwrap();
//! let mut alice = store.create_entity();
//! alice.set_property("name", "Alice").set_property_as_long("age", 30);
//! store.put(&alice).unwrap();
//!
//! let found = store.search_entity("name:Alice").unwrap();
//! assert_eq!(found.get_long("age").unwrap(), 30);
//! ```
pub mod analysis;
pub mod codec;
pub mod data;
pub mod datastore;
pub mod entity;
pub mod error;
pub mod index;
pub mod query;
pub mod storage;

pub use analysis::{Analyzer, analyzer_by_name};
pub use codec::{Document, Field, PropertyCodec};
pub use data::{PropertyType, PropertyValue};
pub use datastore::{Datastore, DatastoreConfig, DatastoreFactory};
pub use entity::Entity;
pub use error::{DocketError, Result};
pub use index::{IndexAdapter, InvertedIndex, InvertedIndexConfig, SearchHit, Term};
pub use query::{BooleanQuery, Occur, Query, QueryBuilder, QueryParser, RangeQuery};
pub use storage::{Storage, StorageConfig, StorageFactory};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
