//! The entity datastore.
//!
//! [`Datastore`] keeps [`Entity`] values consistent with an index engine:
//! each entity is stored as one document keyed by its id, replaced as a whole
//! on every put, and decoded back into a detached entity on every read.
//!
//! Instances are created through [`DatastoreFactory`]; each owns its index
//! adapter and the lock that serializes its mutations.

pub mod config;
pub mod factory;

pub use config::{DatastoreConfig, DatastoreConfigBuilder};
pub use factory::DatastoreFactory;

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use log::{debug, info};
use parking_lot::Mutex;

use crate::analysis::{Analyzer, KeywordAnalyzer};
use crate::codec::{Document, PropertyCodec};
use crate::data::PropertyValue;
use crate::entity::Entity;
use crate::error::{DocketError, Result};
use crate::index::{IndexAdapter, KEY_FIELD, Term};
use crate::query::parser::DEFAULT_FIELD;
use crate::query::{Query, QueryBuilder, QueryParser};

/// Property set by [`Datastore::create_and_save_entity`] when absent.
pub const CREATED_PROPERTY: &str = "created";

#[derive(Debug)]
pub struct Datastore {
    index: Arc<dyn IndexAdapter>,
    analyzer: Arc<dyn Analyzer>,
    config: DatastoreConfig,
    write_lock: Mutex<()>,
}

impl Datastore {
    pub(crate) fn new(
        index: Arc<dyn IndexAdapter>,
        analyzer: Arc<dyn Analyzer>,
        config: DatastoreConfig,
    ) -> Self {
        info!(
            "datastore ready (analyzer '{}', max results {})",
            analyzer.name(),
            config.max_results
        );
        Self {
            index,
            analyzer,
            config,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &DatastoreConfig {
        &self.config
    }

    /// Name of the analyzer given to new entities and used for query strings.
    pub fn analyzer(&self) -> &str {
        self.analyzer.name()
    }

    /// The result cap for the next search, honouring `DOCKET_MAX_RESULTS`.
    pub fn max_results(&self) -> usize {
        self.config.resolve_max_results()
    }

    /// A new empty entity with a fresh id. Nothing is stored until `put`.
    pub fn create_entity(&self) -> Entity {
        Entity::new(self.analyzer.clone())
    }

    /// Store `entity`, replacing whatever was stored under its id.
    pub fn put(&self, entity: &Entity) -> Result<&Self> {
        Self::validate(entity)?;

        let _guard = self.write_lock.lock();
        self.index.upsert(entity.id(), entity.document().clone())?;
        debug!("put entity {} ({} properties)", entity.id(), entity.len());
        Ok(self)
    }

    fn validate(entity: &Entity) -> Result<()> {
        if entity.id().is_empty() {
            return Err(DocketError::invalid_argument("entity id is empty"));
        }
        for name in entity.property_names() {
            if name.is_empty() {
                return Err(DocketError::invalid_argument(format!(
                    "entity {} has a property with an empty name",
                    entity.id()
                )));
            }
            if name == KEY_FIELD {
                return Err(DocketError::invalid_argument(format!(
                    "property name '{KEY_FIELD}' is reserved"
                )));
            }
        }
        // Segments are JSON, which has no NaN or infinity.
        for field in entity.document().fields() {
            if let PropertyValue::Double(v) = field.value {
                if !v.is_finite() {
                    return Err(DocketError::invalid_argument(format!(
                        "property '{}' of entity {} is not a finite number ({v})",
                        field.name,
                        entity.id()
                    )));
                }
            }
        }
        Ok(())
    }

    /// The stored entity with this id.
    pub fn get(&self, id: &str) -> Result<Entity> {
        match self.index.get_by_key(id)? {
            Some(document) => self.materialize(document, None),
            None => Err(DocketError::not_found(format!("entity {id}"))),
        }
    }

    /// Remove the stored entity with the same id. Unknown ids are ignored.
    pub fn delete(&self, entity: &Entity) -> Result<&Self> {
        self.delete_by_id(entity.id())
    }

    pub fn delete_by_id(&self, id: &str) -> Result<&Self> {
        let _guard = self.write_lock.lock();
        self.index.delete_by_key(id)?;
        debug!("deleted entity {id}");
        Ok(self)
    }

    /// Entities holding every given `(property, term)` pair exactly.
    ///
    /// An empty set of pairs matches nothing.
    pub fn search_fields<I, K, V>(&self, fields: I) -> Result<Vec<Entity>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let builder = fields
            .into_iter()
            .fold(QueryBuilder::new(), |builder, (field, value)| {
                builder.add_item(field, value)
            });
        if builder.is_empty() {
            return Ok(Vec::new());
        }
        self.search_query(&builder.build())
    }

    /// Entities matching a query string whose bare terms target `content`.
    pub fn search_entities(&self, query: &str) -> Result<Vec<Entity>> {
        self.search_entities_in(query, DEFAULT_FIELD)
    }

    /// Entities matching a query string whose bare terms target `field`.
    pub fn search_entities_in(&self, query: &str, field: &str) -> Result<Vec<Entity>> {
        let parsed = self.query_parser(field).parse(query)?;
        self.search_query(&parsed)
    }

    /// The best match of a query string.
    pub fn search_entity(&self, query: &str) -> Result<Entity> {
        self.search_entities(query)?
            .into_iter()
            .next()
            .ok_or_else(|| DocketError::not_found(format!("no entity matches '{query}'")))
    }

    /// Entities matching a structured query, best first.
    pub fn search_query(&self, query: &Query) -> Result<Vec<Entity>> {
        let hits = self.index.query(query, self.max_results())?;
        hits.into_iter()
            .map(|hit| self.materialize(hit.document, Some(hit.score)))
            .collect()
    }

    /// Every stored entity, unranked and uncapped.
    pub fn get_all_entities(&self) -> Result<Vec<Entity>> {
        self.index
            .scan_all()?
            .into_iter()
            .map(|document| self.materialize(document, None))
            .collect()
    }

    /// Store a new entity built from text properties, stamping `created`
    /// with the current UTC time unless the caller supplied one.
    pub fn create_and_save_entity<I, K, V>(&self, properties: I) -> Result<&Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entity = self.create_entity();
        for (name, value) in properties {
            entity.set_property(name.as_ref(), value.as_ref());
        }
        if !entity.has_property(CREATED_PROPERTY) {
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            entity.set_property(CREATED_PROPERTY, &now);
        }
        self.put(&entity)
    }

    /// Every indexed term, including the key field.
    pub fn list_terms(&self) -> Result<Vec<Term>> {
        self.index.list_terms()
    }

    /// Consolidate the index and persist it.
    pub fn optimize(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.index.optimize()?;
        info!("datastore optimized");
        Ok(())
    }

    /// Release the index. Every later call fails with `Closed`.
    pub fn close(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.index.close()
    }

    pub fn is_closed(&self) -> bool {
        self.index.is_closed()
    }

    fn query_parser(&self, default_field: &str) -> QueryParser {
        QueryParser::new(self.analyzer.clone())
            .with_default_field(default_field)
            .with_field_analyzer(KEY_FIELD, Arc::new(KeywordAnalyzer::new()))
    }

    fn materialize(&self, mut document: Document, score: Option<f32>) -> Result<Entity> {
        let id = PropertyCodec::decode_text(&document, KEY_FIELD)
            .map_err(|_| DocketError::index("stored document has no key"))?
            .to_string();
        document.remove_field(KEY_FIELD);
        Ok(Entity::from_document(
            id,
            document,
            self.analyzer.clone(),
            score,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::entity::Entity;

    fn datastore() -> Datastore {
        DatastoreFactory::create_in_memory().unwrap()
    }

    #[test]
    fn test_put_rejects_reserved_and_empty_names() {
        let store = datastore();

        let mut entity = store.create_entity();
        entity.set_property(KEY_FIELD, "x");
        assert!(matches!(
            store.put(&entity),
            Err(DocketError::InvalidArgument(_))
        ));

        let mut entity = store.create_entity();
        entity.set_property("", "x");
        assert!(matches!(
            store.put(&entity),
            Err(DocketError::InvalidArgument(_))
        ));

        let entity = Entity::with_id(String::new(), store.analyzer.clone());
        assert!(matches!(
            store.put(&entity),
            Err(DocketError::InvalidArgument(_))
        ));
        assert!(store.get_all_entities().unwrap().is_empty());
    }

    #[test]
    fn test_key_field_is_hidden_from_entities() {
        let store = datastore();
        let mut entity = store.create_entity();
        entity.set_property("name", "Alice");
        store.put(&entity).unwrap();

        let loaded = store.get(entity.id()).unwrap();
        assert!(!loaded.has_property(KEY_FIELD));
        assert_eq!(loaded.id(), entity.id());
        assert!(loaded.score().is_none());
    }

    #[test]
    fn test_query_string_on_key_field_is_exact() {
        let store = datastore();
        let mut entity = store.create_entity();
        entity.set_property("name", "Alice");
        store.put(&entity).unwrap();

        let query = format!("{KEY_FIELD}:\"{}\"", entity.id());
        let found = store.search_entity(&query).unwrap();
        assert_eq!(found.id(), entity.id());
        assert!(found.score().is_some());
    }

    #[test]
    fn test_create_and_save_sets_created_once() {
        let store = datastore();
        let mut given = HashMap::new();
        given.insert("name", "Bob");
        given.insert("created", "yesterday");
        store.create_and_save_entity(&given).unwrap();
        store.create_and_save_entity([("name", "Carol")]).unwrap();

        let bob = store.search_fields([("name", "Bob")]).unwrap();
        assert_eq!(bob[0].property("created").unwrap(), "yesterday");

        let carol = store.search_fields([("name", "Carol")]).unwrap();
        let created = carol[0].property("created").unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(created).is_ok());
    }

    #[test]
    fn test_empty_field_map_matches_nothing() {
        let store = datastore();
        store.create_and_save_entity([("name", "Alice")]).unwrap();
        let none: [(&str, &str); 0] = [];
        assert!(store.search_fields(none).unwrap().is_empty());
    }

    #[test]
    fn test_closed_datastore() {
        let store = datastore();
        store.close().unwrap();
        assert!(store.is_closed());
        assert!(matches!(store.get("x"), Err(DocketError::Closed)));
        assert!(matches!(
            store.put(&store.create_entity()),
            Err(DocketError::Closed)
        ));
    }
}
