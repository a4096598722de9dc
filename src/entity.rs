//! Entities: typed property bags with a stable identifier.
//!
//! An [`Entity`] is always detached. Changing one has no effect on the store
//! until it is passed to [`Datastore::put`](crate::datastore::Datastore::put).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::codec::{Document, PropertyCodec};
use crate::data::{PropertyType, PropertyValue};
use crate::error::{DocketError, Result};

/// A set of named, typed properties identified by a UUID.
#[derive(Debug, Clone)]
pub struct Entity {
    id: String,
    document: Document,
    analyzer: Arc<dyn Analyzer>,
    score: Option<f32>,
}

impl Entity {
    /// A new, empty entity with a freshly generated id.
    pub(crate) fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), analyzer)
    }

    pub(crate) fn with_id(id: String, analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            id,
            document: Document::new(),
            analyzer,
            score: None,
        }
    }

    /// Rebuild an entity from a stored document whose key field has already
    /// been removed.
    pub(crate) fn from_document(
        id: String,
        document: Document,
        analyzer: Arc<dyn Analyzer>,
        score: Option<f32>,
    ) -> Self {
        Self {
            id,
            document,
            analyzer,
            score,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Score assigned by the ranked search that produced this entity.
    pub fn score(&self) -> Option<f32> {
        self.score
    }

    /// Name of the analyzer new text properties are indexed with.
    pub fn analyzer(&self) -> &str {
        self.analyzer.name()
    }

    pub(crate) fn document(&self) -> &Document {
        &self.document
    }

    /// Set an analyzed text property, replacing any property of that name.
    pub fn set_property(&mut self, name: &str, value: &str) -> &mut Self {
        PropertyCodec::encode_text(&mut self.document, name, value, self.analyzer.as_ref());
        self
    }

    /// Set a property matched only as a whole value.
    pub fn set_property_as_keyword(&mut self, name: &str, value: &str) -> &mut Self {
        PropertyCodec::encode_keyword(&mut self.document, name, value);
        self
    }

    pub fn set_property_as_long(&mut self, name: &str, value: i64) -> &mut Self {
        PropertyCodec::encode_long(&mut self.document, name, value);
        self
    }

    pub fn set_property_as_double(&mut self, name: &str, value: f64) -> &mut Self {
        PropertyCodec::encode_double(&mut self.document, name, value);
        self
    }

    /// The string value of a text or keyword property.
    pub fn property(&self, name: &str) -> Result<&str> {
        PropertyCodec::decode_text(&self.document, name)
    }

    pub fn get_long(&self, name: &str) -> Result<i64> {
        PropertyCodec::decode_long(&self.document, name)
    }

    pub fn get_double(&self, name: &str) -> Result<f64> {
        PropertyCodec::decode_double(&self.document, name)
    }

    /// The typed value of a property.
    pub fn value(&self, name: &str) -> Result<&PropertyValue> {
        self.document
            .field(name)
            .map(|field| &field.value)
            .ok_or_else(|| DocketError::not_found(format!("property '{name}'")))
    }

    pub fn property_type(&self, name: &str) -> Option<PropertyType> {
        self.document.field(name).map(|field| field.property_type())
    }

    pub fn has_property(&self, name: &str) -> bool {
        PropertyCodec::has_field(&self.document, name)
    }

    /// Remove a property; returns whether it existed.
    pub fn remove_property(&mut self, name: &str) -> bool {
        self.document.remove_field(name).is_some()
    }

    /// Property names in storage order. Replacing a property moves it last.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.document.field_names()
    }

    pub fn len(&self) -> usize {
        self.document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    /// The analyzer a text property was indexed with.
    pub fn analyzer_of(&self, name: &str) -> Option<&str> {
        self.document
            .field(name)
            .and_then(|field| field.analyzer.as_deref())
    }

    /// All properties rendered as strings.
    pub fn properties(&self) -> BTreeMap<String, String> {
        self.document
            .fields()
            .iter()
            .map(|field| (field.name.clone(), field.value.to_string()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Entity {
    type Item = &'a str;
    type IntoIter = Box<dyn Iterator<Item = &'a str> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.property_names())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "id: {}", self.id)?;
        for field in self.document.fields() {
            writeln!(f, "{}: {}", field.name, field.value)?;
        }
        Ok(())
    }
}
