//! Property encoding between entities and index documents.
//!
//! A [`Document`] is what the index stores: an ordered list of [`Field`]s,
//! each carrying a typed value and, for text, the name of the analyzer that
//! tokenizes it. [`PropertyCodec`] is the only place that writes or reads
//! fields, so type metadata is always recorded and always checked.

use serde::{Deserialize, Serialize};

use crate::analysis::{Analyzer, KeywordAnalyzer, Token, analyzer_by_name};
use crate::data::{PropertyType, PropertyValue};
use crate::error::{DocketError, Result};

/// A single named, typed field of a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: PropertyValue,
    /// Analyzer used to index a `Text` value. `None` for the other types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
}

impl Field {
    pub fn property_type(&self) -> PropertyType {
        self.value.property_type()
    }
}

/// An index document: fields in storage order, names unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    fields: Vec<Field>,
}

impl Document {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Field names in storage order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Remove a field. Removing an absent name leaves the document unchanged.
    pub fn remove_field(&mut self, name: &str) -> Option<Field> {
        let pos = self.fields.iter().position(|f| f.name == name)?;
        Some(self.fields.remove(pos))
    }

    fn replace(&mut self, field: Field) {
        self.remove_field(&field.name);
        self.fields.push(field);
    }
}

/// Encodes typed properties into document fields and decodes them back.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyCodec;

impl PropertyCodec {
    /// Set an analyzed text field, replacing any field of the same name.
    pub fn encode_text(doc: &mut Document, name: &str, value: &str, analyzer: &dyn Analyzer) {
        doc.replace(Field {
            name: name.to_string(),
            value: PropertyValue::Text(value.to_string()),
            analyzer: Some(analyzer.name().to_string()),
        });
    }

    /// Set a single-token keyword field, replacing any field of the same name.
    pub fn encode_keyword(doc: &mut Document, name: &str, value: &str) {
        doc.replace(Field {
            name: name.to_string(),
            value: PropertyValue::Keyword(value.to_string()),
            analyzer: None,
        });
    }

    /// Set an integer field, replacing any field of the same name.
    pub fn encode_long(doc: &mut Document, name: &str, value: i64) {
        doc.replace(Field {
            name: name.to_string(),
            value: PropertyValue::Long(value),
            analyzer: None,
        });
    }

    /// Set a floating-point field, replacing any field of the same name.
    pub fn encode_double(doc: &mut Document, name: &str, value: f64) {
        doc.replace(Field {
            name: name.to_string(),
            value: PropertyValue::Double(value),
            analyzer: None,
        });
    }

    pub fn has_field(doc: &Document, name: &str) -> bool {
        doc.field(name).is_some()
    }

    /// Decode a field expecting `expected`.
    ///
    /// Text and keyword are interchangeable for decoding, and a long widens to
    /// a double. A double never narrows to a long.
    pub fn decode(field: &Field, expected: PropertyType) -> Result<&PropertyValue> {
        let found = field.property_type();
        let compatible = match expected {
            PropertyType::Text | PropertyType::Keyword => found.is_textual(),
            PropertyType::Double => matches!(found, PropertyType::Long | PropertyType::Double),
            PropertyType::Long => found == PropertyType::Long,
        };
        if compatible {
            Ok(&field.value)
        } else {
            Err(Self::mismatch(field, expected))
        }
    }

    pub fn decode_text<'a>(doc: &'a Document, name: &str) -> Result<&'a str> {
        let field = Self::lookup(doc, name)?;
        field
            .value
            .as_text()
            .ok_or_else(|| Self::mismatch(field, PropertyType::Text))
    }

    pub fn decode_long(doc: &Document, name: &str) -> Result<i64> {
        let field = Self::lookup(doc, name)?;
        field
            .value
            .as_long()
            .ok_or_else(|| Self::mismatch(field, PropertyType::Long))
    }

    pub fn decode_double(doc: &Document, name: &str) -> Result<f64> {
        let field = Self::lookup(doc, name)?;
        field
            .value
            .as_f64()
            .ok_or_else(|| Self::mismatch(field, PropertyType::Double))
    }

    /// The terms to index for a field.
    ///
    /// Text uses the analyzer recorded on the field, not the caller's
    /// default. Keywords and numbers produce a single term.
    pub fn index_tokens(field: &Field) -> Result<Vec<Token>> {
        match &field.value {
            PropertyValue::Text(text) => {
                let name = field.analyzer.as_deref().unwrap_or(KeywordAnalyzer::NAME);
                let analyzer = analyzer_by_name(name).map_err(|_| {
                    DocketError::index(format!(
                        "field '{}' was indexed with unknown analyzer '{name}'",
                        field.name
                    ))
                })?;
                Ok(analyzer.analyze(text))
            }
            PropertyValue::Keyword(text) => Ok(vec![Token::new(text.as_str(), 0)]),
            PropertyValue::Long(_) | PropertyValue::Double(_) => {
                Ok(vec![Token::new(field.value.to_string(), 0)])
            }
        }
    }

    fn mismatch(field: &Field, expected: PropertyType) -> DocketError {
        DocketError::type_mismatch(
            &field.name,
            expected.as_str(),
            field.property_type().as_str(),
        )
    }

    fn lookup<'a>(doc: &'a Document, name: &str) -> Result<&'a Field> {
        doc.field(name)
            .ok_or_else(|| DocketError::not_found(format!("property '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{StandardAnalyzer, WhitespaceAnalyzer};

    #[test]
    fn test_encode_replaces_same_name() {
        let mut doc = Document::new();
        PropertyCodec::encode_text(&mut doc, "name", "Alice", &WhitespaceAnalyzer::new());
        PropertyCodec::encode_long(&mut doc, "name", 7);
        PropertyCodec::encode_long(&mut doc, "name", 8);

        assert_eq!(doc.len(), 1);
        assert_eq!(PropertyCodec::decode_long(&doc, "name").unwrap(), 8);
        assert!(doc.field("name").unwrap().analyzer.is_none());
    }

    #[test]
    fn test_decode_type_mismatch() {
        let mut doc = Document::new();
        PropertyCodec::encode_text(&mut doc, "city", "Paris", &WhitespaceAnalyzer::new());
        PropertyCodec::encode_double(&mut doc, "weight", 32.4);

        assert!(matches!(
            PropertyCodec::decode_long(&doc, "city"),
            Err(DocketError::TypeMismatch { .. })
        ));
        assert!(matches!(
            PropertyCodec::decode_text(&doc, "weight"),
            Err(DocketError::TypeMismatch { .. })
        ));
        assert!(matches!(
            PropertyCodec::decode_long(&doc, "weight"),
            Err(DocketError::TypeMismatch { .. })
        ));
        assert!(matches!(
            PropertyCodec::decode_text(&doc, "missing"),
            Err(DocketError::NotFound(_))
        ));
        assert!(!PropertyCodec::has_field(&doc, "missing"));
    }

    #[test]
    fn test_long_widens_to_double() {
        let mut doc = Document::new();
        PropertyCodec::encode_long(&mut doc, "age", 30);
        PropertyCodec::encode_double(&mut doc, "ratio", 2.0);

        assert_eq!(PropertyCodec::decode_double(&doc, "age").unwrap(), 30.0);
        let age = doc.field("age").unwrap();
        assert_eq!(
            PropertyCodec::decode(age, PropertyType::Double).unwrap(),
            &PropertyValue::Long(30)
        );

        // Doubles never narrow, even when integral.
        assert!(matches!(
            PropertyCodec::decode_long(&doc, "ratio"),
            Err(DocketError::TypeMismatch { .. })
        ));
        let ratio = doc.field("ratio").unwrap();
        assert!(PropertyCodec::decode(ratio, PropertyType::Long).is_err());
    }

    #[test]
    fn test_index_tokens_use_recorded_analyzer() {
        let mut doc = Document::new();
        PropertyCodec::encode_text(&mut doc, "title", "Hello World", &StandardAnalyzer::new());
        PropertyCodec::encode_keyword(&mut doc, "tag", "Hello World");
        PropertyCodec::encode_double(&mut doc, "score", 30.0);

        let texts = |name: &str| -> Vec<String> {
            PropertyCodec::index_tokens(doc.field(name).unwrap())
                .unwrap()
                .into_iter()
                .map(|t| t.text)
                .collect()
        };
        assert_eq!(texts("title"), vec!["hello", "world"]);
        assert_eq!(texts("tag"), vec!["Hello World"]);
        assert_eq!(texts("score"), vec!["30"]);
    }

    #[test]
    fn test_unknown_analyzer_is_index_error() {
        let json = r#"{"fields":[{"name":"t","value":{"Text":"x"},"analyzer":"klingon"}]}"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        let err = PropertyCodec::index_tokens(&doc.fields()[0]).unwrap_err();
        assert!(err.is_storage_error());
    }
}
