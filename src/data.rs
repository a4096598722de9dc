use std::fmt;

use serde::{Deserialize, Serialize};

/// The type of a property, used in type-mismatch reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    Text,
    Keyword,
    Long,
    Double,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Text => "text",
            PropertyType::Keyword => "keyword",
            PropertyType::Long => "long",
            PropertyType::Double => "double",
        }
    }

    /// Text and keyword properties are textual; long and double are numeric.
    pub fn is_textual(&self) -> bool {
        matches!(self, PropertyType::Text | PropertyType::Keyword)
    }
}

/// A typed property value.
///
/// - `Text` is analyzed into terms for full-text search.
/// - `Keyword` is indexed as one exact-match term.
/// - `Long` and `Double` are indexed for exact and range queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Text(String),
    Keyword(String),
    Long(i64),
    Double(f64),
}

impl PropertyValue {
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::Text(_) => PropertyType::Text,
            PropertyValue::Keyword(_) => PropertyType::Keyword,
            PropertyValue::Long(_) => PropertyType::Long,
            PropertyValue::Double(_) => PropertyType::Double,
        }
    }

    /// Returns the string if this is a textual value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) | PropertyValue::Keyword(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is a `Long`.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            PropertyValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float if this is a `Double`.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            PropertyValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of a `Long` or `Double`, used by range queries.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Long(v) => Some(*v as f64),
            PropertyValue::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) | PropertyValue::Keyword(s) => f.write_str(s),
            PropertyValue::Long(v) => write!(f, "{v}"),
            PropertyValue::Double(v) => write!(f, "{v}"),
        }
    }
}

// --- Conversions ---

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Long(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Long(v as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Double(v)
    }
}
