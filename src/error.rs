//! Error types for Docket.
//!
//! Every fallible operation returns [`Result`], whose error side is
//! [`DocketError`]. The variants are split by recoverability so callers can
//! branch on them: a missing entity is not a programming error, and neither of
//! those is a storage failure.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DocketError>;

/// The error type for all Docket operations.
#[derive(Debug, Error)]
pub enum DocketError {
    /// A missing entity, a missing property, or an empty result where one
    /// was required.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller passed something that can never succeed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A typed accessor was used on a property of another type.
    #[error("type mismatch for '{name}': expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A query string or wildcard pattern could not be parsed.
    #[error("query syntax error: {0}")]
    QuerySyntax(String),

    /// I/O failure in the backing storage.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored file could not be (de)serialized.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The index is inconsistent or references something unknown.
    #[error("index error: {0}")]
    Index(String),

    /// The datastore (or its index) has been closed.
    #[error("datastore is closed")]
    Closed,
}

impl DocketError {
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        DocketError::NotFound(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        DocketError::InvalidArgument(msg.into())
    }

    pub fn type_mismatch<S: Into<String>>(
        name: S,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        DocketError::TypeMismatch {
            name: name.into(),
            expected,
            found,
        }
    }

    pub fn query_syntax<S: Into<String>>(msg: S) -> Self {
        DocketError::QuerySyntax(msg.into())
    }

    pub fn index<S: Into<String>>(msg: S) -> Self {
        DocketError::Index(msg.into())
    }

    /// True for failures of the underlying engine or its storage
    /// (disk, corruption, serialization).
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            DocketError::Io(_) | DocketError::Json(_) | DocketError::Index(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DocketError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = DocketError::not_found("entity 42");
        assert!(err.is_not_found());
        assert!(!err.is_storage_error());
        assert_eq!(err.to_string(), "not found: entity 42");

        let err = DocketError::type_mismatch("age", "long", "text");
        assert_eq!(
            err.to_string(),
            "type mismatch for 'age': expected long, found text"
        );

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: DocketError = io.into();
        assert!(err.is_storage_error());
    }
}
