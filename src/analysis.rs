//! Text analysis.
//!
//! Analyzers turn a text property into the terms that get indexed. Each one
//! has a stable name; [`analyzer_by_name`] resolves a recorded name back to
//! an analyzer so stored documents are always re-tokenized with the scheme
//! they were written with.
//!
//! - [`WhitespaceAnalyzer`] (`"whitespace"`, the default)
//! - [`KeywordAnalyzer`] (`"keyword"`)
//! - [`StandardAnalyzer`] (`"standard"`)

pub mod analyzer;
pub mod keyword;
pub mod standard;
pub mod token;
pub mod whitespace;

use std::sync::Arc;

use crate::error::{DocketError, Result};

pub use analyzer::Analyzer;
pub use keyword::KeywordAnalyzer;
pub use standard::StandardAnalyzer;
pub use token::Token;
pub use whitespace::WhitespaceAnalyzer;

/// Resolve an analyzer from its recorded name.
pub fn analyzer_by_name(name: &str) -> Result<Arc<dyn Analyzer>> {
    match name {
        WhitespaceAnalyzer::NAME => Ok(Arc::new(WhitespaceAnalyzer::new())),
        KeywordAnalyzer::NAME => Ok(Arc::new(KeywordAnalyzer::new())),
        StandardAnalyzer::NAME => Ok(Arc::new(StandardAnalyzer::new())),
        other => Err(DocketError::invalid_argument(format!(
            "unknown analyzer '{other}'"
        ))),
    }
}
