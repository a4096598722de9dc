//! The analyzer trait.

use std::fmt::Debug;

use crate::analysis::token::Token;

/// A tokenization scheme.
///
/// Analyzers are identified by [`name`](Analyzer::name). The name is recorded
/// next to every text property so that a document can be re-tokenized the
/// same way it was indexed, whatever the reader's default analyzer is.
pub trait Analyzer: Send + Sync + Debug {
    /// Split `text` into tokens.
    fn analyze(&self, text: &str) -> Vec<Token>;

    /// Stable name of this analyzer.
    fn name(&self) -> &'static str;
}
