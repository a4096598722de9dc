//! Keyword analyzer: the whole input is one token.

use crate::analysis::analyzer::Analyzer;
use crate::analysis::token::Token;

/// Emits the entire input as a single token.
#[derive(Debug, Clone, Default)]
pub struct KeywordAnalyzer;

impl KeywordAnalyzer {
    pub const NAME: &'static str = "keyword";

    pub fn new() -> Self {
        KeywordAnalyzer
    }
}

impl Analyzer for KeywordAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Token> {
        vec![Token::new(text, 0)]
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
