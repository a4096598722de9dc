//! Whitespace analyzer: splits on Unicode whitespace, keeps case.

use crate::analysis::analyzer::Analyzer;
use crate::analysis::token::Token;

/// Splits text on whitespace without any normalization.
///
/// This is the default analyzer: `"Hello World"` indexes the terms
/// `Hello` and `World`.
#[derive(Debug, Clone, Default)]
pub struct WhitespaceAnalyzer;

impl WhitespaceAnalyzer {
    pub const NAME: &'static str = "whitespace";

    pub fn new() -> Self {
        WhitespaceAnalyzer
    }
}

impl Analyzer for WhitespaceAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Token> {
        text.split_whitespace()
            .enumerate()
            .map(|(position, word)| Token::new(word, position))
            .collect()
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_analyzer() {
        let tokens = WhitespaceAnalyzer::new().analyze("  Hello   brave\tWorld ");
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "brave", "World"]);
        assert_eq!(tokens[2].position, 2);
    }
}
