//! Standard analyzer: Unicode word segmentation, NFKC, lowercase.

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::token::Token;

/// Splits text on Unicode word boundaries (UAX #29), normalizes to NFKC and
/// lowercases each word. Punctuation is dropped.
#[derive(Debug, Clone, Default)]
pub struct StandardAnalyzer;

impl StandardAnalyzer {
    pub const NAME: &'static str = "standard";

    pub fn new() -> Self {
        StandardAnalyzer
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Token> {
        let normalized: String = text.nfkc().collect();
        normalized
            .unicode_words()
            .enumerate()
            .map(|(position, word)| Token::new(word.to_lowercase(), position))
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
    fn test_standard_analyzer() {
        let tokens = StandardAnalyzer::new().analyze("Hello, World! Rust's great.");
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "world", "rust's", "great"]);
    }

    #[test]
    fn test_standard_analyzer_normalizes_width() {
        // Full-width letters fold to ASCII under NFKC.
        let tokens = StandardAnalyzer::new().analyze("ＲＵＳＴ");
        assert_eq!(tokens[0].text, "rust");
    }
}
