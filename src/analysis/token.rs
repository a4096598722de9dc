//! Token representation produced by analyzers.

use serde::{Deserialize, Serialize};

/// A single token emitted by an [`Analyzer`](super::analyzer::Analyzer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The token text as it will be indexed.
    pub text: String,
    /// Position of the token within its field, starting at 0.
    pub position: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, position: usize) -> Self {
        Token {
            text: text.into(),
            position,
        }
    }
}
