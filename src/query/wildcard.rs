//! Wildcard patterns over indexed terms.

use std::sync::Arc;

use regex::Regex;

use crate::error::{DocketError, Result};

/// Matches terms of a field against a wildcard pattern.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
/// - `\*` and `\?` match literal `*` and `?`
#[derive(Debug, Clone)]
pub struct WildcardQuery {
    field: String,
    pattern: String,
    regex: Arc<Regex>,
}

impl WildcardQuery {
    pub fn new<S: Into<String>>(field: S, pattern: S) -> Result<Self> {
        let field = field.into();
        let pattern = pattern.into();
        let regex = Regex::new(&Self::compile_pattern(&pattern)).map_err(|e| {
            DocketError::query_syntax(format!("invalid wildcard pattern '{pattern}': {e}"))
        })?;

        Ok(WildcardQuery {
            field,
            pattern,
            regex: Arc::new(regex),
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// True if `pattern` has an unescaped `*` or `?`.
    pub fn has_wildcard(pattern: &str) -> bool {
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '*' | '?' => return true,
                _ => {}
            }
        }
        false
    }

    /// Check if a term matches the pattern.
    pub fn matches(&self, term: &str) -> bool {
        self.regex.is_match(term)
    }

    /// Translate the pattern into an anchored regex.
    fn compile_pattern(pattern: &str) -> String {
        let mut regex_pattern = String::with_capacity(pattern.len() + 8);
        regex_pattern.push('^');

        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped) => regex_pattern.push_str(&regex::escape(&escaped.to_string())),
                    None => regex_pattern.push_str(r"\\"),
                },
                '*' => regex_pattern.push_str(".*"),
                '?' => regex_pattern.push('.'),
                c => regex_pattern.push_str(&regex::escape(&c.to_string())),
            }
        }

        regex_pattern.push('$');
        regex_pattern
    }
}

impl PartialEq for WildcardQuery {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.pattern == other.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_pattern_compilation() {
        let query = WildcardQuery::new("field", "hello*").unwrap();
        assert!(query.matches("hello"));
        assert!(query.matches("helloworld"));
        assert!(!query.matches("hell"));

        let query = WildcardQuery::new("field", "h?llo").unwrap();
        assert!(query.matches("hello"));
        assert!(query.matches("hallo"));
        assert!(!query.matches("heello"));

        let query = WildcardQuery::new("field", "h*l?o").unwrap();
        assert!(query.matches("heeello"));
        assert!(query.matches("hllo"));
    }

    #[test]
    fn test_escaped_wildcards() {
        let query = WildcardQuery::new("field", "hello\\*world").unwrap();
        assert!(query.matches("hello*world"));
        assert!(!query.matches("hello123world"));
        assert!(!WildcardQuery::has_wildcard("hello\\*world"));
        assert!(WildcardQuery::has_wildcard("hel*"));
    }

    #[test]
    fn test_special_regex_characters() {
        let query = WildcardQuery::new("field", "hello.world").unwrap();
        assert!(query.matches("hello.world"));
        assert!(!query.matches("helloxworld"));

        let query = WildcardQuery::new("field", "a+b(c)").unwrap();
        assert!(query.matches("a+b(c)"));
    }
}
