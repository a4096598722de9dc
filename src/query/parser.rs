//! Query-string parser.
//!
//! Parses strings such as `city:Paris AND (name:Al* OR -age:[* TO 18})`
//! into a [`Query`].
//!
//! # Supported Syntax
//!
//! - `term`, `field:term`: exact term, analyzed with the field's analyzer
//! - `"several words"`: phrase
//! - `te*m`, `te?m`: wildcard (not analyzed)
//! - `[a TO b]`, `{a TO b}`, `[* TO b]`: inclusive/exclusive ranges
//! - `+clause`, `-clause`, `!clause`, `NOT clause`: required / prohibited
//! - `a AND b`, `a && b`, `a OR b`, `a || b`, `a b`: juxtaposition is OR
//! - `(...)` grouping, `field:(...)` applies a field to a group
//! - `*:*`: every document
//! - `\` escapes the next character

use std::collections::HashMap;
use std::sync::Arc;

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::analysis::{Analyzer, WhitespaceAnalyzer};
use crate::error::{DocketError, Result};
use crate::query::{BooleanClause, BooleanQuery, Occur, Query, RangeQuery, WildcardQuery};

#[derive(Parser)]
#[grammar = "query/parser.pest"]
struct QueryStringParser;

/// Default field used when a clause has no `field:` prefix.
pub const DEFAULT_FIELD: &str = "content";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conjunction {
    None,
    And,
    Or,
}

/// Turns query strings into [`Query`] trees.
#[derive(Debug, Clone)]
pub struct QueryParser {
    analyzer: Arc<dyn Analyzer>,
    field_analyzers: HashMap<String, Arc<dyn Analyzer>>,
    default_field: String,
}

impl QueryParser {
    /// Create a parser that analyzes terms with `analyzer`.
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            analyzer,
            field_analyzers: HashMap::new(),
            default_field: DEFAULT_FIELD.to_string(),
        }
    }

    pub fn with_default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = field.into();
        self
    }

    /// Analyze terms of `field` with a specific analyzer.
    pub fn with_field_analyzer(
        mut self,
        field: impl Into<String>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Self {
        self.field_analyzers.insert(field.into(), analyzer);
        self
    }

    /// Parse a query string.
    ///
    /// Fails with [`DocketError::QuerySyntax`] on malformed input, including
    /// the empty string.
    pub fn parse(&self, query_str: &str) -> Result<Query> {
        let mut pairs = QueryStringParser::parse(Rule::query, query_str)
            .map_err(|e| DocketError::query_syntax(e.to_string()))?;

        let expr = pairs
            .next()
            .and_then(|query| query.into_inner().find(|p| p.as_rule() == Rule::expr))
            .ok_or_else(|| DocketError::query_syntax("empty query"))?;

        self.build_expr(expr, &self.default_field)
    }

    fn analyzer_for(&self, field: &str) -> &dyn Analyzer {
        self.field_analyzers
            .get(field)
            .map(|a| a.as_ref())
            .unwrap_or(self.analyzer.as_ref())
    }

    fn build_expr(&self, pair: Pair<Rule>, field: &str) -> Result<Query> {
        let mut clauses: Vec<BooleanClause> = Vec::new();
        let mut conjunction = Conjunction::None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::and_op => conjunction = Conjunction::And,
                Rule::or_op => conjunction = Conjunction::Or,
                Rule::clause => {
                    let (modifier, query) = self.build_clause(inner, field)?;

                    // `a AND b` makes `a` required unless it is prohibited.
                    if conjunction == Conjunction::And {
                        if let Some(prev) = clauses.last_mut() {
                            if prev.occur == Occur::Should {
                                prev.occur = Occur::Must;
                            }
                        }
                    }

                    let occur = match modifier {
                        Some(occur) => occur,
                        None if conjunction == Conjunction::And => Occur::Must,
                        None => Occur::Should,
                    };
                    if let Some(query) = query {
                        clauses.push(BooleanClause::new(query, occur));
                    }
                    conjunction = Conjunction::None;
                }
                _ => {}
            }
        }

        if clauses.len() == 1 && clauses[0].occur == Occur::Should {
            if let Some(clause) = clauses.pop() {
                return Ok(clause.query);
            }
        }

        let mut query = BooleanQuery::new();
        for clause in clauses {
            query.add_clause(clause);
        }
        Ok(Query::Boolean(query))
    }

    /// Returns the clause modifier and its query. The query is `None` when
    /// analysis leaves no terms (e.g. punctuation only).
    fn build_clause(
        &self,
        pair: Pair<Rule>,
        default_field: &str,
    ) -> Result<(Option<Occur>, Option<Query>)> {
        let mut modifier = None;
        let mut field = default_field.to_string();
        let mut query = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::must_mod => modifier = Some(Occur::Must),
                Rule::must_not_mod => modifier = Some(Occur::MustNot),
                Rule::match_all => query = Some(Query::MatchAll),
                Rule::field_prefix => {
                    if let Some(name) = inner.into_inner().find(|p| p.as_rule() == Rule::field_name)
                    {
                        field = name.as_str().to_string();
                    }
                }
                Rule::group => {
                    if let Some(expr) = inner.into_inner().find(|p| p.as_rule() == Rule::expr) {
                        query = Some(self.build_expr(expr, &field)?);
                    }
                }
                Rule::phrase => {
                    let text = inner
                        .into_inner()
                        .find(|p| p.as_rule() == Rule::phrase_inner)
                        .map(|p| unescape(p.as_str()))
                        .unwrap_or_default();
                    query = self.analyzed_query(&field, &text);
                }
                Rule::range => query = Some(Self::build_range(inner, &field)?),
                Rule::term => {
                    let raw = inner.as_str();
                    query = if WildcardQuery::has_wildcard(raw) {
                        Some(Query::Wildcard(WildcardQuery::new(field.as_str(), raw)?))
                    } else {
                        self.analyzed_query(&field, &unescape(raw))
                    };
                }
                _ => {}
            }
        }

        Ok((modifier, query))
    }

    fn build_range(pair: Pair<Rule>, field: &str) -> Result<Query> {
        let mut include_lower = true;
        let mut include_upper = true;
        let mut bounds = Vec::with_capacity(2);

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::range_open => include_lower = inner.as_str() == "[",
                Rule::range_close => include_upper = inner.as_str() == "]",
                Rule::range_bound => {
                    let bound = inner.as_str();
                    bounds.push((bound != "*").then(|| unescape(bound)));
                }
                _ => {}
            }
        }

        let [lower, upper]: [Option<String>; 2] = bounds
            .try_into()
            .map_err(|_| DocketError::query_syntax("range needs two bounds"))?;

        Ok(Query::Range(RangeQuery {
            field: field.to_string(),
            lower,
            upper,
            include_lower,
            include_upper,
        }))
    }

    /// One token gives a term query, several give a phrase.
    fn analyzed_query(&self, field: &str, text: &str) -> Option<Query> {
        let mut terms: Vec<String> = self
            .analyzer_for(field)
            .analyze(text)
            .into_iter()
            .map(|t| t.text)
            .collect();

        match terms.len() {
            0 => None,
            1 => terms.pop().map(|term| Query::term(field, term)),
            _ => Some(Query::phrase(field, terms)),
        }
    }
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new(Arc::new(WhitespaceAnalyzer::new()))
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{KeywordAnalyzer, StandardAnalyzer};

    fn parse(s: &str) -> Query {
        QueryParser::default().parse(s).unwrap()
    }

    fn clauses(query: Query) -> Vec<BooleanClause> {
        match query {
            Query::Boolean(bq) => bq.clauses().to_vec(),
            other => panic!("expected boolean query, got {other:?}"),
        }
    }

    #[test]
    fn test_single_term_uses_default_field() {
        assert_eq!(parse("hello"), Query::term("content", "hello"));
        assert_eq!(parse("name:Alice"), Query::term("name", "Alice"));
    }

    #[test]
    fn test_juxtaposition_is_or() {
        let clauses = clauses(parse("a b"));
        assert_eq!(clauses.len(), 2);
        assert!(clauses.iter().all(|c| c.occur == Occur::Should));
    }

    #[test]
    fn test_and_makes_both_required() {
        let clauses = clauses(parse("city:Paris AND name:Alice OR x"));
        assert_eq!(clauses[0].occur, Occur::Must);
        assert_eq!(clauses[1].occur, Occur::Must);
        assert_eq!(clauses[2].occur, Occur::Should);

        let clauses = clauses_of("a && b");
        assert!(clauses.iter().all(|c| c.occur == Occur::Must));
    }

    fn clauses_of(s: &str) -> Vec<BooleanClause> {
        clauses(parse(s))
    }

    #[test]
    fn test_modifiers() {
        let clauses = clauses_of("+a -b NOT c !d");
        let occurs: Vec<_> = clauses.iter().map(|c| c.occur).collect();
        assert_eq!(
            occurs,
            vec![Occur::Must, Occur::MustNot, Occur::MustNot, Occur::MustNot]
        );
        // A term merely starting with a keyword is a term.
        assert_eq!(parse("ANDROID"), Query::term("content", "ANDROID"));
        assert_eq!(parse("a-b"), Query::term("content", "a-b"));
    }

    #[test]
    fn test_phrase_and_multi_token_terms() {
        assert_eq!(
            parse("title:\"hello big world\""),
            Query::phrase("title", vec!["hello", "big", "world"])
        );

        let parser = QueryParser::new(Arc::new(StandardAnalyzer::new()));
        assert_eq!(
            parser.parse("title:Hello,World").unwrap(),
            Query::phrase("title", vec!["hello", "world"])
        );
    }

    #[test]
    fn test_wildcards_are_not_analyzed() {
        let parser = QueryParser::new(Arc::new(StandardAnalyzer::new()));
        let Query::Wildcard(q) = parser.parse("name:Al*").unwrap() else {
            panic!("expected wildcard");
        };
        assert_eq!(q.field(), "name");
        assert_eq!(q.pattern(), "Al*");
        assert_eq!(parse("*:*"), Query::MatchAll);
    }

    #[test]
    fn test_ranges() {
        let Query::Range(q) = parse("age:[18 TO *}") else {
            panic!("expected range");
        };
        assert_eq!(q.field, "age");
        assert_eq!(q.lower.as_deref(), Some("18"));
        assert_eq!(q.upper, None);
        assert!(q.include_lower);
        assert!(!q.include_upper);
    }

    #[test]
    fn test_groups_inherit_field() {
        let clauses = clauses_of("+city:(Paris London) -name:joe");
        assert_eq!(clauses[0].occur, Occur::Must);
        let inner = match &clauses[0].query {
            Query::Boolean(bq) => bq.clauses().to_vec(),
            other => panic!("expected group, got {other:?}"),
        };
        assert_eq!(inner[0].query, Query::term("city", "Paris"));
        assert_eq!(inner[1].query, Query::term("city", "London"));
    }

    #[test]
    fn test_escapes_and_field_analyzers() {
        assert_eq!(parse(r"url:http\://x"), Query::term("url", "http://x"));

        let parser = QueryParser::default()
            .with_field_analyzer("_key", Arc::new(KeywordAnalyzer::new()))
            .with_default_field("_key");
        assert_eq!(
            parser.parse("\"two words\"").unwrap(),
            Query::term("_key", "two words")
        );
    }

    #[test]
    fn test_syntax_errors() {
        let parser = QueryParser::default();
        for bad in ["", "   ", "(a", "a)", "name:", "a AND", "\"open", "[1 TO", "NOT"] {
            let err = parser.parse(bad).unwrap_err();
            assert!(
                matches!(err, DocketError::QuerySyntax(_)),
                "'{bad}' should be a syntax error, got {err:?}"
            );
        }
    }
}
