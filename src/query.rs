//! Structured queries.
//!
//! A [`Query`] is an engine-independent description of what to match. It is
//! produced by [`QueryBuilder`], by [`QueryParser`] from a query string, or
//! directly by callers, and is evaluated by an
//! [`IndexAdapter`](crate::index::IndexAdapter).

pub mod builder;
pub mod parser;
pub mod wildcard;

pub use builder::QueryBuilder;
pub use parser::QueryParser;
pub use wildcard::WildcardQuery;

use std::fmt;

/// A query tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Documents whose `field` contains exactly the term `term`.
    Term { field: String, term: String },
    /// Documents whose `field` contains `terms` at consecutive positions.
    Phrase { field: String, terms: Vec<String> },
    /// Documents with a term in the field matching a `*`/`?` pattern.
    Wildcard(WildcardQuery),
    /// Documents whose stored `field` value contains `value` as a substring.
    Contains { field: String, value: String },
    /// Documents with a value of `field` within bounds.
    Range(RangeQuery),
    /// A boolean combination of clauses.
    Boolean(BooleanQuery),
    /// Every live document.
    MatchAll,
}

impl Query {
    pub fn term(field: impl Into<String>, term: impl Into<String>) -> Self {
        Query::Term {
            field: field.into(),
            term: term.into(),
        }
    }

    pub fn phrase<S: Into<String>>(field: impl Into<String>, terms: Vec<S>) -> Self {
        Query::Phrase {
            field: field.into(),
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    /// The field this query targets, if it targets exactly one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Query::Term { field, .. }
            | Query::Phrase { field, .. }
            | Query::Contains { field, .. } => Some(field),
            Query::Wildcard(q) => Some(q.field()),
            Query::Range(q) => Some(&q.field),
            Query::Boolean(_) | Query::MatchAll => None,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Term { field, term } => write!(f, "{field}:{term}"),
            Query::Phrase { field, terms } => write!(f, "{field}:\"{}\"", terms.join(" ")),
            Query::Wildcard(q) => write!(f, "{}:{}", q.field(), q.pattern()),
            Query::Contains { field, value } => write!(f, "{field}:*{value}*"),
            Query::Range(q) => write!(
                f,
                "{}:{}{} TO {}{}",
                q.field,
                if q.include_lower { '[' } else { '{' },
                q.lower.as_deref().unwrap_or("*"),
                q.upper.as_deref().unwrap_or("*"),
                if q.include_upper { ']' } else { '}' },
            ),
            Query::Boolean(q) => {
                f.write_str("(")?;
                for (i, clause) in q.clauses().iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    match clause.occur {
                        Occur::Must => f.write_str("+")?,
                        Occur::MustNot => f.write_str("-")?,
                        Occur::Filter => f.write_str("#")?,
                        Occur::Should => {}
                    }
                    write!(f, "{}", clause.query)?;
                }
                f.write_str(")")
            }
            Query::MatchAll => f.write_str("*:*"),
        }
    }
}

/// Bounds over a field's values.
///
/// Bounds are compared numerically against numeric fields when they parse as
/// numbers, and lexicographically against indexed terms otherwise. `None`
/// leaves a side open.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    pub field: String,
    pub lower: Option<String>,
    pub upper: Option<String>,
    pub include_lower: bool,
    pub include_upper: bool,
}

impl RangeQuery {
    /// An inclusive range.
    pub fn new(
        field: impl Into<String>,
        lower: Option<String>,
        upper: Option<String>,
    ) -> Self {
        Self {
            field: field.into(),
            lower,
            upper,
            include_lower: true,
            include_upper: true,
        }
    }

    /// An inclusive numeric range.
    pub fn numeric(field: impl Into<String>, lower: Option<f64>, upper: Option<f64>) -> Self {
        Self::new(
            field,
            lower.map(|v| v.to_string()),
            upper.map(|v| v.to_string()),
        )
    }

    pub fn exclusive(mut self) -> Self {
        self.include_lower = false;
        self.include_upper = false;
        self
    }
}

impl From<RangeQuery> for Query {
    fn from(q: RangeQuery) -> Self {
        Query::Range(q)
    }
}

/// Occurrence requirements for boolean clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// The clause must match (AND).
    Must,
    /// The clause should match (OR).
    Should,
    /// The clause must not match (NOT).
    MustNot,
    /// The clause must match but does not contribute to scoring.
    Filter,
}

/// A clause in a boolean query.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanClause {
    pub query: Query,
    pub occur: Occur,
}

impl BooleanClause {
    pub fn new(query: Query, occur: Occur) -> Self {
        BooleanClause { query, occur }
    }
}

/// Combines clauses with boolean logic.
///
/// Matching rules:
/// - every `Must` and `Filter` clause has to match;
/// - without required clauses, at least one `Should` clause has to match;
/// - no `MustNot` clause may match;
/// - a query made only of `MustNot` clauses matches every other document;
/// - an empty query matches nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BooleanQuery {
    clauses: Vec<BooleanClause>,
}

impl BooleanQuery {
    pub fn new() -> Self {
        BooleanQuery {
            clauses: Vec::new(),
        }
    }

    pub fn add_clause(&mut self, clause: BooleanClause) {
        self.clauses.push(clause);
    }

    pub fn add_must(&mut self, query: Query) {
        self.add_clause(BooleanClause::new(query, Occur::Must));
    }

    pub fn add_should(&mut self, query: Query) {
        self.add_clause(BooleanClause::new(query, Occur::Should));
    }

    pub fn add_must_not(&mut self, query: Query) {
        self.add_clause(BooleanClause::new(query, Occur::MustNot));
    }

    pub fn add_filter(&mut self, query: Query) {
        self.add_clause(BooleanClause::new(query, Occur::Filter));
    }

    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Clauses with the given occurrence.
    pub fn clauses_by_occur(&self, occur: Occur) -> impl Iterator<Item = &BooleanClause> {
        self.clauses.iter().filter(move |c| c.occur == occur)
    }
}

impl From<BooleanQuery> for Query {
    fn from(q: BooleanQuery) -> Self {
        Query::Boolean(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let mut bq = BooleanQuery::new();
        bq.add_must(Query::term("city", "Paris"));
        bq.add_must_not(Query::phrase("name", vec!["joe", "doe"]));
        bq.add_should(RangeQuery::numeric("age", Some(18.0), None).into());
        assert_eq!(
            Query::Boolean(bq).to_string(),
            "(+city:Paris -name:\"joe doe\" age:[18 TO *])"
        );
    }

    #[test]
    fn test_clauses_by_occur() {
        let mut bq = BooleanQuery::new();
        bq.add_must(Query::term("a", "1"));
        bq.add_filter(Query::term("b", "2"));
        bq.add_must(Query::term("c", "3"));
        assert_eq!(bq.clauses_by_occur(Occur::Must).count(), 2);
        assert_eq!(bq.clauses_by_occur(Occur::Filter).count(), 1);
        assert_eq!(Query::term("a", "1").field(), Some("a"));
    }
}
