//! Programmatic query construction.

use crate::query::{BooleanQuery, Query};

/// Builds a conjunctive query clause by clause.
///
/// Every clause is required. [`add_item`](QueryBuilder::add_item) asks for an
/// exact term; [`add_filter`](QueryBuilder::add_filter) asks for the stored
/// value to contain a substring.
///
/// ```
/// use docket::query::QueryBuilder;
///
/// let query = QueryBuilder::new()
///     .add_item("city", "Paris")
///     .add_filter("name", "li")
///     .build();
/// assert_eq!(query.to_string(), "(+city:Paris +name:*li*)");
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: BooleanQuery,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to hold the exact term `value`.
    pub fn add_item(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.add_must(Query::term(field, value));
        self
    }

    /// Require the stored value of `field` to contain `value`.
    pub fn add_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.add_must(Query::contains(field, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    pub fn build(self) -> Query {
        Query::Boolean(self.query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Occur;

    #[test]
    fn test_builder_clauses_are_required() {
        let query = QueryBuilder::new()
            .add_item("city", "Paris")
            .add_filter("name", "li")
            .build();

        let Query::Boolean(bq) = query else {
            panic!("expected boolean query");
        };
        assert_eq!(bq.clauses().len(), 2);
        assert!(bq.clauses().iter().all(|c| c.occur == Occur::Must));
        assert_eq!(bq.clauses()[0].query, Query::term("city", "Paris"));
        assert_eq!(bq.clauses()[1].query, Query::contains("name", "li"));
    }
}
