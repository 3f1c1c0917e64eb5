//! Triple-pattern query engine (C9, §4.9): turns the JSON body of an
//! `@query` directive into a [`QueryAst`] and runs it against a
//! [`ldc_store::TripleStore`].

#![forbid(unsafe_code)]

mod ast;
mod engine;
mod error;
mod parse;

pub use ast::{AggKind, OrderKey, Pattern, QueryAst, Row, SelectItem, Term, TriplePattern};
pub use error::{QueryError, Result};

/// Parses an `@query` directive body into a [`QueryAst`]. IRI/CURIE terms
/// are left unexpanded; callers that carry a context map should follow up
/// with [`QueryAst::expand_iris`].
pub fn parse(json: &serde_json::Value) -> Result<QueryAst> {
    parse::parse(json)
}

/// Runs `query` against `store`, producing result rows in the order
/// described by §4.9's pipeline.
pub fn execute(query: &QueryAst, store: &ldc_store::TripleStore) -> Result<Vec<Row>> {
    engine::execute(query, store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldc_store::{Triple, TripleStore};
    use serde_json::json;

    fn sample_store() -> TripleStore {
        let mut store = TripleStore::new();
        store.add(Triple::new("doc#alice", "role", "engineer"));
        store.add(Triple::new("doc#alice", "budget", "1200"));
        store.add(Triple::new("doc#bob", "role", "engineer"));
        store.add(Triple::new("doc#bob", "budget", "800"));
        store.add(Triple::new("doc#carol", "role", "manager"));
        store.add(Triple::new("doc#carol", "budget", "2000"));
        store
    }

    #[test]
    fn matches_a_simple_pattern() {
        let query = parse(&json!({
            "patterns": [
                {"s": "?person", "p": "role", "o": {"literal": "engineer"}}
            ],
            "select": ["?person"]
        }))
        .unwrap();
        let rows = execute(&query, &sample_store()).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn joins_across_two_patterns() {
        let query = parse(&json!({
            "patterns": [
                {"s": "?person", "p": "role", "o": {"literal": "engineer"}},
                {"s": "?person", "p": "budget", "o": "?budget"}
            ],
            "select": ["?person", "?budget"],
            "orderBy": ["asc ?person"]
        }))
        .unwrap();
        let rows = execute(&query, &sample_store()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].get("budget").and_then(|v| v.as_str()),
            Some("1200")
        );
    }

    #[test]
    fn filters_then_aggregates() {
        let query = parse(&json!({
            "patterns": [
                {"s": "?person", "p": "role", "o": "?role"},
                {"s": "?person", "p": "budget", "o": "?budget"}
            ],
            "groupBy": ["?role"],
            "select": [
                "?role",
                {"agg": "count", "as": "n"},
                {"agg": "sum", "expr": "toNumber(budget)", "as": "total"}
            ],
            "orderBy": ["asc ?role"]
        }))
        .unwrap();
        let rows = execute(&query, &sample_store()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("n").cloned(), Some(ldc_expr::Value::Int(2)));
    }

    #[test]
    fn optional_group_null_fills_unmatched_rows() {
        let mut store = sample_store();
        store.add(Triple::new("doc#dan", "role", "engineer"));
        let query = parse(&json!({
            "patterns": [
                {"s": "?person", "p": "role", "o": {"literal": "engineer"}},
                {"optional": [{"s": "?person", "p": "budget", "o": "?budget"}]}
            ],
            "select": ["?person", "?budget"]
        }))
        .unwrap();
        let rows = execute(&query, &store).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows
            .iter()
            .any(|r| r.get("budget").map(|v| v.is_null()).unwrap_or(false)));
    }

    #[test]
    fn expand_iris_rewrites_predicate_terms() {
        let mut query = parse(&json!({
            "patterns": [{"s": "?x", "p": "ex:role", "o": "?role"}]
        }))
        .unwrap();
        query.expand_iris(&|s: &str| s.replace("ex:", "https://example.org/"));
        match &query.patterns[0] {
            Pattern::Triple(tp) => match &tp.predicate {
                Term::Iri(s) => assert_eq!(s, "https://example.org/role"),
                other => panic!("unexpected term: {other:?}"),
            },
            other => panic!("unexpected pattern: {other:?}"),
        }
    }

    #[test]
    fn limit_and_order_by_descending() {
        let query = parse(&json!({
            "patterns": [{"s": "?person", "p": "budget", "o": "?budget"}],
            "select": ["?person", "?budget"],
            "orderBy": ["desc ?budget"],
            "limit": 1
        }))
        .unwrap();
        let rows = execute(&query, &sample_store()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("budget").and_then(|v| v.as_str()), Some("2000"));
    }
}
