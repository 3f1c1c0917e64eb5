//! The indexer (C6, §4.6): walks a document once, classifying each
//! non-`@` property as an inert value (seeded as a triple) or a directive
//! (hoisted into a [`DagNode`]).

use crate::context::ContextMap;
use crate::diagnostic::{Diagnostic, DiagnosticCode};
use indexmap::IndexMap;
use ldc_expr::{AstNode, Value};
use ldc_query::QueryAst;
use ldc_store::Triple;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DagKind {
    Expr,
    View,
    Constraint,
    Query,
}

#[derive(Debug, Clone)]
pub enum NodePayload {
    Expr(AstNode),
    Query(QueryAst),
}

/// One computation node (§3 "DAG node"). `reads`/`writes` name plain keys
/// in a single flat namespace that spans the whole document — per the
/// spec's own "Plain-key vs IRI identity" design note, this is an
/// inherited architectural wart, not one this indexer tries to fix: two
/// differently-nested properties sharing a local key name are
/// indistinguishable to the scheduler.
#[derive(Debug, Clone)]
pub struct DagNode {
    pub id: String,
    pub plain_key: String,
    pub kind: DagKind,
    pub reads: Vec<String>,
    pub writes: (String, String),
    pub payload: NodePayload,
    pub stable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct IndexResult {
    pub subject: String,
    pub context: ContextMap,
    /// Root-level plain-key → value map, preserving nested structure for
    /// inert properties. This seeds the root scope and becomes the
    /// "value map" surfaced to the host (§6).
    pub values: IndexMap<String, Value>,
    pub nodes: Vec<DagNode>,
    pub triples: Vec<Triple>,
    pub diagnostics: Vec<Diagnostic>,
}

const DIRECTIVE_KEYS: [(&str, DagKind); 4] = [
    ("@expr", DagKind::Expr),
    ("@view", DagKind::View),
    ("@constraint", DagKind::Constraint),
    ("@query", DagKind::Query),
];

fn is_reserved_key(key: &str) -> bool {
    matches!(key, "@id" | "@context" | "@type" | "@relations")
}

pub fn index(doc: &serde_json::Value) -> IndexResult {
    let mut diagnostics = Vec::new();

    let Some(obj) = doc.as_object() else {
        diagnostics.push(
            Diagnostic::new(DiagnosticCode::SchemaError).with_message("document must be a JSON object"),
        );
        return IndexResult { diagnostics, ..Default::default() };
    };

    let context = ContextMap::from_json(obj.get("@context"));

    let Some(subject) = obj.get("@id").and_then(|v| v.as_str()).map(|id| context.expand(id)) else {
        diagnostics.push(
            Diagnostic::new(DiagnosticCode::SchemaError).with_message("document is missing \"@id\""),
        );
        return IndexResult { context, diagnostics, ..Default::default() };
    };

    let mut values = IndexMap::new();
    let mut nodes = Vec::new();
    let mut triples = Vec::new();

    for (key, raw) in obj {
        if is_reserved_key(key) {
            continue;
        }
        let value = classify(key, raw, &context, &subject, &mut nodes, &mut triples, &mut diagnostics);
        values.insert(key.clone(), value);
    }

    IndexResult {
        subject,
        context,
        values,
        nodes,
        triples,
        diagnostics,
    }
}

/// Classifies one property's raw JSON value, returning the `Value` it
/// should be bound to at its slot (the caller decides where that slot
/// lives — a root entry, or a key inside a parent `Value::Object`).
///
/// The root subject's own scalar properties are never seeded as triples
/// (§4.6) — the caller just binds the returned `Value` into its root value
/// map. But once a property turns out to be an inert object or array, that
/// object/array's *own* properties are, from here on, always seeded under
/// a synthetic subject: entering the "inert object"/"array" branch below
/// is itself what makes a property nested, regardless of how deep we
/// already were when we got here.
#[allow(clippy::too_many_arguments)]
fn classify(
    key: &str,
    raw: &serde_json::Value,
    ctx: &ContextMap,
    owner_subject: &str,
    nodes: &mut Vec<DagNode>,
    triples: &mut Vec<Triple>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Value {
    if let serde_json::Value::Object(map) = raw {
        let present: Vec<(&str, DagKind)> = DIRECTIVE_KEYS
            .iter()
            .filter(|(k, _)| map.contains_key(*k))
            .copied()
            .collect();

        if !present.is_empty() {
            if present.len() > 1 {
                diagnostics.push(
                    Diagnostic::new(DiagnosticCode::SchemaError)
                        .with_path(ctx.expand(key))
                        .with_message(format!(
                            "property \"{key}\" mixes more than one directive key; using \"{}\"",
                            present[0].0
                        )),
                );
            }
            let (directive_key, kind) = present[0];
            build_directive_node(key, kind, &map[directive_key], ctx, nodes, diagnostics);
            return Value::Null;
        }

        // Inert object: recurse into its own properties under a synthetic
        // subject, seeding triples for this level from here on.
        let synthetic_subject = format!("{owner_subject}/{key}");
        let mut out = IndexMap::new();
        for (child_key, child_raw) in map {
            if is_reserved_key(child_key) {
                continue;
            }
            let child_value = classify(child_key, child_raw, ctx, &synthetic_subject, nodes, triples, diagnostics);
            if let Some(object) = child_value.to_triple_object(None) {
                triples.push(Triple::new(synthetic_subject.clone(), ctx.expand(child_key), object));
            }
            out.insert(child_key.clone(), child_value);
        }
        return Value::object(out);
    }

    if let serde_json::Value::Array(items) = raw {
        let synthetic_subject = format!("{owner_subject}/{key}");
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let element_key = format!("{i}");
            let indexed_subject = format!("{synthetic_subject}/{i}");
            let element_value = classify_array_element(item, ctx, &indexed_subject, nodes, triples, diagnostics);
            if let Some(object) = element_value.to_triple_object(None) {
                triples.push(Triple::new(indexed_subject.clone(), ctx.expand(&element_key), object));
            }
            out.push(element_value);
        }
        return Value::array(out);
    }

    Value::from_json(raw)
}

fn classify_array_element(
    raw: &serde_json::Value,
    ctx: &ContextMap,
    owner_subject: &str,
    nodes: &mut Vec<DagNode>,
    triples: &mut Vec<Triple>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Value {
    if let serde_json::Value::Object(map) = raw {
        let mut out = IndexMap::new();
        for (child_key, child_raw) in map {
            if is_reserved_key(child_key) {
                continue;
            }
            let child_value = classify(child_key, child_raw, ctx, owner_subject, nodes, triples, diagnostics);
            if let Some(object) = child_value.to_triple_object(None) {
                triples.push(Triple::new(owner_subject.to_string(), ctx.expand(child_key), object));
            }
            out.insert(child_key.clone(), child_value);
        }
        return Value::object(out);
    }
    Value::from_json(raw)
}

fn build_directive_node(
    key: &str,
    kind: DagKind,
    directive_value: &serde_json::Value,
    ctx: &ContextMap,
    nodes: &mut Vec<DagNode>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let id = ctx.expand(key);

    match kind {
        DagKind::Expr | DagKind::Constraint => {
            let Some(source) = directive_value.as_str() else {
                diagnostics.push(
                    Diagnostic::new(DiagnosticCode::SchemaError)
                        .with_path(id)
                        .with_message(format!("\"{key}\" directive body must be a string")),
                );
                return;
            };
            push_expr_node(key, kind, source, false, &id, ctx, nodes, diagnostics);
        }
        DagKind::View => {
            let Some(view) = directive_value.as_object() else {
                diagnostics.push(
                    Diagnostic::new(DiagnosticCode::SchemaError)
                        .with_path(id)
                        .with_message(format!("\"{key}\"'s @view must be an object")),
                );
                return;
            };
            let Some(source) = view.get("@expr").and_then(|v| v.as_str()) else {
                diagnostics.push(
                    Diagnostic::new(DiagnosticCode::SchemaError)
                        .with_path(id)
                        .with_message(format!("\"{key}\"'s @view is missing \"@expr\"")),
                );
                return;
            };
            let stable = view.get("@stable").and_then(|v| v.as_bool()).unwrap_or(false);
            push_expr_node(key, kind, source, stable, &id, ctx, nodes, diagnostics);
        }
        DagKind::Query => {
            let query_json = directive_value;
            match ldc_query::parse(query_json) {
                Ok(mut ast) => {
                    ast.expand_iris(&|s: &str| ctx.expand(s));
                    let reads = query_reads(&ast);
                    nodes.push(DagNode {
                        id: id.clone(),
                        plain_key: key.to_string(),
                        kind,
                        reads,
                        writes: (key.to_string(), id),
                        payload: NodePayload::Query(ast),
                        stable: false,
                    });
                }
                Err(e) => diagnostics.push(
                    Diagnostic::new(DiagnosticCode::QueryErr)
                        .with_path(id)
                        .with_message(e.to_string()),
                ),
            }
        }
    }
}

fn push_expr_node(
    key: &str,
    kind: DagKind,
    source: &str,
    stable: bool,
    id: &str,
    _ctx: &ContextMap,
    nodes: &mut Vec<DagNode>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match ldc_expr::parse(source) {
        Ok(ast) => {
            let mut reads = Vec::new();
            ast.free_identifiers(&mut reads);
            nodes.push(DagNode {
                id: id.to_string(),
                plain_key: key.to_string(),
                kind,
                reads,
                writes: (key.to_string(), id.to_string()),
                payload: NodePayload::Expr(ast),
                stable,
            });
        }
        Err(e) => diagnostics.push(
            Diagnostic::new(DiagnosticCode::ExprErr)
                .with_path(id.to_string())
                .with_message(e.to_string()),
        ),
    }
}

/// A query's dependency reads are the free variables of its filter and
/// having expressions — the only places a query body can reference names
/// from the surrounding document scope. This over-approximates (pattern
/// variables bound by the query itself get swept in too), which only
/// costs the scheduler a spurious ordering constraint, never an I1
/// violation.
fn query_reads(ast: &QueryAst) -> Vec<String> {
    let mut out = Vec::new();
    for expr in ast.filters.iter().chain(ast.having.iter()) {
        expr.free_identifiers(&mut out);
    }
    out.sort();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_id_is_a_schema_error() {
        let result = index(&json!({"foo": 1}));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::SchemaError);
    }

    #[test]
    fn non_object_document_is_a_schema_error() {
        let result = index(&json!("not a document"));
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::SchemaError);
    }

    #[test]
    fn root_scalars_are_not_seeded_as_triples() {
        let result = index(&json!({"@context": {"ex": "https://ex/"}, "@id": "ex:a", "revenue": 100000}));
        assert!(result.triples.is_empty());
        assert_eq!(result.values.get("revenue"), Some(&Value::Int(100000)));
    }

    #[test]
    fn expr_directive_becomes_a_dag_node() {
        let result = index(&json!({
            "@context": {"ex": "https://ex/"},
            "@id": "ex:a",
            "revenue": 100000,
            "growth": 0.15,
            "next": {"@expr": "revenue*(1+growth)"}
        }));
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].plain_key, "next");
        assert_eq!(result.nodes[0].id, "https://ex/next");
        assert!(result.nodes[0].reads.contains(&"revenue".to_string()));
        assert!(result.nodes[0].reads.contains(&"growth".to_string()));
        assert_eq!(result.values.get("next"), Some(&Value::Null));
    }

    #[test]
    fn constraint_directive_is_classified() {
        let result = index(&json!({
            "@context": {"ex": "https://ex/"},
            "@id": "ex:b",
            "x": -1,
            "c": {"@constraint": "x>=0"}
        }));
        assert_eq!(result.nodes[0].kind, DagKind::Constraint);
    }

    #[test]
    fn nested_object_seeds_synthetic_subject_triples() {
        let result = index(&json!({
            "@context": {"ex": "https://ex/"},
            "@id": "ex:a",
            "nested": {"score": 42}
        }));
        assert_eq!(result.triples.len(), 1);
        assert_eq!(result.triples[0].subject, "https://ex/a/nested");
        assert_eq!(result.triples[0].predicate, "https://ex/score");
        assert_eq!(result.triples[0].object, "42");
    }

    #[test]
    fn nested_directive_is_hoisted_into_its_own_node() {
        let result = index(&json!({
            "@context": {"ex": "https://ex/"},
            "@id": "ex:a",
            "nested": {"computed": {"@expr": "1+1"}}
        }));
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].plain_key, "computed");
    }

    #[test]
    fn ambiguous_directive_picks_first_and_flags_schema_error() {
        let result = index(&json!({
            "@context": {"ex": "https://ex/"},
            "@id": "ex:a",
            "weird": {"@expr": "1+1", "@constraint": "true"}
        }));
        assert_eq!(result.nodes[0].kind, DagKind::Expr);
        assert!(result.diagnostics.iter().any(|d| d.code == DiagnosticCode::SchemaError));
    }

    #[test]
    fn malformed_expr_body_omits_the_node_and_flags_a_diagnostic() {
        let result = index(&json!({
            "@context": {"ex": "https://ex/"},
            "@id": "ex:a",
            "bad": {"@expr": "1 +"}
        }));
        assert!(result.nodes.is_empty());
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::ExprErr);
    }

    #[test]
    fn query_directive_reads_come_from_filters() {
        let result = index(&json!({
            "@context": {"ex": "https://ex/"},
            "@id": "ex:a",
            "q": {"@query": {
                "patterns": [{"s": "?s", "p": "role", "o": "?role"}],
                "filters": ["role == status"]
            }}
        }));
        assert_eq!(result.nodes[0].kind, DagKind::Query);
        assert!(result.nodes[0].reads.contains(&"status".to_string()));
    }
}
