//! The orchestration order itself (§4.12): Composer → Indexer → Scheduler
//! → per-layer evaluation (interpreter for `@expr`/`@view`/`@constraint`,
//! query engine for `@query`) → Canonicalizer/Signer, the last step left
//! to the caller via [`crate::EvalOutcome::sign`].
//!
//! State machine (§4.12): `Indexing → Scheduled → (Layering |
//! Fixpoint(iter)) → Signing → Done`, with `Aborted` reachable from any
//! middle state. The façade doesn't reify this as a type a caller
//! observes — it's a description of the order below, traced through the
//! `tracing` spans this module opens.

use std::collections::HashMap;
use std::time::Instant;

use indexmap::IndexMap;
use ldc_expr::{Interpreter, Scope, Value};
use ldc_index::{DagKind, DagNode, Diagnostic, DiagnosticCode, NodePayload};
use ldc_query::{QueryAst, SelectItem};
use ldc_store::{Triple, TripleStore};

use crate::context::EvalContext;
use crate::options::EvalOptions;
use crate::outcome::EvalOutcome;
use crate::provenance::ProvenanceOp;
use crate::quantity;

/// Evaluates `document` under `ctx` and `options`, returning every
/// diagnostic, triple and provenance entry the run produced. Document-local
/// failures never panic or short-circuit the whole evaluation (§7) — they
/// land in `EvalOutcome::diagnostics` and evaluation continues.
pub fn evaluate(document: &serde_json::Value, ctx: &EvalContext<'_>, options: &EvalOptions) -> EvalOutcome {
    let started = Instant::now();
    let span = tracing::info_span!(
        "ldc_eval.document",
        subject = tracing::field::Empty,
        property_count = tracing::field::Empty,
    );
    let _enter = span.enter();

    let mut diagnostics = Vec::new();
    let mut provenance = Vec::new();

    let no_relations = ldc_compose::NoRelations;
    let loader: &dyn ldc_compose::DocumentLoader = ctx.loader.unwrap_or(&no_relations);
    let composed = ldc_compose::compose(document, loader);
    diagnostics.extend(composed.diagnostics);
    if let Some(relations) = document.get("@relations").and_then(|v| v.as_object()) {
        for alias in relations.keys() {
            provenance.push(ProvenanceOp::Fetch { alias: alias.clone() });
        }
    }

    let index_result = ldc_index::index(&composed.document);
    diagnostics.extend(index_result.diagnostics);
    span.record("subject", tracing::field::display(&index_result.subject));
    span.record("property_count", index_result.values.len());

    let mut values: IndexMap<String, Value> = index_result.values;
    for v in values.values_mut() {
        *v = quantity::coerce(v.clone(), &ctx.units);
    }

    // The first plain (non-synthetic) single-currency-dimension quantity
    // the document itself declares, in property order — stands in for a
    // `@rollup`/`@expr` result whose unit came out of arithmetic with no
    // presentable code of its own (§4.11).
    let primary_currency = primary_currency_of(&values);

    let scope = Scope::root();
    for (k, v) in &values {
        scope.define(k.clone(), v.clone());
    }

    let mut store = TripleStore::new();
    for t in index_result.triples {
        store.add(t);
    }

    let interp = Interpreter::new();
    let schedule = ldc_schedule::build(&index_result.nodes);
    let mut computed: HashMap<String, Value> = HashMap::new();
    let mut constraint_pass: HashMap<String, bool> = HashMap::new();
    let mut aborted = false;

    'layers: for (layer_idx, layer) in schedule.layers.iter().enumerate() {
        if should_abort(ctx, options, layer_idx, started) {
            diagnostics.push(Diagnostic::new(DiagnosticCode::Timeout));
            aborted = true;
            break 'layers;
        }
        let layer_span = tracing::info_span!("ldc_eval.layer", index = layer_idx);
        let _enter = layer_span.enter();
        for &node_idx in layer {
            let node = &index_result.nodes[node_idx];
            let value = eval_node_value(
                node,
                &scope,
                &interp,
                &mut computed,
                &store,
                &mut diagnostics,
                &mut provenance,
                &mut constraint_pass,
            );
            commit_triple(node, &index_result.subject, &value, primary_currency.as_deref(), &mut store);
        }
    }

    if !aborted && !schedule.fixpoint.is_empty() {
        run_fixpoint_layer(
            &schedule.fixpoint,
            &index_result.nodes,
            &index_result.subject,
            primary_currency.as_deref(),
            &scope,
            &interp,
            &mut computed,
            &mut constraint_pass,
            &mut store,
            &mut diagnostics,
            &mut provenance,
            ctx,
            options,
            started,
            &mut aborted,
        );
    }

    patch_computed_values(&mut values, &computed);

    for d in &diagnostics {
        match d.code {
            DiagnosticCode::SchemaError | DiagnosticCode::Timeout => {
                tracing::warn!(code = %d.code, path = d.path.as_deref().unwrap_or(""), "diagnostic recorded")
            }
            _ => tracing::debug!(code = %d.code, path = d.path.as_deref().unwrap_or(""), "diagnostic recorded"),
        }
    }

    let value = values_to_json(&values, options.decimal_precision);

    EvalOutcome {
        subject: index_result.subject,
        triples: store,
        diagnostics,
        value,
        provenance,
        aborted,
    }
}

#[allow(clippy::too_many_arguments)]
fn run_fixpoint_layer(
    node_indices: &[usize],
    nodes: &[DagNode],
    subject: &str,
    primary_currency: Option<&str>,
    scope: &Scope,
    interp: &Interpreter,
    computed: &mut HashMap<String, Value>,
    constraint_pass: &mut HashMap<String, bool>,
    store: &mut TripleStore,
    diagnostics: &mut Vec<Diagnostic>,
    provenance: &mut Vec<ProvenanceOp>,
    ctx: &EvalContext<'_>,
    options: &EvalOptions,
    started: Instant,
    aborted: &mut bool,
) {
    let fixpoint_span = tracing::info_span!("ldc_eval.fixpoint");
    let _enter = fixpoint_span.enter();

    let cap = options.max_fixpoint_iterations.min(ldc_schedule::MAX_ITERATIONS).max(1);
    let mut iteration = 0usize;
    let mut limit_reached = true;

    'iterations: for pass in 1..=cap {
        if should_abort(ctx, options, pass, started) {
            diagnostics.push(Diagnostic::new(DiagnosticCode::Timeout));
            *aborted = true;
            return;
        }
        let iteration_span = tracing::info_span!("ldc_eval.fixpoint.iteration", pass);
        let _enter = iteration_span.enter();

        let mut changed = false;
        for &node_idx in node_indices {
            let node = &nodes[node_idx];
            // `@constraint` nodes never populate `computed` (they don't
            // contribute a value — only a pass/fail diagnostic), so they'd
            // otherwise look "changed" on every pass and pin the layer to
            // the iteration cap. Track their pass/fail verdict separately.
            if node.kind == DagKind::Constraint {
                let before = constraint_pass.get(&node.plain_key).copied();
                eval_node_value(node, scope, interp, computed, store, diagnostics, provenance, constraint_pass);
                let after = constraint_pass.get(&node.plain_key).copied();
                if before != after {
                    changed = true;
                }
                continue;
            }
            let before = computed.get(&node.plain_key).cloned();
            let after = eval_node_value(node, scope, interp, computed, store, diagnostics, provenance, constraint_pass);
            let after = computed.get(&node.plain_key).cloned().unwrap_or(after);
            if before != Some(after) {
                changed = true;
            }
        }
        iteration = pass;
        if !changed {
            limit_reached = false;
            break 'iterations;
        }
    }

    if limit_reached {
        for &node_idx in node_indices {
            let node = &nodes[node_idx];
            diagnostics.push(Diagnostic::new(DiagnosticCode::FixpointLimit).with_path(node.id.clone()));
            computed.remove(&node.plain_key);
        }
        tracing::warn!(iterations = iteration, "fixpoint limit reached");
    } else {
        for &node_idx in node_indices {
            let node = &nodes[node_idx];
            if let Some(value) = computed.get(&node.plain_key).cloned() {
                commit_triple(node, subject, &value, primary_currency, store);
            }
        }
        tracing::debug!(iterations = iteration, "fixpoint converged");
    }
}

#[allow(clippy::too_many_arguments)]
fn eval_node_value(
    node: &DagNode,
    scope: &Scope,
    interp: &Interpreter,
    computed: &mut HashMap<String, Value>,
    store: &TripleStore,
    diagnostics: &mut Vec<Diagnostic>,
    provenance: &mut Vec<ProvenanceOp>,
    constraint_pass: &mut HashMap<String, bool>,
) -> Value {
    match (node.kind, &node.payload) {
        (DagKind::Expr, NodePayload::Expr(ast)) | (DagKind::View, NodePayload::Expr(ast)) => {
            match interp.eval(ast, scope) {
                Ok(value) => {
                    provenance.push(ProvenanceOp::Compute { path: node.id.clone() });
                    tracing::debug!(path = %node.id, "computed");
                    computed.insert(node.plain_key.clone(), value.clone());
                    scope.define(node.plain_key.clone(), value.clone());
                    value
                }
                Err(e) => {
                    tracing::warn!(path = %node.id, error = %e, "expression error");
                    diagnostics.push(
                        Diagnostic::new(DiagnosticCode::ExprErr).with_path(node.id.clone()).with_message(e.to_string()),
                    );
                    Value::Null
                }
            }
        }
        (DagKind::Constraint, NodePayload::Expr(ast)) => match interp.eval(ast, scope) {
            Ok(value) if value.is_truthy() => {
                provenance.push(ProvenanceOp::Compute { path: node.id.clone() });
                constraint_pass.insert(node.plain_key.clone(), true);
                Value::Null
            }
            Ok(_) => {
                tracing::debug!(path = %node.id, "constraint failed");
                diagnostics.push(Diagnostic::new(DiagnosticCode::ConstraintFailed).with_path(node.id.clone()));
                constraint_pass.insert(node.plain_key.clone(), false);
                Value::Null
            }
            Err(e) => {
                tracing::warn!(path = %node.id, error = %e, "constraint error");
                diagnostics.push(
                    Diagnostic::new(DiagnosticCode::ExprErr).with_path(node.id.clone()).with_message(e.to_string()),
                );
                constraint_pass.remove(&node.plain_key);
                Value::Null
            }
        },
        (DagKind::Query, NodePayload::Query(ast)) => match ldc_query::execute(ast, store) {
            Ok(rows) => {
                record_query_provenance(ast, node, provenance);
                let column = first_column_name(&ast.select);
                let value = rows
                    .first()
                    .and_then(|row| column.as_ref().and_then(|c| row.get(c)))
                    .cloned()
                    .unwrap_or(Value::Null);
                computed.insert(node.plain_key.clone(), value.clone());
                scope.define(node.plain_key.clone(), value.clone());
                value
            }
            Err(e) => {
                tracing::warn!(path = %node.id, error = %e, "query error");
                diagnostics.push(
                    Diagnostic::new(DiagnosticCode::QueryErr).with_path(node.id.clone()).with_message(e.to_string()),
                );
                Value::Null
            }
        },
        // The indexer never pairs a DagKind with a mismatched payload variant.
        _ => Value::Null,
    }
}

fn commit_triple(node: &DagNode, subject: &str, value: &Value, primary_currency: Option<&str>, store: &mut TripleStore) {
    if let Some(object) = value.to_triple_object(primary_currency) {
        store.add(Triple::new(subject.to_string(), node.id.clone(), object));
    }
}

/// Scans the root value map, in document property order, for the first
/// quantity whose dimension is a plain (non-synthetic) single currency —
/// i.e. one the document wrote itself, such as `"100 USD"`, rather than
/// one a computation produced.
fn primary_currency_of(values: &IndexMap<String, Value>) -> Option<String> {
    values.values().find_map(|v| match v {
        Value::Quantity(q) if q.is_single_currency_dimension() && !q.is_synthetic_unit() => {
            Some(q.unit.name.clone())
        }
        _ => None,
    })
}

fn first_column_name(select: &[SelectItem]) -> Option<String> {
    select.first().map(|item| match item {
        SelectItem::Var(name) => name.clone(),
        SelectItem::Aggregate { alias, .. } => alias.clone(),
    })
}

fn record_query_provenance(ast: &QueryAst, node: &DagNode, provenance: &mut Vec<ProvenanceOp>) {
    provenance.push(ProvenanceOp::Compute { path: node.id.clone() });
    if !ast.filters.is_empty() {
        provenance.push(ProvenanceOp::Filter { path: node.id.clone() });
    }
    if !ast.order_by.is_empty() {
        provenance.push(ProvenanceOp::Sort { path: node.id.clone() });
    }
    if ast.limit.is_some() {
        provenance.push(ProvenanceOp::Paginate { path: node.id.clone() });
    }
}

fn should_abort(ctx: &EvalContext<'_>, options: &EvalOptions, step: usize, started: Instant) -> bool {
    let granularity = options.cancellation_poll_granularity.max(1);
    if step % granularity != 0 {
        return false;
    }
    if let Some(timeout) = options.timeout {
        if started.elapsed() >= timeout {
            return true;
        }
    }
    ctx.should_abort.map(|poll| poll()).unwrap_or(false)
}

/// Patches directive results back into the (possibly nested) value tree.
/// Root-level directive slots and nested ones are both indexer-placed
/// `Value::Null` placeholders keyed by plain key — nesting depth isn't
/// tracked past the indexer (§3 "Plain-key vs IRI identity" wart), so this
/// walks the whole tree rather than just the root map.
fn patch_computed_values(values: &mut IndexMap<String, Value>, computed: &HashMap<String, Value>) {
    for (key, slot) in values.iter_mut() {
        if matches!(slot, Value::Null) {
            if let Some(result) = computed.get(key) {
                *slot = result.clone();
                continue;
            }
        }
        patch_nested(slot, computed);
    }
}

fn patch_nested(value: &mut Value, computed: &HashMap<String, Value>) {
    match value {
        Value::Object(map) => {
            let mut out = IndexMap::new();
            for (k, v) in map.iter() {
                let mut v = v.clone();
                if matches!(v, Value::Null) {
                    if let Some(result) = computed.get(k) {
                        out.insert(k.clone(), result.clone());
                        continue;
                    }
                }
                patch_nested(&mut v, computed);
                out.insert(k.clone(), v);
            }
            *value = Value::object(out);
        }
        Value::Array(items) => {
            let out: Vec<Value> = items
                .iter()
                .cloned()
                .map(|mut item| {
                    patch_nested(&mut item, computed);
                    item
                })
                .collect();
            *value = Value::array(out);
        }
        _ => {}
    }
}

/// Renders the final value map to JSON, rounding plain `Decimal`
/// properties to `decimal_precision` places (§3.3) — quantities go through
/// `Value::to_json`, which keeps their full magnitude regardless (only the
/// triple-object encoding in `Value::to_triple_object` truncates, and only
/// for single-currency-dimension quantities).
fn values_to_json(values: &IndexMap<String, Value>, decimal_precision: u32) -> serde_json::Value {
    let mut out = serde_json::Map::new();
    for (k, v) in values {
        out.insert(k.clone(), value_to_json_rounded(v, decimal_precision));
    }
    serde_json::Value::Object(out)
}

fn value_to_json_rounded(value: &Value, decimal_precision: u32) -> serde_json::Value {
    match value {
        Value::Decimal(d) => serde_json::Value::String(d.round_dp(decimal_precision).to_canonical_string()),
        Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(|v| value_to_json_rounded(v, decimal_precision)).collect())
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map.iter() {
                out.insert(k.clone(), value_to_json_rounded(v, decimal_precision));
            }
            serde_json::Value::Object(out)
        }
        other => other.to_json(),
    }
}
