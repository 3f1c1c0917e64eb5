//! Executes a [`QueryAst`] against a [`TripleStore`] (§4.9).
//!
//! Pipeline: pattern match/join (with left-join semantics for `optional`
//! groups) → filter → groupBy/aggregate → having → orderBy → limit.

use crate::ast::{collect_vars, AggKind, OrderKey, Pattern, QueryAst, Row, SelectItem, Term, TriplePattern};
use crate::error::{QueryError, Result};
use ldc_expr::{AstNode, Interpreter, Scope, Value};
use ldc_store::TripleStore;
use ldc_units::Decimal;
use std::cmp::Ordering;

pub fn execute(query: &QueryAst, store: &TripleStore) -> Result<Vec<Row>> {
    let interp = Interpreter::new();

    let mut rows = vec![Row::new()];
    for pattern in &query.patterns {
        rows = match pattern {
            Pattern::Triple(tp) => extend_rows(rows, tp, store)?,
            Pattern::Optional { patterns, filters } => {
                left_join(rows, patterns, filters, store, &interp)?
            }
        };
    }

    rows = keep_matching(&interp, rows, &query.filters)?;

    let grouped = query.group_by.len() > 0
        || query
            .select
            .iter()
            .any(|item| matches!(item, SelectItem::Aggregate { .. }));
    let mut projected = if grouped {
        group_and_aggregate(&interp, query, rows)?
    } else {
        project_plain(query, rows)
    };

    projected = keep_matching(&interp, projected, &query.having)?;

    for key in query.order_by.iter().rev() {
        sort_stable_by_key(&mut projected, key);
    }

    if let Some(limit) = query.limit {
        projected.truncate(limit);
    }

    Ok(projected)
}

/// Ground a term against the current row: a constant resolves to a fixed
/// string immediately; a variable either supplies a constant from an
/// existing binding or stays open as a join slot.
enum Ground {
    Const(String),
    Var(String),
}

fn classify(term: &Term, row: &Row) -> Result<Ground> {
    match term {
        Term::Iri(s) => Ok(Ground::Const(s.clone())),
        Term::Literal(v) => v
            .to_triple_object(None)
            .map(Ground::Const)
            .ok_or_else(|| QueryError::Schema(format!("literal term {v:?} has no triple encoding"))),
        Term::Var(name) => match row.get(name) {
            Some(v) => match v.to_triple_object(None) {
                Some(s) => Ok(Ground::Const(s)),
                None => Ok(Ground::Var(name.clone())),
            },
            None => Ok(Ground::Var(name.clone())),
        },
    }
}

fn extend_rows(rows: Vec<Row>, tp: &TriplePattern, store: &TripleStore) -> Result<Vec<Row>> {
    let mut out = Vec::new();
    for row in rows {
        let gs = classify(&tp.subject, &row)?;
        let gp = classify(&tp.predicate, &row)?;
        let go = classify(&tp.object, &row)?;
        let s_filter = if let Ground::Const(s) = &gs { Some(s.as_str()) } else { None };
        let p_filter = if let Ground::Const(s) = &gp { Some(s.as_str()) } else { None };
        let o_filter = if let Ground::Const(s) = &go { Some(s.as_str()) } else { None };

        for triple in store.match_triples(s_filter, p_filter, o_filter) {
            let mut candidate = row.clone();
            let bindings = [
                (&gs, triple.subject.as_str()),
                (&gp, triple.predicate.as_str()),
                (&go, triple.object.as_str()),
            ];
            let mut consistent = true;
            for (ground, matched) in bindings {
                if let Ground::Var(name) = ground {
                    match candidate.get(name).and_then(Value::as_str) {
                        Some(existing) if existing != matched => {
                            consistent = false;
                            break;
                        }
                        _ => {
                            candidate.insert(name.clone(), Value::str(matched));
                        }
                    }
                }
            }
            if consistent {
                out.push(candidate);
            }
        }
    }
    Ok(out)
}

fn left_join(
    rows: Vec<Row>,
    patterns: &[TriplePattern],
    filters: &[AstNode],
    store: &TripleStore,
    interp: &Interpreter,
) -> Result<Vec<Row>> {
    let group_vars = collect_vars(patterns);
    let mut out = Vec::new();
    for row in rows {
        let mut sub_rows = vec![row.clone()];
        for tp in patterns {
            sub_rows = extend_rows(sub_rows, tp, store)?;
        }
        sub_rows = keep_matching(interp, sub_rows, filters)?;

        if sub_rows.is_empty() {
            let mut filled = row;
            for name in &group_vars {
                filled.entry(name.clone()).or_insert(Value::Null);
            }
            out.push(filled);
        } else {
            out.extend(sub_rows);
        }
    }
    Ok(out)
}

fn row_scope(row: &Row) -> Scope {
    let scope = Scope::root();
    for (name, value) in row {
        scope.define(name.clone(), value.clone());
    }
    scope
}

/// Keeps only the rows for which every expression in `exprs` evaluates
/// truthy (an empty list keeps everything).
fn keep_matching(interp: &Interpreter, rows: Vec<Row>, exprs: &[AstNode]) -> Result<Vec<Row>> {
    if exprs.is_empty() {
        return Ok(rows);
    }
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let scope = row_scope(&row);
        let mut ok = true;
        for expr in exprs {
            if !interp.eval(expr, &scope)?.is_truthy() {
                ok = false;
                break;
            }
        }
        if ok {
            out.push(row);
        }
    }
    Ok(out)
}

fn project_plain(query: &QueryAst, rows: Vec<Row>) -> Vec<Row> {
    if query.select.is_empty() {
        return rows;
    }
    rows.into_iter()
        .map(|row| {
            let mut out = Row::new();
            for item in &query.select {
                if let SelectItem::Var(name) = item {
                    out.insert(name.clone(), row.get(name).cloned().unwrap_or(Value::Null));
                }
            }
            out
        })
        .collect()
}

fn group_and_aggregate(interp: &Interpreter, query: &QueryAst, rows: Vec<Row>) -> Result<Vec<Row>> {
    // Insertion-ordered buckets, keyed by the group-by values. A plain
    // `Vec` scan is fine: group counts are small relative to row counts.
    let mut buckets: Vec<(Vec<String>, Vec<Row>)> = Vec::new();
    for row in rows {
        let key: Vec<String> = query
            .group_by
            .iter()
            .map(|v| row.get(v).and_then(|value| value.to_triple_object(None)).unwrap_or_default())
            .collect();
        match buckets.iter_mut().find(|(k, _)| *k == key) {
            Some((_, bucket_rows)) => bucket_rows.push(row),
            None => buckets.push((key, vec![row])),
        }
    }
    if buckets.is_empty() && query.group_by.is_empty() {
        // No groupBy and zero matched rows still yields one aggregated row
        // (e.g. `count` over nothing is `0`, not "no rows").
        buckets.push((Vec::new(), Vec::new()));
    }

    let mut out = Vec::with_capacity(buckets.len());
    for (_, group_rows) in buckets {
        let mut result = Row::new();
        for name in &query.group_by {
            if let Some(first) = group_rows.first() {
                if let Some(v) = first.get(name) {
                    result.insert(name.clone(), v.clone());
                }
            }
        }
        for item in &query.select {
            match item {
                SelectItem::Var(name) => {
                    if !query.group_by.contains(name) {
                        if let Some(first) = group_rows.first() {
                            if let Some(v) = first.get(name) {
                                result.insert(name.clone(), v.clone());
                            }
                        }
                    }
                }
                SelectItem::Aggregate { agg, expr, alias } => {
                    let value = aggregate(interp, *agg, expr.as_ref(), &group_rows)?;
                    result.insert(alias.clone(), value);
                }
            }
        }
        out.push(result);
    }
    Ok(out)
}

fn aggregate(interp: &Interpreter, agg: AggKind, expr: Option<&AstNode>, rows: &[Row]) -> Result<Value> {
    if agg == AggKind::Count && expr.is_none() {
        return Ok(Value::Int(rows.len() as i64));
    }
    let expr = expr.ok_or_else(|| QueryError::Schema("aggregate requires an expr".into()))?;
    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        let scope = row_scope(row);
        values.push(interp.eval(expr, &scope)?);
    }
    match agg {
        AggKind::Count => Ok(Value::Int(values.len() as i64)),
        AggKind::Sum => fold_sum(&values),
        AggKind::Avg => fold_avg(&values),
        AggKind::Min => fold_extreme(&values, Ordering::Less),
        AggKind::Max => fold_extreme(&values, Ordering::Greater),
    }
}

fn as_decimal(v: &Value) -> Result<Decimal> {
    match v {
        Value::Int(i) => Ok(Decimal::from_i64(*i)),
        Value::Decimal(d) => Ok(*d),
        other => Err(QueryError::Schema(format!(
            "cannot aggregate a {} value numerically",
            other.type_name()
        ))),
    }
}

fn fold_sum(values: &[Value]) -> Result<Value> {
    let all_int = values.iter().all(|v| matches!(v, Value::Int(_)));
    let mut acc = Decimal::ZERO;
    for v in values {
        acc = acc.add(as_decimal(v)?);
    }
    Ok(if all_int {
        acc.to_i64().map(Value::Int).unwrap_or(Value::Decimal(acc))
    } else {
        Value::Decimal(acc)
    })
}

fn fold_avg(values: &[Value]) -> Result<Value> {
    if values.is_empty() {
        return Ok(Value::Null);
    }
    let mut acc = Decimal::ZERO;
    for v in values {
        acc = acc.add(as_decimal(v)?);
    }
    let n = Decimal::from_i64(values.len() as i64);
    Ok(Value::Decimal(acc.div(n).map_err(|_| QueryError::Schema("avg: division by zero".into()))?))
}

fn fold_extreme(values: &[Value], keep_if: Ordering) -> Result<Value> {
    let mut iter = values.iter();
    let Some(mut best) = iter.next().cloned() else {
        return Ok(Value::Null);
    };
    for v in iter {
        if let Some(ord) = ldc_expr::compare_values(v, &best) {
            if ord == keep_if {
                best = v.clone();
            }
        }
    }
    Ok(best)
}

fn sort_stable_by_key(rows: &mut [Row], key: &OrderKey) {
    rows.sort_by(|a, b| {
        let av = a.get(&key.var);
        let bv = b.get(&key.var);
        let ordering = match (av, bv) {
            (Some(x), Some(y)) => ldc_expr::compare_values(x, y).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if key.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}
