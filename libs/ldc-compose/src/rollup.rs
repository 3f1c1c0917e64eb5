//! `@rollup` aggregation (§4.10): filter a relation's array property,
//! select a field from each surviving item, then reduce.

use crate::error::{ComposeError, Result};
use crate::path::{self, Segment};
use ldc_expr::{AstNode, Interpreter, Scope, Value};
use ldc_units::Decimal;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollupAgg {
    Sum,
    Avg,
    Count,
    Min,
    Max,
    First,
    Last,
    Concat,
    Unique,
    All,
}

impl RollupAgg {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "sum" => Self::Sum,
            "avg" => Self::Avg,
            "count" => Self::Count,
            "min" => Self::Min,
            "max" => Self::Max,
            "first" => Self::First,
            "last" => Self::Last,
            "concat" => Self::Concat,
            "unique" => Self::Unique,
            "all" => Self::All,
            _ => return None,
        })
    }
}

/// Runs the filter → select → reduce pipeline over one relation array's
/// raw JSON elements.
pub fn evaluate(
    items: &[serde_json::Value],
    filter: Option<&AstNode>,
    select: Option<&[Segment]>,
    agg: RollupAgg,
) -> Result<Value> {
    let interp = Interpreter::new();
    let mut selected = Vec::new();
    for item in items {
        if let Some(filter_ast) = filter {
            let this = Value::from_json(item);
            let scope = Scope::root().child_with_this(this);
            let passes = interp
                .eval(filter_ast, &scope)
                .map_err(|e| ComposeError::AggregationFailed(format!("filter: {e}")))?
                .is_truthy();
            if !passes {
                continue;
            }
        }
        let field = match select {
            Some(segments) => path::resolve(item, segments).map(Value::from_json).unwrap_or(Value::Null),
            None => Value::from_json(item),
        };
        selected.push(field);
    }

    match agg {
        RollupAgg::Count => Ok(Value::Int(selected.len() as i64)),
        RollupAgg::Sum => fold_sum(&selected),
        RollupAgg::Avg => fold_avg(&selected),
        RollupAgg::Min => Ok(fold_extreme(&selected, Ordering::Less)),
        RollupAgg::Max => Ok(fold_extreme(&selected, Ordering::Greater)),
        RollupAgg::First => Ok(selected.first().cloned().unwrap_or(Value::Null)),
        RollupAgg::Last => Ok(selected.last().cloned().unwrap_or(Value::Null)),
        RollupAgg::Concat => Ok(concat(&selected)),
        RollupAgg::Unique => Ok(unique(&selected)),
        RollupAgg::All => Ok(Value::array(selected)),
    }
}

fn as_decimal(v: &Value) -> Result<Decimal> {
    match v {
        Value::Int(i) => Ok(Decimal::from_i64(*i)),
        Value::Decimal(d) => Ok(*d),
        other => Err(ComposeError::AggregationFailed(format!(
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
    acc.div(n)
        .map(Value::Decimal)
        .map_err(|_| ComposeError::AggregationFailed("avg: division by zero".into()))
}

fn fold_extreme(values: &[Value], keep_if: Ordering) -> Value {
    let mut iter = values.iter();
    let Some(mut best) = iter.next().cloned() else {
        return Value::Null;
    };
    for v in iter {
        if let Some(ord) = ldc_expr::compare_values(v, &best) {
            if ord == keep_if {
                best = v.clone();
            }
        }
    }
    best
}

/// All-string selections join into one string; anything else flattens one
/// level of array nesting into a combined array. Distinguishes `concat`
/// from `all`, which always keeps one entry per surviving item.
fn concat(values: &[Value]) -> Value {
    if !values.is_empty() && values.iter().all(|v| matches!(v, Value::Str(_))) {
        let joined: String = values.iter().filter_map(Value::as_str).collect();
        return Value::str(joined);
    }
    let mut out = Vec::new();
    for v in values {
        match v {
            Value::Array(items) => out.extend(items.iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    Value::array(out)
}

fn unique(values: &[Value]) -> Value {
    let mut out: Vec<Value> = Vec::new();
    for v in values {
        if !out.iter().any(|existing| existing == v) {
            out.push(v.clone());
        }
    }
    Value::array(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items() -> Vec<serde_json::Value> {
        vec![
            json!({"budget": 100, "status": "active"}),
            json!({"budget": 50, "status": "archived"}),
            json!({"budget": 25, "status": "active"}),
        ]
    }

    #[test]
    fn sums_a_selected_field_after_filtering() {
        let filter = ldc_expr::parse("status == 'active'").unwrap();
        let select = vec![Segment::Key("budget".into())];
        let result = evaluate(&items(), Some(&filter), Some(&select), RollupAgg::Sum).unwrap();
        assert_eq!(result, Value::Int(125));
    }

    #[test]
    fn counts_without_a_select_field() {
        let result = evaluate(&items(), None, None, RollupAgg::Count).unwrap();
        assert_eq!(result, Value::Int(3));
    }

    #[test]
    fn unique_dedups_preserving_first_occurrence() {
        let select = vec![Segment::Key("status".into())];
        let result = evaluate(&items(), None, Some(&select), RollupAgg::Unique).unwrap();
        assert_eq!(
            result,
            Value::array(vec![Value::str("active"), Value::str("archived")])
        );
    }

    #[test]
    fn min_and_max_compare_selected_numbers() {
        let select = vec![Segment::Key("budget".into())];
        assert_eq!(
            evaluate(&items(), None, Some(&select), RollupAgg::Min).unwrap(),
            Value::Int(25)
        );
        assert_eq!(
            evaluate(&items(), None, Some(&select), RollupAgg::Max).unwrap(),
            Value::Int(100)
        );
    }
}
