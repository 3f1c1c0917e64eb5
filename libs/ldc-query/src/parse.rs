//! Builds a [`QueryAst`] from the JSON body of an `@query` directive (§4.9).
//!
//! Term encoding in pattern positions:
//! - a string starting with `?` is a variable;
//! - `{"literal": <json>}` forces literal-value interpretation;
//! - any other bare JSON value (string, number, bool) is an IRI-or-CURIE
//!   if a string, otherwise a literal.

use crate::ast::{AggKind, OrderKey, Pattern, QueryAst, SelectItem, Term, TriplePattern};
use crate::error::{QueryError, Result};
use ldc_expr::Value;

pub fn parse(json: &serde_json::Value) -> Result<QueryAst> {
    let obj = json
        .as_object()
        .ok_or_else(|| QueryError::Schema("query body must be a JSON object".into()))?;

    let patterns = match obj.get("patterns") {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(parse_pattern)
            .collect::<Result<Vec<_>>>()?,
        Some(_) => return Err(QueryError::Schema("\"patterns\" must be an array".into())),
        None => Vec::new(),
    };

    let filters = parse_expr_list(obj.get("filters"))?;
    let having = parse_expr_list(obj.get("having"))?;

    let select = match obj.get("select") {
        Some(serde_json::Value::Array(items)) => {
            items.iter().map(parse_select_item).collect::<Result<Vec<_>>>()?
        }
        Some(_) => return Err(QueryError::Schema("\"select\" must be an array".into())),
        None => Vec::new(),
    };

    let group_by = match obj.get("groupBy") {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(strip_var_sigil)
                    .ok_or_else(|| QueryError::Schema("\"groupBy\" entries must be strings".into()))
            })
            .collect::<Result<Vec<_>>>()?,
        Some(_) => return Err(QueryError::Schema("\"groupBy\" must be an array".into())),
        None => Vec::new(),
    };

    let order_by = match obj.get("orderBy") {
        Some(serde_json::Value::Array(items)) => {
            items.iter().map(parse_order_key).collect::<Result<Vec<_>>>()?
        }
        Some(_) => return Err(QueryError::Schema("\"orderBy\" must be an array".into())),
        None => Vec::new(),
    };

    let limit = match obj.get("limit") {
        Some(v) => Some(
            v.as_u64()
                .ok_or_else(|| QueryError::Schema("\"limit\" must be a non-negative integer".into()))?
                as usize,
        ),
        None => None,
    };

    Ok(QueryAst {
        patterns,
        filters,
        select,
        group_by,
        having,
        order_by,
        limit,
    })
}

fn parse_expr_list(value: Option<&serde_json::Value>) -> Result<Vec<ldc_expr::AstNode>> {
    match value {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|v| {
                let src = v
                    .as_str()
                    .ok_or_else(|| QueryError::Schema("filter/having entries must be strings".into()))?;
                Ok(ldc_expr::parse(src)?)
            })
            .collect(),
        Some(_) => Err(QueryError::Schema("filters/having must be an array of strings".into())),
        None => Ok(Vec::new()),
    }
}

fn parse_pattern(v: &serde_json::Value) -> Result<Pattern> {
    let obj = v
        .as_object()
        .ok_or_else(|| QueryError::Schema("pattern entries must be objects".into()))?;

    if let Some(optional) = obj.get("optional") {
        let items = optional
            .as_array()
            .ok_or_else(|| QueryError::Schema("\"optional\" must be an array of triple patterns".into()))?;
        let patterns = items.iter().map(parse_triple).collect::<Result<Vec<_>>>()?;
        let filters = parse_expr_list(obj.get("filters"))?;
        return Ok(Pattern::Optional { patterns, filters });
    }

    Ok(Pattern::Triple(parse_triple(v)?))
}

fn parse_triple(v: &serde_json::Value) -> Result<TriplePattern> {
    let obj = v
        .as_object()
        .ok_or_else(|| QueryError::Schema("triple patterns must be objects".into()))?;
    let subject = parse_term(
        obj.get("s")
            .ok_or_else(|| QueryError::Schema("triple pattern missing \"s\"".into()))?,
        false,
    )?;
    let predicate = parse_term(
        obj.get("p")
            .ok_or_else(|| QueryError::Schema("triple pattern missing \"p\"".into()))?,
        true,
    )?;
    let object = parse_term(
        obj.get("o")
            .ok_or_else(|| QueryError::Schema("triple pattern missing \"o\"".into()))?,
        false,
    )?;
    Ok(TriplePattern {
        subject,
        predicate,
        object,
    })
}

fn parse_term(v: &serde_json::Value, is_predicate: bool) -> Result<Term> {
    if let serde_json::Value::Object(obj) = v {
        if let Some(literal) = obj.get("literal") {
            return Ok(Term::Literal(Value::from_json(literal)));
        }
        return Err(QueryError::Schema(
            "object terms must be of the form {\"literal\": ...}".into(),
        ));
    }
    if let serde_json::Value::String(s) = v {
        if let Some(rest) = s.strip_prefix('?') {
            return Ok(Term::Var(rest.to_string()));
        }
        if is_predicate && s == "a" {
            // `a` is the reserved rdf:type shorthand; left unexpanded here
            // and resolved by the `expand` closure passed to `expand_iris`.
            return Ok(Term::Iri("a".to_string()));
        }
        return Ok(Term::Iri(s.clone()));
    }
    Ok(Term::Literal(Value::from_json(v)))
}

fn parse_select_item(v: &serde_json::Value) -> Result<SelectItem> {
    match v {
        serde_json::Value::String(s) => {
            let name = s
                .strip_prefix('?')
                .ok_or_else(|| QueryError::Schema(format!("select variable must start with '?': {s}")))?;
            Ok(SelectItem::Var(name.to_string()))
        }
        serde_json::Value::Object(obj) => {
            let agg = obj
                .get("agg")
                .and_then(|v| v.as_str())
                .ok_or_else(|| QueryError::Schema("aggregate select item missing \"agg\"".into()))?;
            let agg = parse_agg_kind(agg)?;
            let expr = match obj.get("expr") {
                Some(serde_json::Value::String(s)) => Some(ldc_expr::parse(s)?),
                Some(_) => return Err(QueryError::Schema("\"expr\" must be a string".into())),
                None => None,
            };
            if expr.is_none() && agg != AggKind::Count {
                return Err(QueryError::Schema(format!(
                    "aggregate \"{agg:?}\" requires an \"expr\""
                )));
            }
            let alias = obj
                .get("as")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{agg:?}").to_lowercase());
            Ok(SelectItem::Aggregate { agg, expr, alias })
        }
        _ => Err(QueryError::Schema("select entries must be strings or objects".into())),
    }
}

fn parse_agg_kind(s: &str) -> Result<AggKind> {
    Ok(match s {
        "sum" => AggKind::Sum,
        "count" => AggKind::Count,
        "min" => AggKind::Min,
        "max" => AggKind::Max,
        "avg" => AggKind::Avg,
        other => return Err(QueryError::Schema(format!("unknown aggregate \"{other}\""))),
    })
}

fn parse_order_key(v: &serde_json::Value) -> Result<OrderKey> {
    let s = v
        .as_str()
        .ok_or_else(|| QueryError::Schema("orderBy entries must be strings".into()))?;
    let mut parts = s.split_whitespace();
    let first = parts
        .next()
        .ok_or_else(|| QueryError::Schema("orderBy entry must not be empty".into()))?;
    let (descending, var) = match first {
        "asc" | "desc" => {
            let var = parts
                .next()
                .ok_or_else(|| QueryError::Schema(format!("orderBy entry \"{s}\" missing a variable")))?;
            (first == "desc", var)
        }
        _ => (false, first),
    };
    Ok(OrderKey {
        var: strip_var_sigil(var),
        descending,
    })
}

fn strip_var_sigil(s: &str) -> String {
    s.strip_prefix('?').unwrap_or(s).to_string()
}
