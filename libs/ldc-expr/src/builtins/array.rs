//! Array built-ins (§4.5). `sort` is the one higher-order function in
//! this category: its optional comparator argument calls back into the
//! interpreter to invoke a lambda.

use crate::error::{Error, Result};
use crate::interpreter::Interpreter;
use crate::value::Value;
use ldc_units::Decimal;
use std::cmp::Ordering;

pub const NAMES: &[&str] = &[
    "first", "last", "at", "slice", "reverse", "sort", "unique", "flatten", "count", "sum", "avg",
    "min", "max",
];

pub fn call(name: &str, args: &[Value], interp: &Interpreter) -> Option<Result<Value>> {
    Some(match name {
        "first" => first(args),
        "last" => last(args),
        "at" => at(args),
        "slice" => slice(args),
        "reverse" => reverse(args),
        "sort" => sort(args, interp),
        "unique" => unique(args),
        "flatten" => flatten(args),
        "count" => count(args),
        "sum" => sum(args),
        "avg" => avg(args),
        "min" => min(args),
        "max" => max(args),
        _ => return None,
    })
}

fn array_arg(args: &[Value], i: usize, name: &str) -> Result<std::rc::Rc<Vec<Value>>> {
    match args.get(i) {
        Some(Value::Array(a)) => Ok(a.clone()),
        Some(other) => Err(Error::Type(format!(
            "{name}: expected an array, found {}",
            other.type_name()
        ))),
        None => Err(Error::Arity {
            name: name.to_string(),
            expected: format!("{}", i + 1),
            got: args.len(),
        }),
    }
}

fn first(args: &[Value]) -> Result<Value> {
    let items = array_arg(args, 0, "first")?;
    Ok(items.first().cloned().unwrap_or(Value::Null))
}

fn last(args: &[Value]) -> Result<Value> {
    let items = array_arg(args, 0, "last")?;
    Ok(items.last().cloned().unwrap_or(Value::Null))
}

/// `at(arr, index)`: bounds-safe element access; negative or out-of-range
/// indices return `null` rather than erroring, matching index-expression
/// semantics elsewhere in the language.
fn at(args: &[Value]) -> Result<Value> {
    let items = array_arg(args, 0, "at")?;
    let index = match args.get(1) {
        Some(Value::Int(n)) => *n,
        Some(other) => return Err(Error::Type(format!("at: expected an integer index, found {}", other.type_name()))),
        None => return Err(Error::Arity { name: "at".into(), expected: "2".into(), got: 1 }),
    };
    if index < 0 {
        return Ok(Value::Null);
    }
    Ok(items.get(index as usize).cloned().unwrap_or(Value::Null))
}

fn slice(args: &[Value]) -> Result<Value> {
    let items = array_arg(args, 0, "slice")?;
    let start = match args.get(1) {
        Some(Value::Int(n)) => (*n).max(0) as usize,
        Some(other) => return Err(Error::Type(format!("slice: expected an integer start, found {}", other.type_name()))),
        None => 0,
    };
    let end = match args.get(2) {
        Some(Value::Int(n)) => (*n).max(0) as usize,
        Some(other) => return Err(Error::Type(format!("slice: expected an integer end, found {}", other.type_name()))),
        None => items.len(),
    }
    .min(items.len());
    if start >= end {
        return Ok(Value::array(Vec::new()));
    }
    Ok(Value::array(items[start..end].to_vec()))
}

fn reverse(args: &[Value]) -> Result<Value> {
    let items = array_arg(args, 0, "reverse")?;
    let mut out: Vec<Value> = (*items).clone();
    out.reverse();
    Ok(Value::array(out))
}

/// `sort(arr[, cmp])`: with a comparator lambda, calls it as `cmp(a, b)`
/// expecting a negative/zero/positive integer; without one, falls back to
/// a default ordering over strings, timestamps and numbers.
fn sort(args: &[Value], interp: &Interpreter) -> Result<Value> {
    let items = array_arg(args, 0, "sort")?;
    let mut out: Vec<Value> = (*items).clone();
    match args.get(1) {
        Some(f @ Value::Function(_)) => {
            let mut err = None;
            out.sort_by(|a, b| {
                if err.is_some() {
                    return Ordering::Equal;
                }
                match interp.call_function(f.clone(), None, vec![a.clone(), b.clone()]) {
                    Ok(Value::Int(n)) => n.cmp(&0),
                    Ok(other) => {
                        err = Some(Error::Type(format!(
                            "sort: comparator must return an integer, found {}",
                            other.type_name()
                        )));
                        Ordering::Equal
                    }
                    Err(e) => {
                        err = Some(e);
                        Ordering::Equal
                    }
                }
            });
            if let Some(e) = err {
                return Err(e);
            }
        }
        Some(other) => {
            return Err(Error::Type(format!(
                "sort: expected a comparator function, found {}",
                other.type_name()
            )))
        }
        None => {
            let mut err = None;
            out.sort_by(|a, b| match compare_values(a, b) {
                Ok(o) => o,
                Err(e) => {
                    err.get_or_insert(e);
                    Ordering::Equal
                }
            });
            if let Some(e) = err {
                return Err(e);
            }
        }
    }
    Ok(Value::array(out))
}

fn compare_values(a: &Value, b: &Value) -> Result<Ordering> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::Timestamp(x), Value::Timestamp(y)) => Ok(x.cmp(y)),
        (Value::Int(_) | Value::Decimal(_), Value::Int(_) | Value::Decimal(_)) => {
            let x = as_decimal(a)?;
            let y = as_decimal(b)?;
            Ok(x.compare(y))
        }
        _ => Err(Error::Type(format!(
            "cannot compare {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn as_decimal(v: &Value) -> Result<Decimal> {
    match v {
        Value::Int(i) => Ok(Decimal::from_i64(*i)),
        Value::Decimal(d) => Ok(*d),
        other => Err(Error::Type(format!("expected a number, found {}", other.type_name()))),
    }
}

fn unique(args: &[Value]) -> Result<Value> {
    let items = array_arg(args, 0, "unique")?;
    let mut out: Vec<Value> = Vec::new();
    for item in items.iter() {
        if !out.iter().any(|v| v == item) {
            out.push(item.clone());
        }
    }
    Ok(Value::array(out))
}

fn flatten(args: &[Value]) -> Result<Value> {
    let items = array_arg(args, 0, "flatten")?;
    let mut out = Vec::new();
    for item in items.iter() {
        match item {
            Value::Array(inner) => out.extend(inner.iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    Ok(Value::array(out))
}

fn count(args: &[Value]) -> Result<Value> {
    let items = array_arg(args, 0, "count")?;
    Ok(Value::Int(items.len() as i64))
}

fn sum(args: &[Value]) -> Result<Value> {
    let items = array_arg(args, 0, "sum")?;
    let all_int = items.iter().all(|v| matches!(v, Value::Int(_)));
    let mut acc = Decimal::ZERO;
    for v in items.iter() {
        acc = acc.add(as_decimal(v)?);
    }
    Ok(if all_int {
        acc.to_i64().map(Value::Int).unwrap_or(Value::Decimal(acc))
    } else {
        Value::Decimal(acc)
    })
}

fn avg(args: &[Value]) -> Result<Value> {
    let items = array_arg(args, 0, "avg")?;
    if items.is_empty() {
        return Err(Error::Type("avg: cannot average an empty array".into()));
    }
    let mut acc = Decimal::ZERO;
    for v in items.iter() {
        acc = acc.add(as_decimal(v)?);
    }
    let n = Decimal::from_i64(items.len() as i64);
    Ok(Value::Decimal(acc.div(n).map_err(|_| Error::DivByZero)?))
}

fn min(args: &[Value]) -> Result<Value> {
    let items = array_arg(args, 0, "min")?;
    fold_extreme(&items, Ordering::Less)
}

fn max(args: &[Value]) -> Result<Value> {
    let items = array_arg(args, 0, "max")?;
    fold_extreme(&items, Ordering::Greater)
}

fn fold_extreme(items: &[Value], keep_if: Ordering) -> Result<Value> {
    let mut iter = items.iter();
    let mut best = iter
        .next()
        .cloned()
        .ok_or_else(|| Error::Type("cannot fold an empty array".into()))?;
    for v in iter {
        if compare_values(v, &best)? == keep_if {
            best = v.clone();
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_preserves_integer_result() {
        let arr = Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(sum(&[arr]).unwrap(), Value::Int(6));
    }

    #[test]
    fn unique_removes_duplicates() {
        let arr = Value::array(vec![Value::Int(1), Value::Int(1), Value::Int(2)]);
        assert_eq!(unique(&[arr]).unwrap(), Value::array(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn at_is_bounds_safe() {
        let arr = Value::array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(at(&[arr.clone(), Value::Int(1)]).unwrap(), Value::Int(2));
        assert_eq!(at(&[arr.clone(), Value::Int(5)]).unwrap(), Value::Null);
        assert_eq!(at(&[arr, Value::Int(-1)]).unwrap(), Value::Null);
    }

    #[test]
    fn sort_default_ascending() {
        let arr = Value::array(vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
        let interp = Interpreter::new();
        let result = sort(&[arr], &interp).unwrap();
        assert_eq!(result, Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    }

    #[test]
    fn sort_with_comparator() {
        let arr = Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let interp = Interpreter::new();
        let cmp = Value::Function(crate::value::FunctionValue::Closure {
            params: std::rc::Rc::new(vec!["a".to_string(), "b".to_string()]),
            body: std::rc::Rc::new(crate::ast::AstNode::Binary {
                op: crate::ast::BinaryOp::Sub,
                left: Box::new(crate::ast::AstNode::Identifier(std::rc::Rc::from("b"))),
                right: Box::new(crate::ast::AstNode::Identifier(std::rc::Rc::from("a"))),
            }),
            captured: crate::scope::Scope::root(),
        });
        let result = sort(&[arr, cmp], &interp).unwrap();
        assert_eq!(result, Value::array(vec![Value::Int(3), Value::Int(2), Value::Int(1)]));
    }

    #[test]
    fn flatten_merges_one_level() {
        let arr = Value::array(vec![
            Value::array(vec![Value::Int(1), Value::Int(2)]),
            Value::Int(3),
        ]);
        assert_eq!(flatten(&[arr]).unwrap(), Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    }
}
