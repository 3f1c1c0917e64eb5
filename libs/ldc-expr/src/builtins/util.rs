//! Utility built-ins (§4.5): type introspection, defaulting and
//! coercion.

use crate::error::{Error, Result};
use crate::interpreter::Interpreter;
use crate::value::Value;
use ldc_units::Decimal;

pub const NAMES: &[&str] = &[
    "if",
    "default",
    "coalesce",
    "type",
    "isNull",
    "isNumber",
    "isString",
    "isBool",
    "isArray",
    "toNumber",
    "toString",
    "toBool",
];

pub fn call(name: &str, args: &[Value], _interp: &Interpreter) -> Option<Result<Value>> {
    Some(match name {
        "if" => if_fn(args),
        "default" => default(args),
        "coalesce" => coalesce(args),
        "type" => type_of(args),
        "isNull" => is_null(args),
        "isNumber" => is_number(args),
        "isString" => is_string(args),
        "isBool" => is_bool(args),
        "isArray" => is_array(args),
        "toNumber" => to_number(args),
        "toString" => to_string(args),
        "toBool" => to_bool(args),
        _ => return None,
    })
}

fn arg(args: &[Value], i: usize, name: &str) -> Result<Value> {
    args.get(i).cloned().ok_or_else(|| Error::Arity {
        name: name.to_string(),
        expected: format!("{}", i + 1),
        got: args.len(),
    })
}

/// `$if(cond, then, else)`: the function form of `cond ? then : else`.
/// Unlike the ternary operator, all three arguments are evaluated eagerly
/// by call-site argument evaluation, so `then`/`else` must not depend on
/// `cond` having been true/false to avoid erroring.
fn if_fn(args: &[Value]) -> Result<Value> {
    let cond = arg(args, 0, "if")?;
    if cond.is_truthy() {
        arg(args, 1, "if")
    } else {
        arg(args, 2, "if")
    }
}

/// `default(value, fallback)`: returns `value` unless it is `null`.
fn default(args: &[Value]) -> Result<Value> {
    let v = arg(args, 0, "default")?;
    if !v.is_null() {
        return Ok(v);
    }
    arg(args, 1, "default")
}

/// `coalesce(...values)`: the first non-null argument, or `null` if every
/// argument is null (or there are none).
fn coalesce(args: &[Value]) -> Result<Value> {
    Ok(args.iter().find(|v| !v.is_null()).cloned().unwrap_or(Value::Null))
}

fn type_of(args: &[Value]) -> Result<Value> {
    Ok(Value::str(arg(args, 0, "type")?.type_name()))
}

fn is_null(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(arg(args, 0, "isNull")?.is_null()))
}

fn is_number(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(matches!(arg(args, 0, "isNumber")?, Value::Int(_) | Value::Decimal(_))))
}

fn is_string(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(matches!(arg(args, 0, "isString")?, Value::Str(_))))
}

fn is_bool(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(matches!(arg(args, 0, "isBool")?, Value::Bool(_))))
}

fn is_array(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(matches!(arg(args, 0, "isArray")?, Value::Array(_))))
}

/// `toNumber(v)`: parses strings, passes numbers through, coerces bool to
/// `0`/`1`. Anything else is a type error.
fn to_number(args: &[Value]) -> Result<Value> {
    match arg(args, 0, "toNumber")? {
        v @ Value::Int(_) => Ok(v),
        v @ Value::Decimal(_) => Ok(v),
        Value::Bool(b) => Ok(Value::Int(if b { 1 } else { 0 })),
        Value::Str(s) => {
            if let Ok(i) = s.parse::<i64>() {
                Ok(Value::Int(i))
            } else {
                Decimal::from_str_exact(&s)
                    .map(Value::Decimal)
                    .map_err(|_| Error::Type(format!("toNumber: cannot parse '{s}' as a number")))
            }
        }
        other => Err(Error::Type(format!("toNumber: cannot convert {} to a number", other.type_name()))),
    }
}

fn to_string(args: &[Value]) -> Result<Value> {
    let v = arg(args, 0, "toString")?;
    v.to_triple_object(None)
        .map(Value::str)
        .ok_or_else(|| Error::Type(format!("toString: cannot convert {} to a string", v.type_name())))
}

fn to_bool(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(arg(args, 0, "toBool")?.is_truthy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_of_reports_variant_name() {
        assert_eq!(type_of(&[Value::Int(1)]).unwrap(), Value::str("integer"));
    }

    #[test]
    fn default_falls_back_only_on_null() {
        assert_eq!(default(&[Value::Null, Value::Int(5)]).unwrap(), Value::Int(5));
        assert_eq!(default(&[Value::Int(0), Value::Int(5)]).unwrap(), Value::Int(0));
    }

    #[test]
    fn coalesce_picks_first_non_null() {
        assert_eq!(coalesce(&[Value::Null, Value::Null, Value::Int(3), Value::Int(4)]).unwrap(), Value::Int(3));
        assert_eq!(coalesce(&[Value::Null]).unwrap(), Value::Null);
    }

    #[test]
    fn type_predicates() {
        assert_eq!(is_number(&[Value::Int(1)]).unwrap(), Value::Bool(true));
        assert_eq!(is_string(&[Value::Int(1)]).unwrap(), Value::Bool(false));
        assert_eq!(is_array(&[Value::array(vec![])]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn to_number_parses_strings() {
        assert_eq!(to_number(&[Value::str("42")]).unwrap(), Value::Int(42));
        assert_eq!(to_number(&[Value::str("3.5")]).unwrap(), Value::Decimal(Decimal::from_str_exact("3.5").unwrap()));
    }

    #[test]
    fn to_bool_uses_truthiness() {
        assert_eq!(to_bool(&[Value::Int(0)]).unwrap(), Value::Bool(false));
        assert_eq!(to_bool(&[Value::str("x")]).unwrap(), Value::Bool(true));
    }
}
