//! Formatting built-ins (§4.5): `$currency`, `$number`, `$percent`,
//! `$compact`. These accept an optional locale argument for API
//! compatibility with the registry's signatures, but locale-sensitive
//! rendering is out of scope (§9 "determinism and locale" — formatted
//! strings are display-only and must never flow into the signed payload
//! unless the document itself wrote them).

use crate::error::{Error, Result};
use crate::interpreter::Interpreter;
use crate::value::Value;
use ldc_units::Decimal;

pub const NAMES: &[&str] = &["currency", "number", "percent", "compact"];

pub fn call(name: &str, args: &[Value], _interp: &Interpreter) -> Option<Result<Value>> {
    Some(match name {
        "currency" => currency(args),
        "number" => number(args),
        "percent" => percent(args),
        "compact" => compact(args),
        _ => return None,
    })
}

fn decimal_arg(args: &[Value], i: usize, name: &str) -> Result<Decimal> {
    match args.get(i) {
        Some(Value::Int(n)) => Ok(Decimal::from_i64(*n)),
        Some(Value::Decimal(d)) => Ok(*d),
        Some(other) => Err(Error::Type(format!(
            "{name}: expected a number, found {}",
            other.type_name()
        ))),
        None => Err(Error::Arity {
            name: name.to_string(),
            expected: format!("{}", i + 1),
            got: args.len(),
        }),
    }
}

fn dp_arg(args: &[Value], i: usize, name: &str, default: u32) -> Result<u32> {
    match args.get(i) {
        Some(Value::Int(n)) if *n >= 0 => Ok(*n as u32),
        Some(other) => Err(Error::Type(format!(
            "{name}: expected a non-negative integer precision, found {}",
            other.type_name()
        ))),
        None => Ok(default),
    }
}

fn currency(args: &[Value]) -> Result<Value> {
    let n = decimal_arg(args, 0, "currency")?;
    let code = match args.get(1) {
        Some(Value::Str(s)) => s.to_string(),
        None => "USD".to_string(),
        Some(other) => return Err(Error::Type(format!("currency: expected a string code, found {}", other.type_name()))),
    };
    Ok(Value::str(format!("{} {}", code, n.round_dp(2).to_canonical_string())))
}

fn number(args: &[Value]) -> Result<Value> {
    let n = decimal_arg(args, 0, "number")?;
    let dp = dp_arg(args, 1, "number", 2)?;
    Ok(Value::str(n.round_dp(dp).to_canonical_string()))
}

fn percent(args: &[Value]) -> Result<Value> {
    let n = decimal_arg(args, 0, "percent")?;
    let dp = dp_arg(args, 1, "percent", 0)?;
    let scaled = n.mul(Decimal::from_i64(100)).round_dp(dp);
    Ok(Value::str(format!("{}%", scaled.to_canonical_string())))
}

fn compact(args: &[Value]) -> Result<Value> {
    let n = decimal_arg(args, 0, "compact")?;
    let f = n.to_f64().ok_or_else(|| Error::Type("compact: value out of range".into()))?;
    let abs = f.abs();
    let (scaled, suffix) = if abs >= 1_000_000_000.0 {
        (f / 1_000_000_000.0, "B")
    } else if abs >= 1_000_000.0 {
        (f / 1_000_000.0, "M")
    } else if abs >= 1_000.0 {
        (f / 1_000.0, "K")
    } else {
        (f, "")
    };
    let rendered = Decimal::from_f64(scaled)
        .ok_or_else(|| Error::Type("compact: value out of range".into()))?
        .round_dp(1)
        .to_canonical_string();
    Ok(Value::str(format!("{rendered}{suffix}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_rounds_to_precision() {
        let d = Decimal::from_str_exact("3.14159").unwrap();
        assert_eq!(number(&[Value::Decimal(d), Value::Int(2)]).unwrap(), Value::str("3.14"));
    }

    #[test]
    fn percent_scales_by_one_hundred() {
        let d = Decimal::from_str_exact("0.256").unwrap();
        assert_eq!(percent(&[Value::Decimal(d), Value::Int(1)]).unwrap(), Value::str("25.6%"));
    }

    #[test]
    fn compact_adds_suffix() {
        assert_eq!(compact(&[Value::Int(1_500_000)]).unwrap(), Value::str("1.5M"));
    }

    #[test]
    fn currency_defaults_to_usd() {
        assert_eq!(currency(&[Value::Int(10)]).unwrap(), Value::str("USD 10"));
    }
}
