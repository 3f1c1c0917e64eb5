//! Math built-ins (§4.5). One file per category, mirroring the teacher's
//! `vm/functions/*.rs` layout.

use crate::error::{Error, Result};
use crate::interpreter::Interpreter;
use crate::value::Value;
use ldc_units::Decimal;

pub const NAMES: &[&str] = &[
    "sqrt", "abs", "round", "floor", "ceil", "pow", "log", "log10", "sin", "cos", "tan", "pi", "e",
    "random",
];

pub fn call(name: &str, args: &[Value], _interp: &Interpreter) -> Option<Result<Value>> {
    Some(match name {
        "sqrt" => sqrt(args),
        "abs" => abs(args),
        "round" => round(args),
        "floor" => floor(args),
        "ceil" => ceil(args),
        "pow" => pow(args),
        "log" => log(args),
        "log10" => log10(args),
        "sin" => trig(args, "sin", f64::sin),
        "cos" => trig(args, "cos", f64::cos),
        "tan" => trig(args, "tan", f64::tan),
        "pi" => Ok(Value::Decimal(Decimal::from_f64(std::f64::consts::PI).expect("pi is finite"))),
        "e" => Ok(Value::Decimal(Decimal::from_f64(std::f64::consts::E).expect("e is finite"))),
        "random" => Ok(Value::Decimal(random_unit_interval())),
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

fn as_decimal(v: &Value, name: &str) -> Result<Decimal> {
    match v {
        Value::Int(i) => Ok(Decimal::from_i64(*i)),
        Value::Decimal(d) => Ok(*d),
        other => Err(Error::Type(format!("{name}: expected a number, found {}", other.type_name()))),
    }
}

/// Preserves `Value::Int` input as `Int` output, `Decimal` as `Decimal`
/// (§4.5: "numeric built-ins preserve decimal type when the input is
/// decimal").
fn numeric_result(input: &Value, d: Decimal) -> Value {
    match input {
        Value::Int(_) => d.to_i64().map(Value::Int).unwrap_or(Value::Decimal(d)),
        _ => Value::Decimal(d),
    }
}

fn sqrt(args: &[Value]) -> Result<Value> {
    let v = arg(args, 0, "sqrt")?;
    let d = as_decimal(&v, "sqrt")?;
    if d.is_negative() {
        return Err(Error::Type("sqrt: operand must be non-negative".into()));
    }
    let f = d.to_f64().ok_or_else(|| Error::Type("sqrt: operand out of range".into()))?;
    Decimal::from_f64(f.sqrt())
        .map(Value::Decimal)
        .ok_or_else(|| Error::Type("sqrt: result out of range".into()))
}

fn abs(args: &[Value]) -> Result<Value> {
    let v = arg(args, 0, "abs")?;
    let d = as_decimal(&v, "abs")?;
    Ok(numeric_result(&v, d.abs()))
}

fn round(args: &[Value]) -> Result<Value> {
    let v = arg(args, 0, "round")?;
    let dp = match args.get(1) {
        Some(Value::Int(n)) if *n >= 0 => *n as u32,
        Some(other) => {
            return Err(Error::Type(format!(
                "round: expected a non-negative integer precision, found {}",
                other.type_name()
            )))
        }
        None => 0,
    };
    let d = as_decimal(&v, "round")?.round_dp(dp);
    if dp == 0 {
        Ok(d.to_i64().map(Value::Int).unwrap_or(Value::Decimal(d)))
    } else {
        Ok(Value::Decimal(d))
    }
}

fn floor(args: &[Value]) -> Result<Value> {
    let v = arg(args, 0, "floor")?;
    let d = as_decimal(&v, "floor")?.floor();
    Ok(d.to_i64().map(Value::Int).unwrap_or(Value::Decimal(d)))
}

fn ceil(args: &[Value]) -> Result<Value> {
    let v = arg(args, 0, "ceil")?;
    let d = as_decimal(&v, "ceil")?.ceil();
    Ok(d.to_i64().map(Value::Int).unwrap_or(Value::Decimal(d)))
}

fn pow(args: &[Value]) -> Result<Value> {
    let base = as_decimal(&arg(args, 0, "pow")?, "pow")?;
    let exp = as_decimal(&arg(args, 1, "pow")?, "pow")?;
    base.pow(exp).map(Value::Decimal).map_err(Error::from)
}

fn log(args: &[Value]) -> Result<Value> {
    let d = as_decimal(&arg(args, 0, "log")?, "log")?;
    let f = d.to_f64().ok_or_else(|| Error::Type("log: operand out of range".into()))?;
    if f <= 0.0 {
        return Err(Error::Type("log: operand must be positive".into()));
    }
    Decimal::from_f64(f.ln())
        .map(Value::Decimal)
        .ok_or_else(|| Error::Type("log: result out of range".into()))
}

fn log10(args: &[Value]) -> Result<Value> {
    let d = as_decimal(&arg(args, 0, "log10")?, "log10")?;
    let f = d.to_f64().ok_or_else(|| Error::Type("log10: operand out of range".into()))?;
    if f <= 0.0 {
        return Err(Error::Type("log10: operand must be positive".into()));
    }
    Decimal::from_f64(f.log10())
        .map(Value::Decimal)
        .ok_or_else(|| Error::Type("log10: result out of range".into()))
}

fn trig(args: &[Value], name: &str, f: fn(f64) -> f64) -> Result<Value> {
    let d = as_decimal(&arg(args, 0, name)?, name)?;
    let radians = d.to_f64().ok_or_else(|| Error::Type(format!("{name}: operand out of range")))?;
    Decimal::from_f64(f(radians))
        .map(Value::Decimal)
        .ok_or_else(|| Error::Type(format!("{name}: result out of range")))
}

/// A xorshift64* generator seeded from the system clock. `$random()` is
/// the one deliberately non-deterministic built-in (§4.5); callers relying
/// on reproducible signatures must not read it into a signed value.
fn random_unit_interval() -> Decimal {
    use std::cell::Cell;
    use std::time::{SystemTime, UNIX_EPOCH};
    std::thread_local! {
        static STATE: Cell<u64> = Cell::new(0);
    }
    let seeded = STATE.with(|s| {
        if s.get() == 0 {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0x9E3779B97F4A7C15);
            s.set(nanos | 1);
        }
        let mut x = s.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        s.set(x);
        x
    });
    let fraction = (seeded >> 11) as f64 / (1u64 << 53) as f64;
    Decimal::from_f64(fraction).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_preserves_int() {
        assert_eq!(abs(&[Value::Int(-3)]).unwrap(), Value::Int(3));
    }

    #[test]
    fn round_default_precision_returns_int() {
        let d = Decimal::from_str_exact("2.5").unwrap();
        assert_eq!(round(&[Value::Decimal(d)]).unwrap(), Value::Int(2));
    }

    #[test]
    fn sqrt_negative_errors() {
        assert!(sqrt(&[Value::Int(-4)]).is_err());
    }

    #[test]
    fn pow_is_exact_for_integers() {
        let result = pow(&[Value::Int(2), Value::Int(10)]).unwrap();
        assert_eq!(result, Value::Decimal(Decimal::from_i64(1024)));
    }

    #[test]
    fn random_stays_within_unit_interval() {
        let v = random_unit_interval();
        assert!(v.compare(Decimal::ZERO) != std::cmp::Ordering::Less);
        assert!(v.compare(Decimal::ONE) == std::cmp::Ordering::Less);
    }
}
