//! Unit conversion built-in (§4.5).
//!
//! `$convert` has its own small conversion table rather than reusing the
//! host's [`ldc_units::UnitRegistry`] wholesale: temperature conversions
//! are affine (`C -> F` adds an offset), not the multiplicative
//! factor-through-base-unit model the rest of `ldc-units` uses.

use crate::error::{Error, Result};
use crate::interpreter::Interpreter;
use crate::value::Value;
use ldc_units::{Decimal, UnitRegistry};

pub const NAMES: &[&str] = &["convert"];

pub fn call(name: &str, args: &[Value], _interp: &Interpreter) -> Option<Result<Value>> {
    Some(match name {
        "convert" => convert(args),
        _ => return None,
    })
}

fn convert(args: &[Value]) -> Result<Value> {
    let value = match args.first() {
        Some(Value::Int(i)) => Decimal::from_i64(*i),
        Some(Value::Decimal(d)) => *d,
        Some(other) => return Err(Error::Type(format!("convert: expected a number, found {}", other.type_name()))),
        None => return Err(Error::Arity { name: "convert".into(), expected: "3".into(), got: 0 }),
    };
    let from = match args.get(1) {
        Some(Value::Str(s)) => s.to_string(),
        _ => return Err(Error::Type("convert: expected a source unit string".into())),
    };
    let to = match args.get(2) {
        Some(Value::Str(s)) => s.to_string(),
        _ => return Err(Error::Type("convert: expected a target unit string".into())),
    };

    if let Some(result) = temperature_convert(value, &from, &to) {
        return result.map(Value::Decimal);
    }

    let registry = UnitRegistry::with_defaults();
    let from_unit = registry
        .parse(&from)
        .ok_or_else(|| Error::Units(ldc_units::Error::UnknownUnit(from.clone())))?;
    let to_unit = registry
        .parse(&to)
        .ok_or_else(|| Error::Units(ldc_units::Error::UnknownUnit(to.clone())))?;
    let quantity = ldc_units::Quantity::new(value, from_unit).convert_to(&to_unit)?;
    Ok(Value::Decimal(quantity.magnitude))
}

/// Affine conversions between Celsius, Fahrenheit and Kelvin, pivoting
/// through Celsius. Returns `None` when neither unit is a recognized
/// temperature scale, so the caller falls back to the multiplicative table.
fn temperature_convert(value: Decimal, from: &str, to: &str) -> Option<Result<Decimal>> {
    let is_temp = |u: &str| matches!(u, "C" | "F" | "K" | "celsius" | "fahrenheit" | "kelvin");
    if !is_temp(from) || !is_temp(to) {
        return None;
    }
    let f = value.to_f64()?;
    let celsius = match from {
        "C" | "celsius" => f,
        "F" | "fahrenheit" => (f - 32.0) * 5.0 / 9.0,
        "K" | "kelvin" => f - 273.15,
        _ => return Some(Err(Error::Units(ldc_units::Error::UnknownUnit(from.to_string())))),
    };
    let result = match to {
        "C" | "celsius" => celsius,
        "F" | "fahrenheit" => celsius * 9.0 / 5.0 + 32.0,
        "K" | "kelvin" => celsius + 273.15,
        _ => return Some(Err(Error::Units(ldc_units::Error::UnknownUnit(to.to_string())))),
    };
    Some(
        Decimal::from_f64(result)
            .ok_or_else(|| Error::Type("convert: temperature result out of range".into())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn celsius_to_fahrenheit() {
        let d = Decimal::from_i64(100);
        let result = convert(&[Value::Decimal(d), Value::str("C"), Value::str("F")]).unwrap();
        assert_eq!(result, Value::Decimal(Decimal::from_i64(212)));
    }

    #[test]
    fn length_conversion_delegates_to_registry() {
        let result = convert(&[Value::Int(1000), Value::str("m"), Value::str("km")]).unwrap();
        assert_eq!(result, Value::Decimal(Decimal::from_i64(1)));
    }

    #[test]
    fn unknown_unit_errors() {
        let result = convert(&[Value::Int(1), Value::str("furlong"), Value::str("m")]);
        assert!(result.is_err());
    }
}
