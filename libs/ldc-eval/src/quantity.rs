//! Coerces quantity-shaped document strings (`"100 USD"`) into
//! `Value::Quantity` before the root scope is built, so arithmetic over
//! unit-bearing literals works the way §4.2/§8 scenario 4 expects.
//!
//! Grounded in the fhirpath VM's `toQuantity` conversion: the same
//! "decimal, whitespace, unit text" regex, the same `OnceLock<Regex>`
//! idiom to compile it once, and the same "no match ⇒ leave it alone"
//! fallback rather than an error.

use ldc_expr::Value;
use ldc_units::{Decimal, Quantity, UnitRegistry};
use regex::Regex;
use std::sync::OnceLock;

static QUANTITY_RE: OnceLock<Regex> = OnceLock::new();

fn quantity_re() -> &'static Regex {
    QUANTITY_RE.get_or_init(|| {
        Regex::new(r"^\s*(?P<value>[+-]?\d+(?:\.\d+)?)\s+(?P<unit>\S.*?)\s*$")
            .expect("quantity regex must compile")
    })
}

/// Rewrites `value`, recursing into arrays/objects. A `Value::Str`
/// matching `<decimal> <unit>` against a unit the registry recognizes
/// becomes a `Value::Quantity`; everything else — including a decimal
/// paired with an unrecognized unit string — is left untouched, per
/// §4.2's "parsing failure returns undefined, not an error".
pub fn coerce(value: Value, units: &UnitRegistry) -> Value {
    match &value {
        Value::Str(s) => match quantity_re().captures(s) {
            Some(caps) => {
                let magnitude = Decimal::from_str_exact(&caps["value"]).ok();
                let unit = units.parse(&caps["unit"]);
                match (magnitude, unit) {
                    (Some(magnitude), Some(unit)) => Value::Quantity(Quantity::new(magnitude, unit)),
                    _ => value,
                }
            }
            None => value,
        },
        Value::Array(items) => Value::array(items.iter().cloned().map(|v| coerce(v, units)).collect()),
        Value::Object(map) => {
            let mut out = indexmap::IndexMap::new();
            for (k, v) in map.iter() {
                out.insert(k.clone(), coerce(v.clone(), units));
            }
            Value::object(out)
        }
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_decimal_and_known_unit_becomes_a_quantity() {
        let units = UnitRegistry::with_defaults();
        let v = coerce(Value::str("100 USD"), &units);
        assert!(matches!(v, Value::Quantity(_)));
    }

    #[test]
    fn an_unrecognized_unit_is_left_as_a_string() {
        let units = UnitRegistry::with_defaults();
        let v = coerce(Value::str("100 furlongs"), &units);
        assert_eq!(v, Value::str("100 furlongs"));
    }

    #[test]
    fn a_plain_string_is_untouched() {
        let units = UnitRegistry::with_defaults();
        let v = coerce(Value::str("active"), &units);
        assert_eq!(v, Value::str("active"));
    }

    #[test]
    fn recurses_into_nested_objects() {
        let units = UnitRegistry::with_defaults();
        let mut map = indexmap::IndexMap::new();
        map.insert("price".to_string(), Value::str("50 EUR"));
        let v = coerce(Value::object(map), &units);
        assert!(matches!(v.as_object().unwrap().get("price"), Some(Value::Quantity(_))));
    }
}
