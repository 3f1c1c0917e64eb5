//! Unit registry and compound unit name parsing (C2, §4.2).

use crate::decimal::Decimal;
use crate::dimension::DimensionVector;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// A single atomic unit definition: its dimension name and the multiplicative
/// factor that converts a magnitude in this unit to its base (factor 1) unit
/// of that dimension.
#[derive(Clone, Debug)]
pub struct AtomicUnitDef {
    pub dimension: String,
    pub base_factor: Decimal,
}

/// A resolved unit, possibly compound (`"km/h"`, `"m/s^2"`).
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    /// The exact text the unit was parsed from (preserved for round-tripping
    /// unknown/opaque unit strings, per §4.2 "parsing failure returns
    /// undefined, not an error").
    pub name: String,
    pub factor: Decimal,
    pub dim: DimensionVector,
}

impl Unit {
    pub fn dimensionless() -> Self {
        Unit {
            name: "1".to_string(),
            factor: Decimal::ONE,
            dim: DimensionVector::dimensionless(),
        }
    }

    pub fn to_base(&self, magnitude: Decimal) -> Decimal {
        magnitude.mul(self.factor)
    }

    pub fn from_base(&self, base_magnitude: Decimal) -> Result<Decimal> {
        base_magnitude.div(self.factor)
    }

    pub fn mul(&self, other: &Unit) -> Unit {
        Unit {
            name: format!("{}*{}", self.name, other.name),
            factor: self.factor.mul(other.factor),
            dim: self.dim.mul(&other.dim),
        }
    }

    pub fn div(&self, other: &Unit) -> Result<Unit> {
        Ok(Unit {
            name: format!("{}/{}", self.name, other.name),
            factor: self.factor.div(other.factor)?,
            dim: self.dim.div(&other.dim),
        })
    }
}

/// Registry of atomic unit definitions, with compound-name parsing on top.
///
/// Implements the `units` half of the host contract in §6 (`get`, `list`).
#[derive(Clone, Debug, Default)]
pub struct UnitRegistry {
    atoms: HashMap<String, AtomicUnitDef>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        UnitRegistry {
            atoms: HashMap::new(),
        }
    }

    /// A registry seeded with the dimensions named throughout §4.5's
    /// `$convert` table, plus a couple of freestanding currency atoms. Hosts
    /// may extend or replace this via [`UnitRegistry::define`].
    pub fn with_defaults() -> Self {
        let mut r = UnitRegistry::new();
        let one = Decimal::ONE;
        let d = |s: &str| Decimal::from_str_exact(s).expect("literal decimal");

        // Length, base = meter.
        r.define("m", "length", one);
        r.define("km", "length", d("1000"));
        r.define("cm", "length", d("0.01"));
        r.define("mm", "length", d("0.001"));
        r.define("in", "length", d("0.0254"));
        r.define("ft", "length", d("0.3048"));
        r.define("mi", "length", d("1609.344"));

        // Mass, base = gram.
        r.define("g", "mass", one);
        r.define("kg", "mass", d("1000"));
        r.define("mg", "mass", d("0.001"));
        r.define("lb", "mass", d("453.59237"));
        r.define("oz", "mass", d("28.349523125"));

        // Time, base = second.
        r.define("s", "time", one);
        r.define("ms", "time", d("0.001"));
        r.define("min", "time", d("60"));
        r.define("h", "time", d("3600"));
        r.define("d", "time", d("86400"));

        // Volume, base = liter.
        r.define("L", "volume", one);
        r.define("mL", "volume", d("0.001"));
        r.define("gal", "volume", d("3.785411784"));
        r.define("qt", "volume", d("0.946352946"));
        r.define("pt", "volume", d("0.473176473"));
        r.define("cup", "volume", d("0.2365882365"));
        r.define("floz", "volume", d("0.0295735295625"));

        // Each currency is its own dimension by default: mixing currencies
        // without an explicitly registered conversion is a dimension
        // mismatch (§8 scenario 4). Hosts register real exchange rates via
        // `define` when conversions should succeed instead.
        r.define("USD", "USD", one);
        r.define("EUR", "EUR", one);
        r.define("GBP", "GBP", one);

        r
    }

    pub fn define(&mut self, name: &str, dimension: &str, base_factor: Decimal) {
        self.atoms.insert(
            name.to_string(),
            AtomicUnitDef {
                dimension: dimension.to_string(),
                base_factor,
            },
        );
    }

    pub fn get_atom(&self, name: &str) -> Option<&AtomicUnitDef> {
        self.atoms.get(name)
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.atoms.keys().cloned().collect();
        names.sort();
        names
    }

    /// Parse a compound unit string. Returns `None` (not an error) on
    /// syntax failure or unknown atom, per §4.2: "callers may treat the
    /// string as opaque".
    pub fn parse(&self, text: &str) -> Option<Unit> {
        CompoundParser::new(text).parse(self).ok()
    }
}

/// Grammar: `term (('*'|'/') term)*`, `term := name('^' int)?`.
struct CompoundParser<'a> {
    chars: Vec<char>,
    pos: usize,
    source: &'a str,
}

impl<'a> CompoundParser<'a> {
    fn new(source: &'a str) -> Self {
        CompoundParser {
            chars: source.chars().collect(),
            pos: 0,
            source,
        }
    }

    fn parse(&mut self, registry: &UnitRegistry) -> Result<Unit> {
        let (name, exp) = self.term()?;
        let mut unit = self.atom_unit(registry, &name, exp)?;

        while let Some(op) = self.peek() {
            if op != '*' && op != '/' {
                break;
            }
            self.pos += 1;
            let (name, exp) = self.term()?;
            let rhs = self.atom_unit(registry, &name, exp)?;
            unit = if op == '*' {
                unit.mul(&rhs)
            } else {
                unit.div(&rhs)
                    .map_err(|_| Error::Syntax("division overflow in compound unit".into()))?
            };
        }

        if self.pos != self.chars.len() {
            return Err(Error::Syntax(format!(
                "trailing characters in unit '{}'",
                self.source
            )));
        }

        unit.name = self.source.to_string();
        Ok(unit)
    }

    fn term(&mut self) -> Result<(String, i32)> {
        let name = self.name()?;
        let exp = if self.peek() == Some('^') {
            self.pos += 1;
            self.int()?
        } else {
            1
        };
        Ok((name, exp))
    }

    fn name(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '%' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(Error::Syntax(format!(
                "expected unit name at byte {}",
                start
            )));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn int(&mut self) -> Result<i32> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(Error::Syntax("expected integer exponent".into()));
        }
        self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .parse()
            .map_err(|_| Error::Syntax("invalid integer exponent".into()))
    }

    fn atom_unit(&self, registry: &UnitRegistry, name: &str, exp: i32) -> Result<Unit> {
        let def = registry
            .get_atom(name)
            .ok_or_else(|| Error::UnknownUnit(name.to_string()))?;
        let dim = DimensionVector::single(def.dimension.clone(), exp);
        let factor = def.base_factor.pow(Decimal::from_i64(exp as i64))?;
        Ok(Unit {
            name: name.to_string(),
            factor,
            dim,
        })
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_atom() {
        let reg = UnitRegistry::with_defaults();
        let u = reg.parse("km").unwrap();
        assert_eq!(u.dim.exponent("length"), 1);
    }

    #[test]
    fn parses_compound_division() {
        let reg = UnitRegistry::with_defaults();
        let u = reg.parse("km/h").unwrap();
        assert_eq!(u.dim.exponent("length"), 1);
        assert_eq!(u.dim.exponent("time"), -1);
    }

    #[test]
    fn parses_exponent() {
        let reg = UnitRegistry::with_defaults();
        let u = reg.parse("m^2").unwrap();
        assert_eq!(u.dim.exponent("length"), 2);
    }

    #[test]
    fn unknown_unit_returns_none() {
        let reg = UnitRegistry::with_defaults();
        assert!(reg.parse("furlong").is_none());
    }

    #[test]
    fn trailing_garbage_returns_none() {
        let reg = UnitRegistry::with_defaults();
        assert!(reg.parse("km/").is_none());
    }
}
