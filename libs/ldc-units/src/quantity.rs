//! Quantity arithmetic: a magnitude paired with a unit (§4.2).

use crate::decimal::Decimal;
use crate::error::{Error, Result};
use crate::unit::Unit;

#[derive(Clone, Debug, PartialEq)]
pub struct Quantity {
    pub magnitude: Decimal,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: Decimal, unit: Unit) -> Self {
        Quantity { magnitude, unit }
    }

    /// Addition/subtraction require equal dimension vectors; magnitudes are
    /// converted to base dimensions and combined, the resulting unit is the
    /// left operand's unit (dim preserved).
    pub fn add(&self, other: &Quantity) -> Result<Quantity> {
        self.require_same_dim(other)?;
        let base_sum = self.unit.to_base(self.magnitude).add(other.unit.to_base(other.magnitude));
        let magnitude = self.unit.from_base(base_sum)?;
        Ok(Quantity::new(magnitude, self.unit.clone()))
    }

    pub fn sub(&self, other: &Quantity) -> Result<Quantity> {
        self.require_same_dim(other)?;
        let base_diff = self.unit.to_base(self.magnitude).sub(other.unit.to_base(other.magnitude));
        let magnitude = self.unit.from_base(base_diff)?;
        Ok(Quantity::new(magnitude, self.unit.clone()))
    }

    /// Multiplication/division add/subtract dimension vectors component-wise;
    /// magnitudes convert to base and combine.
    pub fn mul(&self, other: &Quantity) -> Result<Quantity> {
        let unit = self.unit.mul(&other.unit);
        let base = self.unit.to_base(self.magnitude).mul(other.unit.to_base(other.magnitude));
        let magnitude = unit.from_base(base)?;
        Ok(Quantity::new(magnitude, unit))
    }

    pub fn div(&self, other: &Quantity) -> Result<Quantity> {
        let unit = self.unit.div(&other.unit)?;
        let base = self.unit.to_base(self.magnitude).div(other.unit.to_base(other.magnitude))?;
        let magnitude = unit.from_base(base)?;
        Ok(Quantity::new(magnitude, unit))
    }

    /// Scalar * quantity: scales magnitude, preserves unit.
    pub fn scale(&self, scalar: Decimal) -> Quantity {
        Quantity::new(self.magnitude.mul(scalar), self.unit.clone())
    }

    fn require_same_dim(&self, other: &Quantity) -> Result<()> {
        if self.unit.dim != other.unit.dim {
            return Err(Error::DimensionMismatch {
                from: self.unit.name.clone(),
                to: other.unit.name.clone(),
            });
        }
        Ok(())
    }

    /// Convert this quantity into another unit of the same dimension.
    pub fn convert_to(&self, target: &Unit) -> Result<Quantity> {
        if self.unit.dim != target.dim {
            return Err(Error::DimensionMismatch {
                from: self.unit.name.clone(),
                to: target.name.clone(),
            });
        }
        let base = self.unit.to_base(self.magnitude);
        let magnitude = target.from_base(base)?;
        Ok(Quantity::new(magnitude, target.clone()))
    }

    /// True when this quantity's dimension reduces to exactly one
    /// component at exponent 1 and that component is a currency code
    /// (`UnitRegistry::with_defaults`'s convention of naming a currency's
    /// dimension after its own ISO 4217 code — three uppercase letters).
    pub fn is_single_currency_dimension(&self) -> bool {
        matches!(self.unit.dim.as_single(), Some((name, 1)) if is_currency_code(name))
    }

    /// True when the unit's own display name no longer matches its
    /// dimension code — it was assembled by [`Unit::mul`]/[`Unit::div`]
    /// rather than parsed straight off a currency literal, so `unit.name`
    /// (e.g. `"USD*USD/USD"`) isn't presentable as a currency code.
    pub fn is_synthetic_unit(&self) -> bool {
        match self.unit.dim.as_single() {
            Some((name, _)) => self.unit.name != name,
            None => true,
        }
    }
}

fn is_currency_code(name: &str) -> bool {
    name.len() == 3 && name.bytes().all(|b| b.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::UnitRegistry;

    #[test]
    fn add_same_dimension_converts_through_base() {
        let reg = UnitRegistry::with_defaults();
        let km = reg.parse("km").unwrap();
        let m = reg.parse("m").unwrap();
        let a = Quantity::new(Decimal::from_i64(1), km);
        let b = Quantity::new(Decimal::from_i64(500), m);
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.magnitude.to_canonical_string(), "1.5");
    }

    #[test]
    fn add_mismatched_dimension_errors() {
        let reg = UnitRegistry::with_defaults();
        let usd = reg.parse("USD").unwrap();
        let eur = reg.parse("EUR").unwrap();
        let a = Quantity::new(Decimal::from_i64(100), usd);
        let b = Quantity::new(Decimal::from_i64(50), eur);
        assert!(a.add(&b).is_err());
    }

    #[test]
    fn mul_combines_dimensions() {
        let reg = UnitRegistry::with_defaults();
        let m = reg.parse("m").unwrap();
        let s = reg.parse("s").unwrap();
        let length = Quantity::new(Decimal::from_i64(10), m);
        let time = Quantity::new(Decimal::from_i64(2), s);
        let product = length.mul(&time).unwrap();
        assert_eq!(product.unit.dim.exponent("length"), 1);
        assert_eq!(product.unit.dim.exponent("time"), 1);
    }

    #[test]
    fn div_subtracts_dimensions_to_zero() {
        let reg = UnitRegistry::with_defaults();
        let m = reg.parse("m").unwrap();
        let m2 = reg.parse("m").unwrap();
        let a = Quantity::new(Decimal::from_i64(10), m);
        let b = Quantity::new(Decimal::from_i64(2), m2);
        let ratio = a.div(&b).unwrap();
        assert!(ratio.unit.dim.is_dimensionless());
    }
}
