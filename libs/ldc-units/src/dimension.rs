//! Dimension vectors: a component-wise exponent map over dimension names.

use std::collections::BTreeMap;

/// A dimension vector maps a dimension name (e.g. `"length"`, `"USD"`) to its
/// integer exponent. Keys with exponent zero are never retained — see the
/// invariant in §4.2 ("after any quantity op, dim keys with exponent 0 are
/// removed").
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DimensionVector(BTreeMap<String, i32>);

impl DimensionVector {
    pub fn dimensionless() -> Self {
        DimensionVector(BTreeMap::new())
    }

    pub fn single(name: impl Into<String>, exp: i32) -> Self {
        let mut v = DimensionVector::dimensionless();
        v.set(name, exp);
        v
    }

    pub fn is_dimensionless(&self) -> bool {
        self.0.is_empty()
    }

    pub fn exponent(&self, name: &str) -> i32 {
        self.0.get(name).copied().unwrap_or(0)
    }

    /// The sole `(name, exponent)` component, if this vector has exactly
    /// one — `None` for dimensionless or compound (more than one
    /// component) vectors.
    pub fn as_single(&self) -> Option<(&str, i32)> {
        let mut iter = self.0.iter();
        let (name, exp) = iter.next()?;
        if iter.next().is_some() {
            return None;
        }
        Some((name.as_str(), *exp))
    }

    fn set(&mut self, name: impl Into<String>, exp: i32) {
        if exp == 0 {
            self.0.remove(&name.into());
        } else {
            self.0.insert(name.into(), exp);
        }
    }

    /// Component-wise sum, dropping zero-exponent entries.
    pub fn mul(&self, other: &DimensionVector) -> DimensionVector {
        let mut out = self.0.clone();
        for (k, v) in &other.0 {
            let entry = out.entry(k.clone()).or_insert(0);
            *entry += v;
        }
        out.retain(|_, v| *v != 0);
        DimensionVector(out)
    }

    /// Component-wise difference, dropping zero-exponent entries.
    pub fn div(&self, other: &DimensionVector) -> DimensionVector {
        let mut out = self.0.clone();
        for (k, v) in &other.0 {
            let entry = out.entry(k.clone()).or_insert(0);
            *entry -= v;
        }
        out.retain(|_, v| *v != 0);
        DimensionVector(out)
    }

    pub fn pow(&self, n: i32) -> DimensionVector {
        if n == 0 {
            return DimensionVector::dimensionless();
        }
        let mut out = BTreeMap::new();
        for (k, v) in &self.0 {
            out.insert(k.clone(), v * n);
        }
        DimensionVector(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_and_div_drop_zero_exponents() {
        let length = DimensionVector::single("length", 1);
        let inv_length = DimensionVector::single("length", -1);
        let combined = length.mul(&inv_length);
        assert!(combined.is_dimensionless());
    }

    #[test]
    fn div_subtracts_exponents() {
        let area = DimensionVector::single("length", 2);
        let length = DimensionVector::single("length", 1);
        assert_eq!(area.div(&length), length);
    }
}
