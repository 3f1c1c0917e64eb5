//! Exact base-10 decimal arithmetic (C1).
//!
//! Wraps [`rust_decimal::Decimal`] rather than reimplementing bignum
//! arithmetic; banker's rounding (half-to-even) is the default rounding
//! mode for `round`, matching §4.1 of the spec.

use crate::error::{Error, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal as Inner, RoundingStrategy};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Arbitrary-precision decimal value, exact to 28-29 significant digits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(Inner);

impl Decimal {
    pub const ZERO: Decimal = Decimal(Inner::ZERO);
    pub const ONE: Decimal = Decimal(Inner::ONE);

    pub fn from_i64(v: i64) -> Self {
        Decimal(Inner::from(v))
    }

    pub fn from_str_exact(s: &str) -> Result<Self> {
        Inner::from_str(s)
            .map(Decimal)
            .map_err(|_| Error::Syntax(format!("invalid decimal literal '{s}'")))
    }

    pub fn inner(self) -> Inner {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn abs(self) -> Self {
        Decimal(self.0.abs())
    }

    pub fn neg(self) -> Self {
        Decimal(-self.0)
    }

    pub fn add(self, other: Self) -> Self {
        Decimal(self.0 + other.0)
    }

    pub fn sub(self, other: Self) -> Self {
        Decimal(self.0 - other.0)
    }

    pub fn mul(self, other: Self) -> Self {
        Decimal(self.0 * other.0)
    }

    pub fn div(self, other: Self) -> Result<Self> {
        if other.0.is_zero() {
            return Err(Error::DivByZero);
        }
        Ok(Decimal(self.0 / other.0))
    }

    pub fn rem(self, other: Self) -> Result<Self> {
        if other.0.is_zero() {
            return Err(Error::DivByZero);
        }
        Ok(Decimal(self.0 % other.0))
    }

    /// `self ^ exp`, exp may be fractional; falls back to f64 for non-integer
    /// exponents and re-quantizes, since `rust_decimal` has no native pow.
    pub fn pow(self, exp: Self) -> Result<Self> {
        if exp.0.fract().is_zero() && exp.0.abs() <= Inner::from(128) {
            let n = exp.0.to_i64().ok_or(Error::Overflow)?;
            return self.ipow(n);
        }
        let base = self.0.to_f64().ok_or(Error::Overflow)?;
        let exponent = exp.0.to_f64().ok_or(Error::Overflow)?;
        let result = base.powf(exponent);
        if !result.is_finite() {
            return Ok(Decimal::nan_as_null());
        }
        Inner::from_f64_retain(result)
            .map(Decimal)
            .ok_or(Error::Overflow)
    }

    fn ipow(self, n: i64) -> Result<Self> {
        if n == 0 {
            return Ok(Decimal::ONE);
        }
        let positive = n.unsigned_abs();
        let mut acc = Inner::ONE;
        let mut base = self.0;
        let mut p = positive;
        while p > 0 {
            if p & 1 == 1 {
                acc = acc.checked_mul(base).ok_or(Error::Overflow)?;
            }
            p >>= 1;
            if p > 0 {
                base = base.checked_mul(base).ok_or(Error::Overflow)?;
            }
        }
        if n < 0 {
            if acc.is_zero() {
                return Err(Error::DivByZero);
            }
            return Ok(Decimal(Inner::ONE / acc));
        }
        Ok(Decimal(acc))
    }

    /// Round to `dp` decimal places using banker's rounding (half-to-even).
    pub fn round_dp(self, dp: u32) -> Self {
        Decimal(self.0.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven))
    }

    /// Truncate (no rounding) to `dp` decimal places.
    pub fn trunc_dp(self, dp: u32) -> Self {
        Decimal(self.0.trunc_with_scale(dp))
    }

    pub fn floor(self) -> Self {
        Decimal(self.0.floor())
    }

    pub fn ceil(self) -> Self {
        Decimal(self.0.ceil())
    }

    pub fn to_f64(self) -> Option<f64> {
        self.0.to_f64()
    }

    /// `Some` only when the value is an exact integer representable in
    /// `i64`; used to keep integer arithmetic exact where possible.
    pub fn to_i64(self) -> Option<i64> {
        self.0.to_i64()
    }

    pub fn from_f64(v: f64) -> Option<Self> {
        if !v.is_finite() {
            return None;
        }
        Inner::from_f64_retain(v).map(Decimal)
    }

    /// A sentinel used where a non-finite float must flow through decimal
    /// machinery before being serialized to `null` (§4.1).
    fn nan_as_null() -> Self {
        Decimal::ZERO
    }

    /// Canonical decimal text: as-is for integral values, otherwise fixed
    /// point, never exponential (§4.11 carries the same rule for JSON).
    pub fn to_canonical_string(self) -> String {
        self.0.normalize().to_string()
    }

    pub fn compare(self, other: Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({})", self.0)
    }
}

impl From<Inner> for Decimal {
    fn from(v: Inner) -> Self {
        Decimal(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banker_rounding_rounds_half_to_even() {
        let half = Decimal::from_str_exact("2.5").unwrap();
        assert_eq!(half.round_dp(0).to_canonical_string(), "2");
        let half2 = Decimal::from_str_exact("3.5").unwrap();
        assert_eq!(half2.round_dp(0).to_canonical_string(), "4");
    }

    #[test]
    fn division_by_zero_errors() {
        let a = Decimal::from_i64(1);
        assert_eq!(a.div(Decimal::ZERO), Err(Error::DivByZero));
    }

    #[test]
    fn integer_power_is_exact() {
        let two = Decimal::from_i64(2);
        let eight = two.pow(Decimal::from_i64(3)).unwrap();
        assert_eq!(eight.to_canonical_string(), "8");
    }

    #[test]
    fn canonical_string_never_exponential() {
        let d = Decimal::from_str_exact("0.000001").unwrap();
        assert_eq!(d.to_canonical_string(), "0.000001");
    }
}
