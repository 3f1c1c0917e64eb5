#![forbid(unsafe_code)]
//! Decimal arithmetic and compound-unit quantities (C1, C2).

mod decimal;
mod dimension;
mod error;
mod quantity;
mod unit;

pub use decimal::Decimal;
pub use dimension::DimensionVector;
pub use error::{Error, Result};
pub use quantity::Quantity;
pub use unit::{AtomicUnitDef, Unit, UnitRegistry};
