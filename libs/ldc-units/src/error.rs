//! Error types for decimal arithmetic and unit/quantity operations.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("division by zero")]
    DivByZero,

    #[error("numeric overflow")]
    Overflow,

    #[error("unknown unit symbol '{0}'")]
    UnknownUnit(String),

    #[error("invalid compound unit syntax: {0}")]
    Syntax(String),

    #[error("incompatible dimensions: '{from}' vs '{to}'")]
    DimensionMismatch { from: String, to: String },

    #[error("no conversion registered from '{from}' to '{to}'")]
    NoConversion { from: String, to: String },
}
