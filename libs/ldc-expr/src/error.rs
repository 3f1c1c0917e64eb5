//! Error types for lexing, parsing and interpreting expressions.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("lex error at {line}:{column}: {message}")]
    Lex {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("type error: {0}")]
    Type(String),

    #[error("undefined identifier: {0}")]
    Undefined(String),

    #[error("not callable: {0}")]
    NotCallable(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("wrong arity for {name}: expected {expected}, got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("division by zero")]
    DivByZero,

    #[error("units: {0}")]
    Units(#[from] ldc_units::Error),

    #[error("{0}")]
    Other(String),
}
