//! Error type for query parsing and execution (§4.9).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("malformed query: {0}")]
    Schema(String),

    #[error(transparent)]
    Expr(#[from] ldc_expr::Error),
}
