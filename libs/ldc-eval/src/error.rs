//! Construction-time misuse only (§3.1, §7). Document-local failures never
//! reach this type — they become diagnostics on [`crate::EvalOutcome`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("capability \"{0}\" is blank")]
    BlankCapability(String),
}

pub type Result<T> = std::result::Result<T, EvalError>;
