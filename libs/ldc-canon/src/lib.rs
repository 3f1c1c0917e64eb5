//! Canonicalizer and signer (C11, §4.11): deterministic JSON serialization
//! of the evaluator's signable payload, plus HMAC-SHA256 signing and
//! verification of it.

#![forbid(unsafe_code)]

mod canon;
mod error;
mod signer;

pub use canon::canonicalize;
pub use error::{Result, SignError};
pub use signer::{check_skew, sign, verify, SKEW_WINDOW_MS};
