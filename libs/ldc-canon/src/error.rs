use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignError {
    #[error("malformed signature header")]
    Malformed,
    #[error("unsupported signature version or algorithm")]
    Unsupported,
    #[error("signature does not match")]
    Mismatch,
    #[error("signature is outside the allowed skew window")]
    Expired,
}

pub type Result<T> = std::result::Result<T, SignError>;
