use thiserror::Error;
use trellis_keys::{KeyError, KeyKind};

#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("Malformed token: {0}")]
    Decode(String),

    #[error("Unsupported token header: {0}")]
    UnsupportedHeader(String),

    #[error("Token signature does not match issuer {issuer}")]
    InvalidSignature { issuer: String },

    #[error("Claim type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: KeyKind, found: KeyKind },

    #[error("Invalid time window: expiry {expiry} is not after start {start}")]
    InvalidTimeWindow { start: i64, expiry: i64 },

    #[error("Invalid date {input:?}: {reason}")]
    InvalidDate { input: String, reason: String },

    #[error("Couldn't parse number: {0}")]
    InvalidNumber(String),

    #[error("Trust chain violation: {0}")]
    ChainViolation(String),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClaimError>;
