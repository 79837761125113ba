//! Top-level error type shared across crates.

use thiserror::Error;

/// Errors raised while parsing the fundamental types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("invalid nullifier hash: {0}")]
    InvalidNullifier(String),

    #[error("unknown verification level: {0}")]
    UnknownVerificationLevel(String),
}
