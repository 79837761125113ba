use microcred_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NonceError {
    #[error("nonce not found or expired")]
    ExpiredOrMissing,

    #[error("invalid nonce")]
    Mismatch,

    #[error("nonce storage: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SiweError {
    #[error("SIWE message verification failed: {0}")]
    SignatureInvalid(String),
}

impl SiweError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::SignatureInvalid(reason.into())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("malformed session token")]
    Malformed,

    #[error("session signature mismatch")]
    BadSignature,

    #[error("session expired")]
    Expired,

    #[error("session secret must be at least {min} bytes, got {got}")]
    WeakSecret { min: usize, got: usize },

    #[error("session encoding: {0}")]
    Encoding(String),
}
