use microcred_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LendingError {
    #[error("user not found; complete general access verification first")]
    AccessActionRequired,

    #[error("{0}")]
    Validation(String),

    #[error("initiated deposit not found or already processed")]
    DepositNotFound,

    #[error("transaction reference mismatch")]
    ReferenceMismatch { expected: String, found: Option<String> },

    #[error("on-chain payment failed (status: {0})")]
    TransactionFailed(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LendingError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
