use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid signature encoding: {0}")]
    SignatureEncoding(String),

    #[error("invalid recovery id: {0}")]
    RecoveryId(u8),

    #[error("public key recovery failed")]
    RecoveryFailed,

    #[error("invalid key: {0}")]
    InvalidKey(String),
}
