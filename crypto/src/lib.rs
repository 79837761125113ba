//! Cryptographic primitives for microcred.
//!
//! - **Keccak-256** and the EIP-191 personal-sign digest
//! - **secp256k1** signer recovery for wallet signatures
//! - **World ID signal hashing** (`keccak256(signal) >> 8`)
//! - **HMAC-SHA256** for session tokens
//! - A [`RandomSource`] abstraction for nonces and reference ids

pub mod error;
pub mod hash;
pub mod mac;
pub mod random;
pub mod recover;
pub mod signal;

pub use error::CryptoError;
pub use hash::{keccak256, personal_message_hash};
pub use mac::{hmac_sha256, hmac_sha256_verify};
pub use random::{random_hex, OsRandom, RandomSource};
pub use recover::{address_of, recover_personal_signer, sign_personal_message};
pub use signal::{hash_signal, EMPTY_SIGNAL_HASH};
