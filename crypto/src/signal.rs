//! World ID signal hashing.
//!
//! The verification service expects `signal_hash = keccak256(signal) >> 8`,
//! i.e. the hash shifted right by one byte so it fits the BN254 scalar
//! field, rendered as `0x` plus 64 hex digits.

use crate::hash::keccak256;

/// Hash of the empty signal.
pub const EMPTY_SIGNAL_HASH: &str =
    "0x00c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a4";

/// Hash raw bytes into a field element.
pub fn hash_to_field(bytes: &[u8]) -> [u8; 32] {
    let hash = keccak256(bytes);
    let mut out = [0u8; 32];
    out[1..].copy_from_slice(&hash[..31]);
    out
}

/// Hash a client-supplied signal.
///
/// A `0x`-prefixed hex string is hashed as the bytes it encodes (this is
/// how wallet addresses are passed as signals); anything else is hashed as
/// UTF-8.
pub fn hash_signal(signal: &str) -> String {
    let decoded = signal
        .strip_prefix("0x")
        .filter(|digits| digits.len() % 2 == 0)
        .and_then(|digits| hex::decode(digits).ok());
    let field = match decoded {
        Some(bytes) => hash_to_field(&bytes),
        None => hash_to_field(signal.as_bytes()),
    };
    format!("0x{}", hex::encode(field))
}
