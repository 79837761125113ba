//! Keccak-256 hashing and the EIP-191 personal-sign digest.

use sha3::{Digest, Keccak256};

/// Prefix defined by EIP-191 for `personal_sign` messages.
const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// Compute a 256-bit Keccak hash of arbitrary data.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Digest a wallet signs for `personal_sign`:
/// `keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)`.
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX);
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_empty_matches_known_vector() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn personal_hash_includes_length_prefix() {
        let manual = keccak256(b"\x19Ethereum Signed Message:\n5hello");
        assert_eq!(personal_message_hash(b"hello"), manual);
    }

    #[test]
    fn personal_hash_differs_from_plain_hash() {
        assert_ne!(personal_message_hash(b"hello"), keccak256(b"hello"));
    }
}
