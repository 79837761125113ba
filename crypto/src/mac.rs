//! HMAC-SHA256 for signed session tokens.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Compute `HMAC-SHA256(key, data)`.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; 32], CryptoError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    mac.update(data);
    let result = mac.finalize().into_bytes();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    Ok(output)
}

/// Verify a tag in constant time.
pub fn hmac_sha256_verify(key: &[u8], data: &[u8], tag: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(data);
    mac.verify_slice(tag).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc4231_case_2() {
        let tag = hmac_sha256(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            hex::encode(tag),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn verify_accepts_own_tag_only() {
        let tag = hmac_sha256(b"key", b"payload").unwrap();
        assert!(hmac_sha256_verify(b"key", b"payload", &tag));
        assert!(!hmac_sha256_verify(b"key", b"payload2", &tag));
        assert!(!hmac_sha256_verify(b"other", b"payload", &tag));
        assert!(!hmac_sha256_verify(b"key", b"payload", &tag[..31]));
    }
}
