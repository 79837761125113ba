//! secp256k1 signer recovery for wallet `personal_sign` signatures.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use microcred_types::WalletAddress;

use crate::hash::{keccak256, personal_message_hash};
use crate::CryptoError;

/// Derive the wallet address of a public key: the last 20 bytes of
/// `keccak256(x || y)` over the uncompressed point.
pub fn address_of(key: &VerifyingKey) -> WalletAddress {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    WalletAddress::new(bytes)
}

/// Recover the address that produced a 65-byte `r || s || v` signature over
/// `message` with `personal_sign`.
///
/// `v` may be given as 0/1 or 27/28. High-s signatures are normalised before
/// recovery.
pub fn recover_personal_signer(
    message: &[u8],
    signature: &[u8],
) -> Result<WalletAddress, CryptoError> {
    if signature.len() != 65 {
        return Err(CryptoError::SignatureEncoding(format!(
            "expected 65 bytes, got {}",
            signature.len()
        )));
    }
    let sig = Signature::from_slice(&signature[..64])
        .map_err(|e| CryptoError::SignatureEncoding(e.to_string()))?;
    let v = match signature[64] {
        v @ (0 | 1) => v,
        v @ (27 | 28) => v - 27,
        other => return Err(CryptoError::RecoveryId(other)),
    };
    let (sig, v) = match sig.normalize_s() {
        Some(normalized) => (normalized, v ^ 1),
        None => (sig, v),
    };
    let recovery_id = RecoveryId::from_byte(v).ok_or(CryptoError::RecoveryId(v))?;

    let digest = personal_message_hash(message);
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;
    Ok(address_of(&key))
}

/// Produce a `personal_sign` signature (`r || s || v`, v = 27/28).
///
/// The server only ever recovers; this exists for test wallets.
pub fn sign_personal_message(key: &SigningKey, message: &[u8]) -> Result<[u8; 65], CryptoError> {
    let digest = personal_message_hash(message);
    let (sig, recovery_id) = key
        .sign_prehash_recoverable(&digest)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&sig.to_bytes());
    out[64] = recovery_id.to_byte() + 27;
    Ok(out)
}
