use microcred_crypto::{hash_signal, EMPTY_SIGNAL_HASH};
use microcred_types::{NullifierHash, VerificationLevel};
use serde::{Deserialize, Serialize};

use crate::WorldIdError;

/// A proof as produced by the MiniKit `verify` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofPayload {
    pub merkle_root: String,
    pub nullifier_hash: String,
    pub proof: String,
    pub verification_level: VerificationLevel,
}

impl ProofPayload {
    pub fn validate(&self) -> Result<(), WorldIdError> {
        if self.merkle_root.trim().is_empty() {
            return Err(WorldIdError::MissingField("merkle_root"));
        }
        if self.nullifier_hash.trim().is_empty() {
            return Err(WorldIdError::MissingField("nullifier_hash"));
        }
        if self.proof.trim().is_empty() {
            return Err(WorldIdError::MissingField("proof"));
        }
        Ok(())
    }
}

/// Body of `POST /api/v2/verify/{app_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationRequest {
    pub merkle_root: String,
    pub nullifier_hash: String,
    pub proof: String,
    pub verification_level: VerificationLevel,
    pub action: String,
    pub signal_hash: String,
}

impl VerificationRequest {
    pub fn new(proof: &ProofPayload, action: &str, signal: Option<&str>) -> Self {
        Self {
            merkle_root: proof.merkle_root.clone(),
            nullifier_hash: proof.nullifier_hash.clone(),
            proof: proof.proof.clone(),
            verification_level: proof.verification_level,
            action: action.to_string(),
            signal_hash: signal_hash(signal),
        }
    }
}

/// Field-encoded hash of the signal bound into the proof.
///
/// An absent or blank signal maps to the well-known empty-signal hash.
/// Anything else is hashed exactly as the wallet sent it.
pub fn signal_hash(signal: Option<&str>) -> String {
    match signal {
        Some(s) if !s.trim().is_empty() => hash_signal(s),
        _ => EMPTY_SIGNAL_HASH.to_string(),
    }
}

/// A proof the portal accepted.
#[derive(Debug, Clone)]
pub struct VerifiedProof {
    pub nullifier_hash: NullifierHash,
    pub verification_level: VerificationLevel,
    pub action: String,
    /// The portal's full JSON answer.
    pub response: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ProofPayload {
        ProofPayload {
            merkle_root: "0x1".into(),
            nullifier_hash: "0x2".into(),
            proof: "0x3".into(),
            verification_level: VerificationLevel::Orb,
        }
    }

    #[test]
    fn deserializes_snake_case() {
        let p: ProofPayload = serde_json::from_str(
            r#"{"merkle_root":"0x1","nullifier_hash":"0x2","proof":"0x3","verification_level":"orb"}"#,
        )
        .unwrap();
        assert_eq!(p, payload());
    }

    #[test]
    fn unknown_level_is_rejected() {
        let res: Result<ProofPayload, _> = serde_json::from_str(
            r#"{"merkle_root":"0x1","nullifier_hash":"0x2","proof":"0x3","verification_level":"phone"}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn empty_field_fails_validation() {
        let mut p = payload();
        p.proof = " ".into();
        assert!(matches!(p.validate(), Err(WorldIdError::MissingField("proof"))));
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn blank_signal_uses_empty_hash() {
        assert_eq!(signal_hash(None), EMPTY_SIGNAL_HASH);
        assert_eq!(signal_hash(Some("  ")), EMPTY_SIGNAL_HASH);
        assert_ne!(signal_hash(Some("user-42")), EMPTY_SIGNAL_HASH);
    }

    #[test]
    fn padded_signal_is_hashed_verbatim() {
        assert_eq!(signal_hash(Some(" user-42 ")), hash_signal(" user-42 "));
        assert_ne!(signal_hash(Some(" user-42 ")), hash_signal("user-42"));
    }

    #[test]
    fn request_carries_action_and_hash() {
        let req = VerificationRequest::new(&payload(), "access", Some("0xabcd"));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["action"], "access");
        assert_eq!(json["verification_level"], "orb");
        assert_eq!(json["signal_hash"], hash_signal("0xabcd"));
    }
}
