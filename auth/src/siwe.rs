//! EIP-4361 (Sign-In with Ethereum) messages and verification.
//!
//! Only EOA signatures are accepted: the signer is recovered from the
//! EIP-191 `personal_sign` digest and compared with the claimed address.

use std::fmt;

use chrono::{DateTime, Utc};
use microcred_crypto::recover_personal_signer;
use microcred_types::{Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

use crate::SiweError;

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";

/// The success payload returned by the MiniKit `walletAuth` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletAuthPayload {
    #[serde(default = "default_status")]
    pub status: String,
    pub message: String,
    pub signature: String,
    pub address: String,
    #[serde(default)]
    pub version: Option<u32>,
}

fn default_status() -> String {
    "success".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiweMessage {
    pub domain: String,
    pub address: WalletAddress,
    pub statement: Option<String>,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub not_before: Option<DateTime<Utc>>,
    pub request_id: Option<String>,
    pub resources: Vec<String>,
}

fn parse_time(field: &str, raw: &str) -> Result<DateTime<Utc>, SiweError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| SiweError::invalid(format!("bad {field}: {e}")))
}

impl SiweMessage {
    pub fn parse(text: &str) -> Result<Self, SiweError> {
        let mut lines = text.lines();

        let header = lines
            .next()
            .ok_or_else(|| SiweError::invalid("empty message"))?;
        let domain = header
            .strip_suffix(HEADER_SUFFIX)
            .ok_or_else(|| SiweError::invalid("missing SIWE header"))?;
        let domain = domain.split_once("://").map_or(domain, |(_, d)| d).to_string();

        let address_line = lines
            .next()
            .ok_or_else(|| SiweError::invalid("missing address"))?;
        let address = WalletAddress::parse(address_line.trim())
            .map_err(|e| SiweError::invalid(e.to_string()))?;

        let mut statement = None;
        let mut uri = None;
        let mut version = None;
        let mut chain_id = None;
        let mut nonce = None;
        let mut issued_at = None;
        let mut expiration_time = None;
        let mut not_before = None;
        let mut request_id = None;
        let mut resources = Vec::new();
        let mut in_resources = false;

        for line in lines {
            if in_resources {
                if let Some(r) = line.strip_prefix("- ") {
                    resources.push(r.to_string());
                    continue;
                }
                in_resources = false;
            }
            if line.is_empty() {
                continue;
            }
            if let Some(v) = line.strip_prefix("URI: ") {
                uri = Some(v.to_string());
            } else if let Some(v) = line.strip_prefix("Version: ") {
                version = Some(v.to_string());
            } else if let Some(v) = line.strip_prefix("Chain ID: ") {
                chain_id = Some(
                    v.parse::<u64>()
                        .map_err(|_| SiweError::invalid(format!("bad chain id: {v}")))?,
                );
            } else if let Some(v) = line.strip_prefix("Nonce: ") {
                nonce = Some(v.to_string());
            } else if let Some(v) = line.strip_prefix("Issued At: ") {
                issued_at = Some(parse_time("issued at", v)?);
            } else if let Some(v) = line.strip_prefix("Expiration Time: ") {
                expiration_time = Some(parse_time("expiration time", v)?);
            } else if let Some(v) = line.strip_prefix("Not Before: ") {
                not_before = Some(parse_time("not before", v)?);
            } else if let Some(v) = line.strip_prefix("Request ID: ") {
                request_id = Some(v.to_string());
            } else if line == "Resources:" {
                in_resources = true;
            } else if uri.is_none() && statement.is_none() {
                statement = Some(line.to_string());
            } else {
                return Err(SiweError::invalid(format!("unexpected line: {line}")));
            }
        }

        Ok(Self {
            domain,
            address,
            statement,
            uri: uri.ok_or_else(|| SiweError::invalid("missing URI"))?,
            version: version.ok_or_else(|| SiweError::invalid("missing version"))?,
            chain_id: chain_id.ok_or_else(|| SiweError::invalid("missing chain id"))?,
            nonce: nonce.ok_or_else(|| SiweError::invalid("missing nonce"))?,
            issued_at: issued_at.ok_or_else(|| SiweError::invalid("missing issued at"))?,
            expiration_time,
            not_before,
            request_id,
            resources,
        })
    }

    /// Whether the validity window contains `now`.
    pub fn check_time(&self, now: Timestamp) -> Result<(), SiweError> {
        let now = now.as_secs() as i64;
        if let Some(exp) = self.expiration_time {
            if now >= exp.timestamp() {
                return Err(SiweError::invalid("message expired"));
            }
        }
        if let Some(nbf) = self.not_before {
            if now < nbf.timestamp() {
                return Err(SiweError::invalid("message not yet valid"));
            }
        }
        Ok(())
    }
}

impl fmt::Display for SiweMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}{}", self.domain, HEADER_SUFFIX)?;
        writeln!(f, "{}", self.address)?;
        writeln!(f)?;
        if let Some(statement) = &self.statement {
            writeln!(f, "{statement}")?;
        }
        writeln!(f)?;
        writeln!(f, "URI: {}", self.uri)?;
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "Chain ID: {}", self.chain_id)?;
        writeln!(f, "Nonce: {}", self.nonce)?;
        write!(f, "Issued At: {}", self.issued_at.to_rfc3339())?;
        if let Some(exp) = self.expiration_time {
            write!(f, "\nExpiration Time: {}", exp.to_rfc3339())?;
        }
        if let Some(nbf) = self.not_before {
            write!(f, "\nNot Before: {}", nbf.to_rfc3339())?;
        }
        if let Some(id) = &self.request_id {
            write!(f, "\nRequest ID: {id}")?;
        }
        if !self.resources.is_empty() {
            f.write_str("\nResources:")?;
            for r in &self.resources {
                write!(f, "\n- {r}")?;
            }
        }
        Ok(())
    }
}

/// Verify a wallet-auth payload against the nonce issued for this attempt.
///
/// Returns the recovered address, which equals both the payload address and
/// the address inside the message.
pub fn verify(
    payload: &WalletAuthPayload,
    expected_nonce: &str,
    now: Timestamp,
) -> Result<WalletAddress, SiweError> {
    if payload.status != "success" {
        return Err(SiweError::invalid(format!(
            "wallet auth status {}",
            payload.status
        )));
    }
    let message = SiweMessage::parse(&payload.message)?;
    if message.nonce != expected_nonce {
        return Err(SiweError::invalid("nonce does not match"));
    }
    let claimed = WalletAddress::parse(&payload.address)
        .map_err(|e| SiweError::invalid(e.to_string()))?;
    if message.address != claimed {
        return Err(SiweError::invalid("message address does not match payload"));
    }
    message.check_time(now)?;

    let raw = payload.signature.trim_start_matches("0x");
    let signature = hex::decode(raw).map_err(|e| SiweError::invalid(format!("signature: {e}")))?;
    let signer = recover_personal_signer(payload.message.as_bytes(), &signature)
        .map_err(|e| SiweError::invalid(e.to_string()))?;
    if signer != claimed {
        tracing::debug!(%signer, %claimed, "SIWE signer mismatch");
        return Err(SiweError::invalid("signature does not match address"));
    }
    Ok(claimed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;
    use microcred_crypto::{address_of, sign_personal_message};

    fn wallet() -> SigningKey {
        SigningKey::from_slice(&[0x11; 32]).unwrap()
    }

    fn message(address: WalletAddress, nonce: &str) -> SiweMessage {
        SiweMessage {
            domain: "microcred.app".into(),
            address,
            statement: Some("Sign in to Microcred".into()),
            uri: "https://microcred.app".into(),
            version: "1".into(),
            chain_id: 480,
            nonce: nonce.into(),
            issued_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            expiration_time: Some(DateTime::from_timestamp(1_700_003_600, 0).unwrap()),
            not_before: None,
            request_id: None,
            resources: vec![],
        }
    }

    fn signed(key: &SigningKey, msg: &SiweMessage) -> WalletAuthPayload {
        let text = msg.to_string();
        let sig = sign_personal_message(key, text.as_bytes()).unwrap();
        WalletAuthPayload {
            status: "success".into(),
            message: text,
            signature: format!("0x{}", hex::encode(sig)),
            address: msg.address.to_string(),
            version: Some(1),
        }
    }

    const NOW: u64 = 1_700_000_100;

    #[test]
    fn rendered_message_parses_back() {
        let mut msg = message(WalletAddress::new([7; 20]), "abcd1234abcd1234");
        msg.resources = vec!["https://a.example".into(), "ipfs://b".into()];
        msg.request_id = Some("req-1".into());
        assert_eq!(SiweMessage::parse(&msg.to_string()).unwrap(), msg);
    }

    #[test]
    fn parses_message_without_statement() {
        let text = "example.com wants you to sign in with your Ethereum account:\n\
                    0x7e5f4552091a69125d5dfcb7b8c2659029395bdf\n\n\n\
                    URI: https://example.com\nVersion: 1\nChain ID: 1\n\
                    Nonce: 32891756\nIssued At: 2021-09-30T16:25:24Z";
        let msg = SiweMessage::parse(text).unwrap();
        assert_eq!(msg.statement, None);
        assert_eq!(msg.nonce, "32891756");
        assert_eq!(msg.chain_id, 1);
    }

    #[test]
    fn valid_signature_verifies() {
        let key = wallet();
        let address = address_of(key.verifying_key());
        let payload = signed(&key, &message(address, "n0nce"));
        assert_eq!(verify(&payload, "n0nce", Timestamp::new(NOW)).unwrap(), address);
    }

    #[test]
    fn nonce_mismatch_fails_even_with_valid_signature() {
        let key = wallet();
        let payload = signed(&key, &message(address_of(key.verifying_key()), "n0nce"));
        let err = verify(&payload, "other", Timestamp::new(NOW)).unwrap_err();
        assert!(err.to_string().contains("nonce"));
    }

    #[test]
    fn signature_from_other_wallet_fails() {
        let key = wallet();
        let other = SigningKey::from_slice(&[0x22; 32]).unwrap();
        let msg = message(address_of(key.verifying_key()), "n0nce");
        let mut payload = signed(&key, &msg);
        let forged = sign_personal_message(&other, payload.message.as_bytes()).unwrap();
        payload.signature = hex::encode(forged);
        assert!(verify(&payload, "n0nce", Timestamp::new(NOW)).is_err());
    }

    #[test]
    fn payload_address_must_match_message() {
        let key = wallet();
        let mut payload = signed(&key, &message(address_of(key.verifying_key()), "n0nce"));
        payload.address = WalletAddress::new([9; 20]).to_string();
        assert!(verify(&payload, "n0nce", Timestamp::new(NOW)).is_err());
    }

    #[test]
    fn expired_and_premature_messages_fail() {
        let key = wallet();
        let address = address_of(key.verifying_key());
        let payload = signed(&key, &message(address, "n"));
        assert!(verify(&payload, "n", Timestamp::new(1_700_003_600)).is_err());

        let mut early = message(address, "n");
        early.not_before = Some(DateTime::from_timestamp(1_700_000_500, 0).unwrap());
        let payload = signed(&key, &early);
        assert!(verify(&payload, "n", Timestamp::new(NOW)).is_err());
        assert!(verify(&payload, "n", Timestamp::new(1_700_000_500)).is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(SiweMessage::parse("hello").is_err());
        assert!(SiweMessage::parse("").is_err());
    }
}
