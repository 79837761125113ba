//! Signed session tokens.
//!
//! Token format: `base64url(json claims) "." base64url(hmac_sha256(secret, first part))`.
//! The MAC covers the encoded claims exactly as sent.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use microcred_crypto::{hmac_sha256, hmac_sha256_verify, RandomSource};
use microcred_types::{Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::cookie::{SetCookie, SESSION_COOKIE};
use crate::SessionError;

/// Seven days.
pub const SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub address: WalletAddress,
    pub username: String,
    pub iat: u64,
    pub exp: u64,
}

pub struct SessionIssuer {
    secret: Zeroizing<Vec<u8>>,
    secure_cookies: bool,
}

impl SessionIssuer {
    pub fn new(secret: Vec<u8>, secure_cookies: bool) -> Result<Self, SessionError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(SessionError::WeakSecret {
                min: MIN_SECRET_LEN,
                got: secret.len(),
            });
        }
        Ok(Self {
            secret: Zeroizing::new(secret),
            secure_cookies,
        })
    }

    /// A random secret that lives only as long as this process.
    pub fn ephemeral(random: &dyn RandomSource, secure_cookies: bool) -> Self {
        let mut secret = vec![0u8; MIN_SECRET_LEN];
        random.fill(&mut secret);
        Self {
            secret: Zeroizing::new(secret),
            secure_cookies,
        }
    }

    /// Sign claims for `address` and build the `user_info` cookie.
    ///
    /// The display name falls back to the address.
    pub fn issue(
        &self,
        address: WalletAddress,
        username: Option<&str>,
        now: Timestamp,
    ) -> Result<(SessionClaims, SetCookie), SessionError> {
        let username = match username.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => address.to_string(),
        };
        let claims = SessionClaims {
            address,
            username,
            iat: now.as_secs(),
            exp: now.plus_secs(SESSION_TTL_SECS).as_secs(),
        };
        let token = self.encode(&claims)?;
        let cookie = SetCookie::new(SESSION_COOKIE, token, self.secure_cookies)
            .with_max_age(SESSION_TTL_SECS);
        Ok((claims, cookie))
    }

    pub fn encode(&self, claims: &SessionClaims) -> Result<String, SessionError> {
        let json = serde_json::to_vec(claims).map_err(|e| SessionError::Encoding(e.to_string()))?;
        let body = URL_SAFE_NO_PAD.encode(json);
        let tag = hmac_sha256(&self.secret, body.as_bytes())
            .map_err(|e| SessionError::Encoding(e.to_string()))?;
        Ok(format!("{body}.{}", URL_SAFE_NO_PAD.encode(tag)))
    }

    /// Check the MAC, then decode the claims and reject expired ones.
    pub fn validate(&self, token: &str, now: Timestamp) -> Result<SessionClaims, SessionError> {
        let (body, tag) = token.split_once('.').ok_or(SessionError::Malformed)?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| SessionError::Malformed)?;
        if !hmac_sha256_verify(&self.secret, body.as_bytes(), &tag) {
            return Err(SessionError::BadSignature);
        }
        let json = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| SessionError::Malformed)?;
        let claims: SessionClaims =
            serde_json::from_slice(&json).map_err(|_| SessionError::Malformed)?;
        if now.as_secs() >= claims.exp {
            return Err(SessionError::Expired);
        }
        Ok(claims)
    }

    /// The cookie that logs the client out.
    pub fn revoke(&self) -> SetCookie {
        SetCookie::removal(SESSION_COOKIE, self.secure_cookies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use microcred_nullables::NullRandom;

    fn issuer() -> SessionIssuer {
        SessionIssuer::new(vec![0x42; 32], true).unwrap()
    }

    fn addr() -> WalletAddress {
        WalletAddress::new([0xaa; 20])
    }

    #[test]
    fn issue_then_validate() {
        let iss = issuer();
        let (claims, cookie) = iss.issue(addr(), Some("ana"), Timestamp::new(100)).unwrap();
        assert_eq!(claims.exp, 100 + SESSION_TTL_SECS);
        assert_eq!(cookie.max_age, Some(604_800));
        assert!(cookie.secure);
        let back = iss.validate(&cookie.value, Timestamp::new(200)).unwrap();
        assert_eq!(back, claims);
    }

    #[test]
    fn username_defaults_to_address() {
        let (claims, _) = issuer().issue(addr(), Some("  "), Timestamp::new(0)).unwrap();
        assert_eq!(claims.username, addr().to_string());
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let iss = issuer();
        let (_, cookie) = iss.issue(addr(), None, Timestamp::new(0)).unwrap();
        let (_, tag) = cookie.value.split_once('.').unwrap();
        let forged_claims = SessionClaims {
            address: WalletAddress::new([0xbb; 20]),
            username: "mallory".into(),
            iat: 0,
            exp: u64::MAX,
        };
        let forged_body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{forged_body}.{tag}");
        assert_eq!(
            iss.validate(&forged, Timestamp::new(1)),
            Err(SessionError::BadSignature)
        );
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let other = SessionIssuer::new(vec![0x43; 32], true).unwrap();
        let (_, cookie) = other.issue(addr(), None, Timestamp::new(0)).unwrap();
        assert_eq!(
            issuer().validate(&cookie.value, Timestamp::new(1)),
            Err(SessionError::BadSignature)
        );
    }

    #[test]
    fn expiry_and_malformed_tokens() {
        let iss = issuer();
        let (_, cookie) = iss.issue(addr(), None, Timestamp::new(0)).unwrap();
        assert_eq!(
            iss.validate(&cookie.value, Timestamp::new(SESSION_TTL_SECS)),
            Err(SessionError::Expired)
        );
        assert_eq!(iss.validate("no-dot", Timestamp::new(0)), Err(SessionError::Malformed));
        assert_eq!(iss.validate("a.!!!", Timestamp::new(0)), Err(SessionError::Malformed));
    }

    #[test]
    fn weak_secret_refused() {
        assert!(matches!(
            SessionIssuer::new(vec![1; 8], false),
            Err(SessionError::WeakSecret { min: 32, got: 8 })
        ));
        let iss = SessionIssuer::ephemeral(&NullRandom::starting_at(3), false);
        let (_, cookie) = iss.issue(addr(), None, Timestamp::new(0)).unwrap();
        assert!(iss.validate(&cookie.value, Timestamp::new(1)).is_ok());
        assert!(iss.revoke().header_value().contains("Max-Age=0"));
    }
}
