//! HTTP client for the World ID developer portal.

use std::time::Duration;

use microcred_types::NullifierHash;
use serde_json::Value;

use crate::error::TRANSPORT_FAILURE_STATUS;
use crate::proof::{ProofPayload, VerificationRequest, VerifiedProof};
use crate::transaction::MiniKitTransaction;
use crate::WorldIdError;

pub const DEFAULT_BASE_URL: &str = "https://developer.worldcoin.org";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upstream bodies are truncated to this many characters in errors.
const BODY_EXCERPT_CHARS: usize = 1000;

#[derive(Debug, Clone)]
pub struct WorldIdConfig {
    pub base_url: String,
    pub app_id: String,
    /// Developer portal API key, needed only for transaction lookups.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl WorldIdConfig {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            app_id: app_id.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Shares one connection pool across requests.
pub struct WorldIdClient {
    http: reqwest::Client,
    config: WorldIdConfig,
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

fn transport_error(e: reqwest::Error) -> WorldIdError {
    let body = if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    };
    WorldIdError::ServiceError {
        status: TRANSPORT_FAILURE_STATUS,
        body,
    }
}

impl WorldIdClient {
    pub fn new(config: WorldIdConfig) -> Result<Self, WorldIdError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| WorldIdError::HttpClient(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn app_id(&self) -> &str {
        &self.config.app_id
    }

    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Verify `proof` for `action`, binding `signal` (blank means none).
    pub async fn verify_proof(
        &self,
        proof: &ProofPayload,
        action: &str,
        signal: Option<&str>,
    ) -> Result<VerifiedProof, WorldIdError> {
        proof.validate()?;
        let request = VerificationRequest::new(proof, action, signal);
        let url = self.url(&format!("/api/v2/verify/{}", self.config.app_id));
        tracing::debug!(%url, action, level = %proof.verification_level, "verifying World ID proof");

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "World ID verify returned an error status");
            return Err(WorldIdError::ServiceError {
                status: status.as_u16(),
                body: excerpt(&text),
            });
        }

        let json: Value =
            serde_json::from_str(&text).map_err(|_| WorldIdError::Malformed(excerpt(&text)))?;

        if !json.get("success").and_then(Value::as_bool).unwrap_or(false) {
            let field = |name: &str| json.get(name).and_then(Value::as_str).map(str::to_string);
            return Err(WorldIdError::Rejected {
                code: field("code"),
                detail: field("detail"),
                attribute: field("attribute"),
            });
        }

        let raw_nullifier = match json.get("nullifier_hash").and_then(Value::as_str) {
            Some(n) if !n.is_empty() => n,
            _ => return Err(WorldIdError::Incomplete),
        };
        let nullifier_hash = NullifierHash::parse(raw_nullifier)
            .map_err(|e| WorldIdError::Malformed(e.to_string()))?;

        Ok(VerifiedProof {
            nullifier_hash,
            verification_level: proof.verification_level,
            action: action.to_string(),
            response: json,
        })
    }

    /// Fetch a MiniKit transaction. Requires the developer portal API key.
    pub async fn lookup_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<MiniKitTransaction, WorldIdError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(WorldIdError::MissingApiKey)?;
        let url = self.url(&format!("/api/v2/minikit/transaction/{transaction_id}"));

        let response = self
            .http
            .get(&url)
            .query(&[("app_id", self.config.app_id.as_str())])
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| excerpt(&text));
            return Err(WorldIdError::ServiceError {
                status: status.as_u16(),
                body: detail,
            });
        }

        let json: Value =
            serde_json::from_str(&text).map_err(|_| WorldIdError::Malformed(excerpt(&text)))?;
        Ok(MiniKitTransaction::from_json(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use microcred_types::VerificationLevel;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const NULLIFIER: &str = "0x2bf8406809dcefb1486dadc96c0a897db9bab002053054cf64272db512c6fbd8";

    fn proof() -> ProofPayload {
        ProofPayload {
            merkle_root: "0x1f38b57f3bdf96f05ea62fa68814871bf0ca8ce4dbe073d8497d5a6b0a53e5e0".into(),
            nullifier_hash: NULLIFIER.into(),
            proof: "0xdeadbeef".into(),
            verification_level: VerificationLevel::Orb,
        }
    }

    fn client(server: &Server) -> WorldIdClient {
        let mut config = WorldIdConfig::new("app_test");
        config.base_url = server.url();
        config.api_key = Some("key_123".into());
        WorldIdClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn accepted_proof_returns_nullifier() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/verify/app_test")
            .match_body(Matcher::PartialJson(json!({
                "action": "access",
                "signal_hash": microcred_crypto::EMPTY_SIGNAL_HASH,
                "verification_level": "orb",
            })))
            .with_status(200)
            .with_body(format!(
                r#"{{"success":true,"action":"access","nullifier_hash":"{NULLIFIER}"}}"#
            ))
            .create_async()
            .await;

        let verified = client(&server).verify_proof(&proof(), "access", None).await.unwrap();
        mock.assert_async().await;
        assert_eq!(verified.nullifier_hash.as_str(), NULLIFIER);
        assert_eq!(verified.response["action"], "access");
    }

    #[tokio::test]
    async fn upstream_error_status_is_surfaced() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/v2/verify/app_test")
            .with_status(400)
            .with_body("x".repeat(2000))
            .create_async()
            .await;

        let err = client(&server).verify_proof(&proof(), "access", None).await.unwrap_err();
        match err {
            WorldIdError::ServiceError { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body.len(), 1000);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejection_carries_upstream_detail() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/v2/verify/app_test")
            .with_status(200)
            .with_body(r#"{"success":false,"code":"max_verifications_reached","detail":"already verified","attribute":null}"#)
            .create_async()
            .await;

        let err = client(&server).verify_proof(&proof(), "access", None).await.unwrap_err();
        match err {
            WorldIdError::Rejected { code, detail, attribute } => {
                assert_eq!(code.as_deref(), Some("max_verifications_reached"));
                assert_eq!(detail.as_deref(), Some("already verified"));
                assert_eq!(attribute, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_and_incomplete_answers() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/v2/verify/app_test")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;
        let c = client(&server);
        assert!(matches!(
            c.verify_proof(&proof(), "a", None).await,
            Err(WorldIdError::Malformed(_))
        ));
        m.remove_async().await;

        server
            .mock("POST", "/api/v2/verify/app_test")
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .create_async()
            .await;
        assert!(matches!(
            c.verify_proof(&proof(), "a", None).await,
            Err(WorldIdError::Incomplete)
        ));
    }

    #[tokio::test]
    async fn unreachable_portal_is_502() {
        let mut config = WorldIdConfig::new("app_test");
        config.base_url = "http://127.0.0.1:9".into();
        config.timeout = Duration::from_secs(2);
        let err = WorldIdClient::new(config)
            .unwrap()
            .verify_proof(&proof(), "a", None)
            .await
            .unwrap_err();
        assert_eq!(err.upstream_status(), Some(502));
    }

    #[tokio::test]
    async fn silent_portal_times_out_as_502() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and hold them open without ever answering.
        let holder = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let mut config = WorldIdConfig::new("app_test");
        config.base_url = format!("http://{addr}");
        config.timeout = Duration::from_secs(1);
        let client = WorldIdClient::new(config).unwrap();

        let started = std::time::Instant::now();
        let err = tokio::time::timeout(
            Duration::from_secs(5),
            client.verify_proof(&proof(), "a", None),
        )
        .await
        .expect("client timeout should fire first")
        .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(matches!(err, WorldIdError::ServiceError { status: 502, .. }));
        holder.abort();
    }

    #[tokio::test]
    async fn transaction_lookup_uses_bearer_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v2/minikit/transaction/tx_1")
            .match_query(Matcher::UrlEncoded("app_id".into(), "app_test".into()))
            .match_header("authorization", "Bearer key_123")
            .with_status(200)
            .with_body(r#"{"reference":"ref_1","status":"mined"}"#)
            .create_async()
            .await;

        let tx = client(&server).lookup_transaction("tx_1").await.unwrap();
        mock.assert_async().await;
        assert_eq!(tx.reference.as_deref(), Some("ref_1"));
        assert!(!tx.is_failed());
    }

    #[tokio::test]
    async fn transaction_lookup_without_key_fails_fast() {
        let server = Server::new_async().await;
        let mut config = WorldIdConfig::new("app_test");
        config.base_url = server.url();
        let err = WorldIdClient::new(config)
            .unwrap()
            .lookup_transaction("tx")
            .await
            .unwrap_err();
        assert!(matches!(err, WorldIdError::MissingApiKey));
    }

    #[tokio::test]
    async fn transaction_lookup_error_uses_detail() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v2/minikit/transaction/tx_9")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"detail":"Transaction not found"}"#)
            .create_async()
            .await;
        let err = client(&server).lookup_transaction("tx_9").await.unwrap_err();
        match err {
            WorldIdError::ServiceError { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "Transaction not found");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
