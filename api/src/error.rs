//! HTTP error type and the mapping from library errors.

use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use thiserror::Error;

use microcred_auth::{NonceError, SessionError, SetCookie, SiweError};
use microcred_lending::LendingError;
use microcred_worldid::WorldIdError;

const INTERNAL_MESSAGE: &str = "Internal server error.";

/// Startup failures. Request handling never produces these.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("World ID client error: {0}")]
    WorldId(#[from] WorldIdError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Body layout of an error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// `{success: false, message, ...details}`
    Standard,
    /// `{status: "error", isValid: false, message}`
    SignIn,
}

/// An error response in the endpoint's JSON shape.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Map<String, Value>,
    shape: Shape,
    cookies: Vec<SetCookie>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: Map::new(),
            shape: Shape::Standard,
            cookies: Vec::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Log `detail` and answer with a generic 500.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn with_cookie(mut self, cookie: SetCookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Render in the `/siwe-complete` shape.
    pub fn sign_in(mut self) -> Self {
        self.shape = Shape::SignIn;
        self
    }

    fn body(&self) -> Value {
        match self.shape {
            Shape::SignIn => json!({
                "status": "error",
                "isValid": false,
                "message": self.message,
            }),
            Shape::Standard => {
                let mut body = Map::new();
                body.insert("success".into(), Value::Bool(false));
                body.insert("message".into(), Value::String(self.message.clone()));
                for (k, v) in &self.details {
                    body.insert(k.clone(), v.clone());
                }
                Value::Object(body)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = self.body();
        let cookies: Vec<_> = self
            .cookies
            .iter()
            .map(|c| (SET_COOKIE, c.header_value()))
            .collect();
        (self.status, AppendHeaders(cookies), Json(body)).into_response()
    }
}

impl From<NonceError> for ApiError {
    fn from(e: NonceError) -> Self {
        match e {
            NonceError::ExpiredOrMissing => Self::bad_request("Nonce not found or expired."),
            NonceError::Mismatch => Self::bad_request("Invalid nonce."),
            NonceError::Store(e) => Self::internal(e),
        }
    }
}

impl From<SiweError> for ApiError {
    fn from(e: SiweError) -> Self {
        tracing::info!(error = %e, "SIWE verification failed");
        Self::bad_request("SIWE message verification failed.")
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Encoding(_) | SessionError::WeakSecret { .. } => Self::internal(e),
            other => {
                tracing::debug!(error = %other, "session rejected");
                Self::unauthorized("Not authenticated.")
            }
        }
    }
}

impl From<WorldIdError> for ApiError {
    fn from(e: WorldIdError) -> Self {
        match e {
            WorldIdError::MissingField(field) => {
                Self::bad_request(format!("Missing proof field: {field}"))
            }
            WorldIdError::ServiceError { status, body } => {
                let code = StatusCode::from_u16(status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                tracing::warn!(status, "World ID service error");
                Self::new(code, format!("World ID service error: {status}"))
                    .with_detail("worldIdResponseDetails", body)
            }
            WorldIdError::Rejected {
                code,
                detail,
                attribute,
            } => {
                let message = detail
                    .clone()
                    .unwrap_or_else(|| "World ID verification failed.".to_string());
                Self::bad_request(message).with_detail(
                    "worldIdError",
                    json!({ "code": code, "detail": detail, "attribute": attribute }),
                )
            }
            WorldIdError::Malformed(raw) => {
                tracing::error!("World ID returned an unparsable body");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Invalid response from World ID service.",
                )
                .with_detail("rawResponse", raw)
            }
            WorldIdError::Incomplete => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification succeeded but no nullifier hash was returned.",
            ),
            WorldIdError::MissingApiKey => {
                tracing::error!("developer portal API key not configured");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error.")
            }
            WorldIdError::HttpClient(e) => Self::internal(e),
        }
    }
}

impl From<LendingError> for ApiError {
    fn from(e: LendingError) -> Self {
        match e {
            LendingError::AccessActionRequired => Self::new(
                StatusCode::FORBIDDEN,
                "User not found. Please complete general access verification first.",
            )
            .with_detail("verifiedByWorldId", true),
            LendingError::Validation(message) => Self::bad_request(message),
            LendingError::DepositNotFound => {
                Self::not_found("Initiated deposit not found or already processed.")
            }
            LendingError::ReferenceMismatch { .. } => {
                Self::bad_request("Transaction reference mismatch.")
            }
            LendingError::TransactionFailed(status) => {
                Self::bad_request(format!("On-chain payment failed (status: {status})."))
            }
            LendingError::Store(e) => Self::internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use microcred_store::StoreError;

    #[test]
    fn upstream_status_is_propagated() {
        let err: ApiError = WorldIdError::ServiceError {
            status: 503,
            body: "down".into(),
        }
        .into();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.details["worldIdResponseDetails"], "down");
    }

    #[test]
    fn odd_upstream_status_becomes_bad_gateway() {
        let err: ApiError = WorldIdError::ServiceError {
            status: 302,
            body: String::new(),
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn rejection_carries_world_id_error() {
        let err: ApiError = WorldIdError::Rejected {
            code: Some("invalid_proof".into()),
            detail: Some("The provided proof is invalid.".into()),
            attribute: None,
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "The provided proof is invalid.");
        assert_eq!(err.details["worldIdError"]["code"], "invalid_proof");
    }

    #[test]
    fn store_errors_hide_driver_text() {
        let err: ApiError = LendingError::Store(StoreError::Backend("MDB_PANIC".into())).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.body().to_string().contains("MDB_PANIC"));
    }

    #[test]
    fn sign_in_shape() {
        let body = ApiError::from(NonceError::Mismatch).sign_in().body();
        assert_eq!(body, json!({"status": "error", "isValid": false, "message": "Invalid nonce."}));
    }

    #[test]
    fn access_prerequisite_is_forbidden() {
        let err: ApiError = LendingError::AccessActionRequired.into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.body()["verifiedByWorldId"], true);
        assert_eq!(err.body()["success"], false);
    }

    #[test]
    fn http_client_failure_is_a_startup_error() {
        let err: ServerError = WorldIdError::HttpClient("no TLS backend".into()).into();
        assert!(matches!(err, ServerError::WorldId(_)));
        assert!(err.to_string().contains("no TLS backend"));

        let api: ApiError = WorldIdError::HttpClient("no TLS backend".into()).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.body().to_string().contains("TLS"));
    }
}
