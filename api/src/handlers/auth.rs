//! Wallet sign-in and session endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use microcred_auth::{siwe, WalletAuthPayload, NONCE_COOKIE};

use crate::extract::{cookie_value, JsonBody, Session};
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct SiweCompleteRequest {
    pub payload: WalletAuthPayload,
    pub nonce: String,
    #[serde(default)]
    pub username: Option<String>,
}

pub async fn nonce_issue(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let backend = state.backend()?;
    let (record, cookie) = state
        .nonces
        .issue(backend.as_ref())
        .map_err(|e| state.nonce_failure(e))?;
    state.metrics.nonces_issued.inc();
    Ok((
        [(SET_COOKIE, cookie.header_value())],
        Json(json!({ "nonce": record.value })),
    )
        .into_response())
}

pub async fn siwe_complete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<JsonBody<SiweCompleteRequest>, ApiError>,
) -> Result<Response, ApiError> {
    let JsonBody(request) = body.map_err(ApiError::sign_in)?;
    let result = complete_sign_in(&state, &headers, &request);
    state.metrics.login(result.is_ok());
    result.map_err(ApiError::sign_in)
}

fn complete_sign_in(
    state: &AppState,
    headers: &HeaderMap,
    request: &SiweCompleteRequest,
) -> Result<Response, ApiError> {
    let backend = state.backend()?;
    state
        .nonces
        .consume(
            backend.as_ref(),
            cookie_value(headers, NONCE_COOKIE),
            &request.nonce,
        )
        .map_err(|e| state.nonce_failure(e))?;

    // The nonce is spent from here on.
    let clear_nonce = state.nonces.clear_cookie();
    let now = state.now();
    let address = siwe::verify(&request.payload, &request.nonce, now)
        .map_err(|e| ApiError::from(e).with_cookie(clear_nonce.clone()))?;
    let (claims, session) = state
        .sessions
        .issue(address, request.username.as_deref(), now)?;
    tracing::info!(%address, "wallet signed in");

    Ok((
        AppendHeaders([
            (SET_COOKIE, clear_nonce.header_value()),
            (SET_COOKIE, session.header_value()),
        ]),
        Json(json!({
            "status": "success",
            "isValid": true,
            "address": claims.address.to_string(),
            "username": claims.username,
        })),
    )
        .into_response())
}

pub async fn session(Session(claims): Session) -> Json<Value> {
    Json(json!({
        "address": claims.address.to_string(),
        "username": claims.username,
        "expiresAt": claims.exp,
    }))
}

pub async fn logout(State(state): State<Arc<AppState>>) -> Response {
    (
        [(SET_COOKIE, state.sessions.revoke().header_value())],
        Json(json!({ "success": true })),
    )
        .into_response()
}
