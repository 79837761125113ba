//! Survey deposits paid through MiniKit. Both endpoints need a session.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::extract::{JsonBody, Session};
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateDepositBody {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub token_symbol: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MiniKitPayload {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmDepositBody {
    #[serde(default)]
    pub minikit_payload: Option<MiniKitPayload>,
}

pub async fn initiate_deposit(
    State(state): State<Arc<AppState>>,
    Session(claims): Session,
    JsonBody(body): JsonBody<InitiateDepositBody>,
) -> Result<Json<Value>, ApiError> {
    let backend = state.backend()?;
    let deposit = state
        .deposits
        .initiate(backend.as_ref(), claims.address, body.amount, &body.token_symbol)
        .map_err(|e| state.lending_failure(e))?;
    Ok(Json(json!({
        "success": true,
        "referenceId": deposit.reference_id,
    })))
}

pub async fn confirm_deposit(
    State(state): State<Arc<AppState>>,
    Session(claims): Session,
    JsonBody(body): JsonBody<ConfirmDepositBody>,
) -> Result<Json<Value>, ApiError> {
    let payload = body.minikit_payload.unwrap_or_default();
    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (reference, transaction_id) =
        match (non_blank(payload.reference), non_blank(payload.transaction_id)) {
            (Some(r), Some(t)) => (r, t),
            _ => return Err(ApiError::bad_request("Invalid or incomplete MiniKit payload.")),
        };

    let backend = state.backend()?;
    let deposit = state
        .deposits
        .find_initiated(backend.as_ref(), &claims.address, &reference)
        .map_err(|e| state.lending_failure(e))?;

    let transaction = state.world_id.lookup_transaction(&transaction_id).await?;
    state
        .deposits
        .settle(backend.as_ref(), deposit, &transaction_id, &transaction)
        .map_err(|e| state.lending_failure(e))?;
    state.metrics.deposits_confirmed.inc();

    Ok(Json(json!({
        "success": true,
        "message": "Deposit confirmed.",
    })))
}
