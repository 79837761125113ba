//! Loan requests, quotes and the exchange simulator.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use microcred_lending::{quote, simulate_exchange};
use microcred_worldid::ProofPayload;

use super::identity::{directory_failure, verify_upstream};
use crate::extract::JsonBody;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequestBody {
    pub world_id_proof_data: ProofPayload,
    pub action_client: String,
    #[serde(default)]
    pub requested_amount: Option<f64>,
    #[serde(default)]
    pub signal_client: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanQuoteBody {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub term_days: Option<u32>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub contributions_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ExchangeBody {
    #[serde(default)]
    pub amount: Option<f64>,
}

pub async fn loan_request(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<LoanRequestBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    // Cheap checks first so a bad request never reaches World ID.
    let amount = state
        .loans
        .validate(&body.action_client, body.requested_amount)
        .map_err(|e| state.lending_failure(e))?;
    let verified = verify_upstream(
        &state,
        &body.world_id_proof_data,
        &body.action_client,
        body.signal_client.as_deref(),
    )
    .await?;

    let backend = state.backend()?;
    let loan = state
        .loans
        .submit(backend.as_ref(), &state.directory, &verified, amount)
        .map_err(|e| directory_failure(&state, e, &verified))?;
    state.metrics.loans_created.inc();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "loanId": loan.id.to_string(),
            "status": loan.status.as_str(),
            "message": "Loan request received.",
        })),
    ))
}

pub async fn loan_quote(JsonBody(body): JsonBody<LoanQuoteBody>) -> Result<Json<Value>, ApiError> {
    let data = quote(
        body.amount.unwrap_or(f64::NAN),
        body.term_days.unwrap_or(0),
        body.purpose.as_deref().unwrap_or(""),
        body.contributions_count.unwrap_or(0),
    )?;
    Ok(Json(json!({
        "success": true,
        "message": "Loan quote calculated.",
        "data": data,
    })))
}

pub async fn exchange_simulate(
    JsonBody(body): JsonBody<ExchangeBody>,
) -> Result<Json<Value>, ApiError> {
    let result = simulate_exchange(body.amount)?;
    Ok(Json(json!({
        "success": true,
        "message": "Exchange simulated.",
        "data": result,
    })))
}
