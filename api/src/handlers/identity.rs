//! World ID proof verification and first-access registration.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use microcred_lending::LendingError;
use microcred_worldid::{ProofPayload, VerifiedProof, WorldIdError};

use crate::extract::JsonBody;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofVerifyRequest {
    pub world_id_proof_data: ProofPayload,
    pub action: String,
    #[serde(default)]
    pub signal: Option<String>,
}

/// Verify a proof upstream and count the outcome.
pub(crate) async fn verify_upstream(
    state: &AppState,
    proof: &ProofPayload,
    action: &str,
    signal: Option<&str>,
) -> Result<VerifiedProof, ApiError> {
    match state.world_id.verify_proof(proof, action, signal).await {
        Ok(verified) => {
            state.metrics.proof("verified");
            Ok(verified)
        }
        Err(e) => {
            let outcome = match e {
                WorldIdError::Rejected { .. } => "rejected",
                _ => "error",
            };
            state.metrics.proof(outcome);
            Err(e.into())
        }
    }
}

/// Map a directory failure, attaching the upstream response to a 403.
pub(crate) fn directory_failure(
    state: &AppState,
    e: LendingError,
    verified: &VerifiedProof,
) -> ApiError {
    let forbidden = matches!(e, LendingError::AccessActionRequired);
    let err = state.lending_failure(e);
    if forbidden {
        err.with_detail("worldIdResponse", verified.response.clone())
    } else {
        err
    }
}

pub async fn proof_verify(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<ProofVerifyRequest>,
) -> Result<Json<Value>, ApiError> {
    let action = request.action.trim();
    if action.is_empty() {
        return Err(ApiError::bad_request("Missing action."));
    }
    let verified = verify_upstream(
        &state,
        &request.world_id_proof_data,
        action,
        request.signal.as_deref(),
    )
    .await?;

    let backend = state.backend()?;
    let (user, created) = state
        .directory
        .create_if_access_action(backend.as_ref(), &verified.nullifier_hash, action)
        .map_err(|e| directory_failure(&state, e, &verified))?;
    if created {
        state.metrics.users_created.inc();
    }

    Ok(Json(json!({
        "success": true,
        "message": "Identity verified and processed.",
        "user": user,
        "nullifierHash": verified.nullifier_hash.to_string(),
        "worldIdResponse": verified.response,
    })))
}
