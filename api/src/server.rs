//! Router assembly and the listening loop.

use std::future::Future;
use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, identity, lending, survey, system};
use crate::{AppState, ServerError};

pub fn router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/nonce-issue", get(auth::nonce_issue))
        .route("/siwe-complete", post(auth::siwe_complete))
        .route("/session", get(auth::session))
        .route("/logout", post(auth::logout))
        .route("/proof-verify", post(identity::proof_verify))
        .route("/loan-request", post(lending::loan_request))
        .route("/loan-quote", post(lending::loan_quote))
        .route("/exchange-simulate", post(lending::exchange_simulate))
        .route("/survey/initiate-deposit", post(survey::initiate_deposit))
        .route("/survey/confirm-deposit", post(survey::confirm_deposit))
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics))
        .layer(TraceLayer::new_for_http());

    let router = match cors_layer(&state.config.cors_allowed_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };
    router.with_state(state)
}

/// Credentialed CORS for the configured origins, or none at all.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE])
            .allow_credentials(true),
    )
}

/// Bind `listen_addr` and serve until `shutdown` resolves.
pub async fn serve<F>(state: Arc<AppState>, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(&state.config.listen_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP API listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("HTTP API stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_origins_means_no_cors() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["not a header\n".to_string()]).is_none());
        assert!(cors_layer(&["https://app.example".to_string()]).is_some());
    }
}
