//! Health Check Handler

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;

use crate::state::AppState;

/// GET /health
///
/// 200 when the store answers, 503 otherwise.
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.ledger.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}
