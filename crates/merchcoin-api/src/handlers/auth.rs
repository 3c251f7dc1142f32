//! Authentication Handler

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::dto::{AuthRequest, AuthResponse};
use crate::error::{ApiError, ApiResult};
use crate::extractors::JsonBody;
use crate::state::AppState;

/// POST /api/auth
///
/// Exchanges credentials for a token. An unknown username is registered on
/// the spot with the starting balance.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<AuthRequest>,
) -> ApiResult<Json<AuthResponse>> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::MalformedRequest(
            "username and password are required".to_string(),
        ));
    }

    let token = state.ledger.authenticate(&req.username, &req.password).await?;

    Ok(Json(AuthResponse { token }))
}
