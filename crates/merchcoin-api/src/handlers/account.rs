//! Account Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::dto::InfoResponse;
use crate::error::ApiResult;
use crate::extractors::AuthenticatedUser;
use crate::state::AppState;

/// GET /api/info
pub async fn get_info(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claim): AuthenticatedUser,
) -> ApiResult<Json<InfoResponse>> {
    let info = state.ledger.account_info(claim.user_id).await?;
    Ok(Json(InfoResponse::from(info)))
}
