//! Coin Transfer Handler

use axum::extract::State;
use std::sync::Arc;

use crate::dto::SendCoinRequest;
use crate::error::ApiResult;
use crate::extractors::{AuthenticatedUser, JsonBody};
use crate::state::AppState;

pub const SEND_CONFIRMATION: &str = "coins sent successfully";

/// POST /api/sendCoin
pub async fn send_coin(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claim): AuthenticatedUser,
    JsonBody(req): JsonBody<SendCoinRequest>,
) -> ApiResult<&'static str> {
    state
        .ledger
        .transfer(&claim, &req.to_user, req.amount)
        .await?;

    Ok(SEND_CONFIRMATION)
}
