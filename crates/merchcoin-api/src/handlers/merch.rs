//! Merch Purchase Handler

use axum::extract::{Path, State};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::extractors::AuthenticatedUser;
use crate::state::AppState;

pub const PURCHASE_CONFIRMATION: &str = "purchase completed";

/// GET /api/buy/{item}
pub async fn buy_item(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claim): AuthenticatedUser,
    Path(item): Path<String>,
) -> ApiResult<&'static str> {
    state.ledger.purchase(claim.user_id, &item).await?;
    Ok(PURCHASE_CONFIRMATION)
}
