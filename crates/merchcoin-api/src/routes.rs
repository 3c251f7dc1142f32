//! API Routes

use axum::{
    routing::{get, post},
    Router,
};
use merchcoin_auth::AuthLayer;
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

/// Routes under `/api`
pub fn api_routes(auth: AuthLayer) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth", post(handlers::auth::authenticate))
        .merge(protected_routes(auth))
}

/// Routes behind the bearer access gate
fn protected_routes(auth: AuthLayer) -> Router<Arc<AppState>> {
    Router::new()
        .route("/info", get(handlers::account::get_info))
        .route("/sendCoin", post(handlers::coins::send_coin))
        .route("/buy/:item", get(handlers::merch::buy_item))
        .route_layer(auth)
}
