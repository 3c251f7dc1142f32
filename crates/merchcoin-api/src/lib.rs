//! merchcoin REST API
//!
//! # API Structure
//!
//! ```text
//! /api/
//! ├── POST /auth          - Token for credentials (registers on first use)
//! ├── GET  /info          - Balance, inventory, coin history      [bearer]
//! ├── POST /sendCoin      - Transfer coins to another user        [bearer]
//! └── GET  /buy/{item}    - Buy one catalog item                  [bearer]
//! /health                 - Store liveness
//! ```
//!
//! Errors are returned as `text/plain` with the matching status code.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::http::HeaderName;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Upper bound on handling a whole request
    pub request_timeout: Duration,
    /// Upper bound on receiving the request body
    pub body_read_timeout: Duration,
    /// Enable request tracing
    pub enable_tracing: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            body_read_timeout: Duration::from_secs(5),
            enable_tracing: true,
        }
    }
}

/// Create the main API router with all middleware
pub fn create_router(state: Arc<AppState>, config: ApiConfig) -> Router {
    let auth = state.ledger.auth().layer();

    let mut router = Router::new()
        .nest("/api", routes::api_routes(auth))
        .route("/health", axum::routing::get(handlers::health::health_check))
        .with_state(state);

    router = router.layer(
        ServiceBuilder::new()
            .layer(TimeoutLayer::new(config.request_timeout))
            .layer(RequestBodyTimeoutLayer::new(config.body_read_timeout)),
    );

    if config.enable_tracing {
        router = router.layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");

                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        );
    }

    // Outermost, so the id exists before the trace span is opened
    let x_request_id = HeaderName::from_static("x-request-id");
    router
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
}
