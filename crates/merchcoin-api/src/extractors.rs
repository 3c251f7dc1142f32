//! Custom Axum Extractors

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

pub use merchcoin_auth::AuthenticatedUser;

// =============================================================================
// JSON Body Extractor
// =============================================================================

/// JSON request body.
///
/// Unlike `axum::Json` this does not insist on a `Content-Type` header, and
/// every decode failure is rejected as [`ApiError::MalformedRequest`].
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::MalformedRequest(e.body_text()))?;

        let value = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::MalformedRequest(e.to_string()))?;

        Ok(JsonBody(value))
    }
}
