//! Bearer access gate for Axum
//!
//! [`AuthLayer`] wraps protected routes. Each request must carry
//! `Authorization: Bearer <token>`; on success the verified
//! [`IdentityClaim`] is inserted into the request extensions, otherwise the
//! request is answered with 401 and never reaches the handler.

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::Response,
};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::error::AuthError;
use crate::jwt::JwtService;
use crate::types::IdentityClaim;

/// Authentication middleware layer
#[derive(Clone)]
pub struct AuthLayer {
    jwt: Arc<JwtService>,
}

impl AuthLayer {
    /// Create a new authentication layer
    pub fn new(jwt: Arc<JwtService>) -> Self {
        Self { jwt }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            jwt: self.jwt.clone(),
        }
    }
}

/// Authentication middleware service
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    jwt: Arc<JwtService>,
}

impl<S> Service<Request> for AuthMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // Keep the service that was polled ready
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        match authenticate_request(req.headers(), &self.jwt) {
            Ok(claim) => {
                tracing::debug!(user_id = claim.user_id, "Request authenticated");
                let (mut parts, body) = req.into_parts();
                parts.extensions.insert(claim);
                let req = Request::from_parts(parts, body);
                Box::pin(async move { inner.call(req).await })
            }
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    path = %req.uri().path(),
                    "Request rejected by access gate"
                );
                Box::pin(async move { Ok::<_, S::Error>(auth_error_response(e)) })
            }
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The header must split on single spaces into exactly two parts, the first
/// being `Bearer` and the second non-empty.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthorization)?;
    let value = value.to_str().map_err(|_| AuthError::MalformedAuthorization)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedAuthorization),
    }
}

/// Authenticate a request from its headers
pub fn authenticate_request(
    headers: &HeaderMap,
    jwt: &JwtService,
) -> Result<IdentityClaim, AuthError> {
    let token = extract_bearer(headers)?;
    jwt.verify(token)
}

/// Plain-text error response for an authentication failure
pub fn auth_error_response(error: AuthError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(error.client_message()))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

// =============================================================================
// Axum Extractors
// =============================================================================

/// Extractor for the identity verified by [`AuthLayer`].
/// Returns 401 if the route is not behind the gate.
pub struct AuthenticatedUser(pub IdentityClaim);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityClaim>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(|| auth_error_response(AuthError::MissingAuthorization))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use axum::{routing::get, Router};
    use chrono::{Duration, Utc};
    use tower::ServiceExt;

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new(JwtConfig {
            secret: "middleware-test-secret".to_string(),
            ..JwtConfig::default()
        }))
    }

    fn app(jwt: Arc<JwtService>) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|AuthenticatedUser(claim): AuthenticatedUser| async move { claim.username }),
            )
            .layer(AuthLayer::new(jwt))
    }

    async fn call(app: Router, authorization: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(&headers_with("Bearer abc")), Ok("abc"));
        assert_eq!(extract_bearer(&HeaderMap::new()), Err(AuthError::MissingAuthorization));
        assert_eq!(
            extract_bearer(&headers_with("Basic abc")),
            Err(AuthError::MalformedAuthorization)
        );
        assert_eq!(
            extract_bearer(&headers_with("Bearer")),
            Err(AuthError::MalformedAuthorization)
        );
        assert_eq!(
            extract_bearer(&headers_with("Bearer a b")),
            Err(AuthError::MalformedAuthorization)
        );
        assert_eq!(
            extract_bearer(&headers_with("bearer abc")),
            Err(AuthError::MalformedAuthorization)
        );
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let jwt = jwt();
        let token = jwt.issue(3, "carol").unwrap();

        let (status, body) = call(app(jwt), Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "carol");
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let (status, body) = call(app(jwt()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "missing Authorization header");
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let jwt = jwt();
        let token = jwt.issue_at(3, "carol", Utc::now() - Duration::days(2)).unwrap();

        let (status, body) = call(app(jwt), Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("expired"));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let (status, _) = call(app(jwt()), Some("Bearer garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_auth_error_response() {
        let response = auth_error_response(AuthError::InvalidSignature);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );

        let response = auth_error_response(AuthError::Internal("x".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
