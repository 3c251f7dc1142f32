//! API error handling
//!
//! Every failure is answered with its status code and a `text/plain` body.
//! Server-side failures get a fixed message; the detail goes to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use merchcoin_ledger::LedgerError;
use thiserror::Error;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Body could not be decoded, or a required field is missing or empty
    #[error("invalid request: {0}")]
    MalformedRequest(String),
}

impl ApiError {
    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        let code = match self {
            Self::Ledger(e) => e.status_code(),
            Self::MalformedRequest(_) => 400,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Message written to the response body
    pub fn client_message(&self) -> String {
        match self {
            Self::Ledger(e) => e.client_message(),
            Self::MalformedRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (status, self.client_message()).into_response()
    }
}
