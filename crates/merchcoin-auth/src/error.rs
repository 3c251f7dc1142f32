//! Authentication error types
//!
//! Every header and token failure belongs to the "unauthenticated" category
//! and maps to 401. Messages are safe to send to clients; internal details
//! stay in the log.

use thiserror::Error;

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    // =========================================================================
    // Request Errors
    // =========================================================================
    /// No `Authorization` header on the request
    #[error("missing Authorization header")]
    MissingAuthorization,

    /// `Authorization` header is not `Bearer <token>`
    #[error("malformed Authorization header")]
    MalformedAuthorization,

    // =========================================================================
    // Token Errors
    // =========================================================================
    /// Token structure could not be parsed
    #[error("invalid token: malformed token")]
    MalformedToken,

    /// Token header names a signing algorithm other than the expected one
    #[error("invalid token: unexpected signing algorithm {0}")]
    AlgorithmMismatch(String),

    /// Signature does not match the token contents
    #[error("invalid token: signature mismatch")]
    InvalidSignature,

    /// Token is past its expiry time
    #[error("invalid token: token expired")]
    TokenExpired,

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Password hashing failed
    #[error("password hashing failed")]
    PasswordHashingFailed,

    /// Internal error (should not be exposed to clients)
    #[error("internal error")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        if self.is_unauthenticated() {
            401
        } else {
            500
        }
    }

    /// Whether this error means the caller has no usable identity
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::MissingAuthorization
                | Self::MalformedAuthorization
                | Self::MalformedToken
                | Self::AlgorithmMismatch(_)
                | Self::InvalidSignature
                | Self::TokenExpired
        )
    }

    /// Get safe message for client (doesn't leak internal details)
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal(_) | Self::PasswordHashingFailed => {
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm => Self::AlgorithmMismatch("unknown".to_string()),
            _ => Self::MalformedToken,
        }
    }
}
