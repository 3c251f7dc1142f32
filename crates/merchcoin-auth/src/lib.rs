//! merchcoin Authentication Layer
//!
//! - **Identity tokens**: HS512-signed JWTs carrying `{user_id, username, iat, exp}`
//! - **Password Security**: Argon2id hashing (OWASP recommended)
//! - **Access gate**: tower layer enforcing `Authorization: Bearer <token>`
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Authentication Flow                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  POST /api/auth → PasswordService → JwtService::issue       │
//! │                                                              │
//! │  Request → AuthLayer → JwtService::verify → Handler          │
//! │                              │                               │
//! │                              ▼                               │
//! │                        IdentityClaim                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod jwt;
pub mod password;
pub mod middleware;
pub mod types;

pub use config::{AuthConfig, JwtConfig, PasswordConfig};
pub use error::{AuthError, AuthResult};
pub use jwt::JwtService;
pub use password::PasswordService;
pub use middleware::{AuthLayer, AuthMiddleware, AuthenticatedUser};
pub use types::*;

use std::sync::Arc;

/// Authentication services built from one [`AuthConfig`]
#[derive(Clone)]
pub struct AuthService {
    pub jwt: Arc<JwtService>,
    pub password: PasswordService,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            jwt: Arc::new(JwtService::new(config.jwt.clone())),
            password: PasswordService::new(config.password.clone()),
            config,
        }
    }

    /// Get the config reference
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Create an auth layer for Axum router
    pub fn layer(&self) -> AuthLayer {
        AuthLayer::new(self.jwt.clone())
    }
}
