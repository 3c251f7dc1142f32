//! Authentication types

use serde::{Deserialize, Serialize};

/// Verified identity carried by a token.
///
/// Serialized as the JWT claim set; after verification the access gate puts
/// it into the request extensions for handlers to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    /// User ID
    pub user_id: i64,
    /// Username the token was issued to
    pub username: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expires at (Unix seconds)
    pub exp: i64,
}
