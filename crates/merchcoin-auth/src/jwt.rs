//! JWT Token Service
//!
//! Identity tokens are HS512-signed claim sets `{user_id, username, iat, exp}`.
//! Verification rejects any other signing algorithm before checking the
//! signature, and applies no expiry leeway.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};
use crate::types::IdentityClaim;

/// The only algorithm tokens are signed and accepted with
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS512;

/// JWT service for issuing and verifying identity tokens
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    /// Create a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    /// Issue a token for a user, valid from now
    pub fn issue(&self, user_id: i64, username: &str) -> AuthResult<String> {
        self.issue_at(user_id, username, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        user_id: i64,
        username: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<String> {
        let lifetime = Duration::from_std(self.config.token_lifetime)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let exp = now + lifetime;

        let claims = IdentityClaim {
            user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to encode token: {}", e)))
    }

    /// Verify a token and return its identity claim
    pub fn verify(&self, token: &str) -> AuthResult<IdentityClaim> {
        let header = decode_header(token).map_err(|_| match declared_algorithm(token) {
            Some(alg) if alg != "HS512" => AuthError::AlgorithmMismatch(alg),
            _ => AuthError::MalformedToken,
        })?;
        if header.alg != SIGNING_ALGORITHM {
            return Err(AuthError::AlgorithmMismatch(format!("{:?}", header.alg)));
        }

        let data = decode::<IdentityClaim>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

/// Read the raw `alg` value from a token header that jsonwebtoken cannot parse,
/// such as `none` or an unknown algorithm name.
fn declared_algorithm(token: &str) -> Option<String> {
    let (encoded, _) = token.split_once('.')?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(encoded)
        .ok()?;
    let header: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    header.get("alg")?.as_str().map(str::to_string)
}
