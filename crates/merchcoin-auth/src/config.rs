//! Authentication configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Password hashing configuration
    pub password: PasswordConfig,
}

/// JWT token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token lifetime
    #[serde(with = "humantime_serde")]
    pub token_lifetime: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set
            token_lifetime: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Password hashing configuration (Argon2id)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Time cost (iterations)
    pub time_cost: u32,
    /// Parallelism factor
    pub parallelism: u32,
    /// Pepper (additional secret, optional)
    pub pepper: Option<String>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            // OWASP recommended values for Argon2id
            memory_cost: 19456, // 19 MiB
            time_cost: 2,
            parallelism: 1,
            pepper: None,
        }
    }
}

impl AuthConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.jwt.secret.is_empty() {
            errors.push("JWT secret must be set".to_string());
        }
        if self.jwt.token_lifetime.is_zero() {
            errors.push("Token lifetime must be positive".to_string());
        }

        // Argon2 requires at least 8 KiB per lane
        if self.password.parallelism == 0 {
            errors.push("Argon2 parallelism must be at least 1".to_string());
        } else if self.password.memory_cost < 8 * self.password.parallelism {
            errors.push("Argon2 memory cost must be at least 8 KiB per lane".to_string());
        }
        if self.password.time_cost == 0 {
            errors.push("Argon2 time cost must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
