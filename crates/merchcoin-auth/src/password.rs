//! Password Service
//!
//! Argon2id hashing (OWASP recommended) with an optional pepper. Stored
//! hashes are PHC strings, so verification reads the cost parameters from
//! the hash itself and keeps working after the configured costs change.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};
use zeroize::Zeroizing;

use crate::config::PasswordConfig;
use crate::error::{AuthError, AuthResult};

/// Password service for hashing and verification
#[derive(Clone)]
pub struct PasswordService {
    config: PasswordConfig,
}

impl PasswordService {
    /// Create a new password service
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    fn peppered(&self, password: &str) -> Zeroizing<String> {
        match self.config.pepper {
            Some(ref pepper) => Zeroizing::new(format!("{}{}", password, pepper)),
            None => Zeroizing::new(password.to_string()),
        }
    }

    /// Hash a password using Argon2id with a fresh random salt
    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        let password_with_pepper = self.peppered(password);
        let salt = SaltString::generate(&mut OsRng);

        let params = Params::new(
            self.config.memory_cost,
            self.config.time_cost,
            self.config.parallelism,
            None,
        )
        .map_err(|e| AuthError::Internal(format!("Invalid Argon2 params: {}", e)))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        let hash = argon2
            .hash_password(password_with_pepper.as_bytes(), &salt)
            .map_err(|_| AuthError::PasswordHashingFailed)?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash.
    ///
    /// Fails closed: an unparseable hash is a mismatch, never an error the
    /// caller could mistake for success.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let password_with_pepper = self.peppered(password);

        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is not a valid PHC string");
                return false;
            }
        };

        Argon2::default()
            .verify_password(password_with_pepper.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> PasswordConfig {
        PasswordConfig {
            // Use lower values for tests to be fast
            memory_cost: 4096,
            time_cost: 1,
            parallelism: 1,
            pepper: None,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let service = PasswordService::new(test_config());
        let password = "hunter2";

        let hash = service.hash_password(password).unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(service.verify_password(password, &hash));
        assert!(!service.verify_password("hunter3", &hash));
    }

    #[test]
    fn test_hash_with_pepper() {
        let mut config = test_config();
        config.pepper = Some("secret-pepper".to_string());
        let service = PasswordService::new(config);

        let hash = service.hash_password("pw").unwrap();
        assert!(service.verify_password("pw", &hash));

        // Service without pepper should fail
        let service_no_pepper = PasswordService::new(test_config());
        assert!(!service_no_pepper.verify_password("pw", &hash));
    }

    #[test]
    fn test_different_passwords_different_hashes() {
        let service = PasswordService::new(test_config());

        let hash1 = service.hash_password("same").unwrap();
        let hash2 = service.hash_password("same").unwrap();

        // Different salts
        assert_ne!(hash1, hash2);
        assert!(service.verify_password("same", &hash1));
        assert!(service.verify_password("same", &hash2));
    }

    #[test]
    fn test_verify_fails_closed_on_garbage_hash() {
        let service = PasswordService::new(test_config());
        assert!(!service.verify_password("pw", "not-a-phc-string"));
        assert!(!service.verify_password("pw", ""));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut config = test_config();
        config.memory_cost = 1;
        let service = PasswordService::new(config);
        assert!(matches!(
            service.hash_password("pw"),
            Err(AuthError::Internal(_))
        ));
    }
}
