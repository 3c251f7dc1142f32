//! Database configuration

use serde::{Deserialize, Serialize};

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// PostgreSQL user
    pub user: String,
    /// PostgreSQL password
    pub password: String,
    /// Database name
    pub name: String,
    /// Maximum PostgreSQL connections
    pub max_connections: u32,
    /// Minimum PostgreSQL connections
    pub min_connections: u32,
    /// Connection acquire timeout in seconds
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            name: "merchcoin".to_string(),
            max_connections: 20,
            min_connections: 2,
            acquire_timeout_secs: 5,
        }
    }
}

impl DatabaseConfig {
    /// PostgreSQL connection URL assembled from the individual parts
    pub fn postgres_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }

    /// Mask sensitive parts of the PostgreSQL URL for logging
    pub fn postgres_url_masked(&self) -> String {
        mask_url(&self.postgres_url())
    }
}

fn mask_url(url: &str) -> String {
    // Simple masking: replace password with ***
    if let (Some(scheme_end), Some(at_pos)) = (url.find("://"), url.rfind('@')) {
        let scheme = &url[..scheme_end + 3];
        let user_pass = &url[scheme_end + 3..at_pos];
        let after_at = &url[at_pos..];

        if let Some(colon_pos) = user_pass.find(':') {
            let user = &user_pass[..colon_pos];
            return format!("{}{}:***{}", scheme, user, after_at);
        }
    }
    url.to_string()
}
