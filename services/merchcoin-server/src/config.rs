//! Server Configuration
//!
//! Sources, lowest precedence first: `--config` file, `config/default`,
//! `config/local`, `MERCHCOIN__*` environment variables, then CLI flags (which
//! also read the plain `DATABASE_*`, `SERVER_PORT` and `SECRET` variables).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use merchcoin_api::ApiConfig;
use merchcoin_auth::{AuthConfig, JwtConfig, PasswordConfig};
use merchcoin_db::DatabaseConfig;
use merchcoin_ledger::{Catalog, CatalogError};

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server binding configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthSettings,

    /// Item → price override for the merch catalog
    #[serde(default)]
    pub catalog: Option<BTreeMap<String, i64>>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server binding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on (required)
    pub port: Option<u16>,

    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Request body read timeout in seconds
    #[serde(default = "default_body_read_timeout")]
    pub body_read_timeout_secs: u64,

    /// Keep-alive idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Deadline for a single store operation in seconds
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,

    /// Shutdown grace period in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            request_timeout_secs: default_request_timeout(),
            body_read_timeout_secs: default_body_read_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            operation_timeout_secs: default_operation_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl ServerSettings {
    /// Address to bind to, as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port.unwrap_or_default())
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,

    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Pool acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Run migrations on startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            user: None,
            password: None,
            name: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            run_migrations: true,
        }
    }
}

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Token signing secret (required)
    pub secret: Option<String>,

    /// Token lifetime in seconds
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: u64,

    /// Argon2id parameters
    #[serde(default)]
    pub password: PasswordConfig,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            secret: None,
            token_lifetime_secs: default_token_lifetime(),
            password: PasswordConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Enable request tracing spans
    #[serde(default = "default_true")]
    pub log_requests: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_requests: true,
        }
    }
}

// =============================================================================
// Default Functions
// =============================================================================

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_body_read_timeout() -> u64 {
    5
}

fn default_idle_timeout() -> u64 {
    120
}

fn default_operation_timeout() -> u64 {
    5
}

fn default_shutdown_timeout() -> u64 {
    10
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_token_lifetime() -> u64 {
    24 * 60 * 60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_true() -> bool {
    true
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl ServerConfig {
    /// Load configuration from environment and optional config file
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();

        // Add config file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        // Add default config locations
        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        // Add environment variables with MERCHCOIN__ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("MERCHCOIN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Check that every required setting is present.
    ///
    /// Returns all problems at once rather than stopping at the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut missing = Vec::new();

        if is_blank(&self.database.host) {
            missing.push("database host (DATABASE_HOST)".to_string());
        }
        if self.database.port.is_none() {
            missing.push("database port (DATABASE_PORT)".to_string());
        }
        if is_blank(&self.database.user) {
            missing.push("database user (DATABASE_USER)".to_string());
        }
        if is_blank(&self.database.password) {
            missing.push("database password (DATABASE_PASSWORD)".to_string());
        }
        if is_blank(&self.database.name) {
            missing.push("database name (DATABASE_NAME)".to_string());
        }
        if self.server.port.is_none() {
            missing.push("server port (SERVER_PORT)".to_string());
        }
        if is_blank(&self.auth.secret) {
            missing.push("signing secret (SECRET)".to_string());
        }

        if let Err(errors) = self.auth_config().validate() {
            // An absent secret is already reported above
            missing.extend(errors.into_iter().filter(|e| !e.contains("secret")));
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    /// Database connection settings
    pub fn database_config(&self) -> DatabaseConfig {
        let db = &self.database;
        DatabaseConfig {
            host: db.host.clone().unwrap_or_default(),
            port: db.port.unwrap_or_default(),
            user: db.user.clone().unwrap_or_default(),
            password: db.password.clone().unwrap_or_default(),
            name: db.name.clone().unwrap_or_default(),
            max_connections: db.max_connections,
            min_connections: db.min_connections,
            acquire_timeout_secs: db.acquire_timeout_secs,
        }
    }

    /// Token and password settings
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt: JwtConfig {
                secret: self.auth.secret.clone().unwrap_or_default(),
                token_lifetime: Duration::from_secs(self.auth.token_lifetime_secs),
            },
            password: self.auth.password.clone(),
        }
    }

    /// HTTP middleware settings
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            request_timeout: Duration::from_secs(self.server.request_timeout_secs),
            body_read_timeout: Duration::from_secs(self.server.body_read_timeout_secs),
            enable_tracing: self.logging.log_requests,
        }
    }

    /// Merch catalog: the configured override, or the standard list
    pub fn catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog {
            Some(prices) => Catalog::new(prices.clone()),
            None => Ok(Catalog::default_merch()),
        }
    }
}
