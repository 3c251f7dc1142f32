//! merchcoin Server
//!
//! HTTP server for the company merch shop: every employee gets coins, sends
//! them to colleagues, and spends them on merch.
//!
//! # Usage
//!
//! ```bash
//! # Minimal environment
//! DATABASE_HOST=localhost DATABASE_PORT=5432 DATABASE_USER=merch \
//! DATABASE_PASSWORD=secret DATABASE_NAME=merch SERVER_PORT=8080 SECRET=change-me \
//! merchcoin-server
//!
//! # Start with custom config
//! merchcoin-server --config /path/to/config.toml
//!
//! # Nested overrides
//! MERCHCOIN__SERVER__REQUEST_TIMEOUT_SECS=20 merchcoin-server
//! ```

mod config;
mod serve;

use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use merchcoin_api::{create_router, AppState};
use merchcoin_auth::AuthService;
use merchcoin_db::{Database, LedgerStore};
use merchcoin_ledger::LedgerService;

use crate::config::ServerConfig;

// =============================================================================
// CLI Arguments
// =============================================================================

/// merchcoin Server - coin ledger and merch shop API
#[derive(Parser, Debug)]
#[command(name = "merchcoin-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "MERCHCOIN_CONFIG")]
    config: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// PostgreSQL host
    #[arg(long, env = "DATABASE_HOST")]
    db_host: Option<String>,

    /// PostgreSQL port
    #[arg(long, env = "DATABASE_PORT")]
    db_port: Option<u16>,

    /// PostgreSQL user
    #[arg(long, env = "DATABASE_USER")]
    db_user: Option<String>,

    /// PostgreSQL password
    #[arg(long, env = "DATABASE_PASSWORD", hide_env_values = true)]
    db_password: Option<String>,

    /// PostgreSQL database name
    #[arg(long, env = "DATABASE_NAME")]
    db_name: Option<String>,

    /// Token signing secret
    #[arg(long, env = "SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "MERCHCOIN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "MERCHCOIN_LOG_FORMAT")]
    log_format: Option<String>,
}

impl Args {
    /// Apply CLI/environment overrides on top of the loaded configuration
    fn apply(self, config: &mut ServerConfig) {
        if let Some(port) = self.port {
            config.server.port = Some(port);
        }
        if let Some(host) = self.db_host {
            config.database.host = Some(host);
        }
        if let Some(port) = self.db_port {
            config.database.port = Some(port);
        }
        if let Some(user) = self.db_user {
            config.database.user = Some(user);
        }
        if let Some(password) = self.db_password {
            config.database.password = Some(password);
        }
        if let Some(name) = self.db_name {
            config.database.name = Some(name);
        }
        if let Some(secret) = self.secret {
            config.auth.secret = Some(secret);
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads the environment
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    args.apply(&mut server_config);

    init_logging(&server_config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting merchcoin server"
    );

    validate_config(&server_config)?;

    let catalog = server_config
        .catalog()
        .map_err(|e| anyhow::anyhow!("Invalid catalog: {}", e))?;
    for (item, price) in catalog.iter() {
        tracing::debug!(item, price, "Catalog item");
    }
    tracing::info!(items = catalog.len(), "Merch catalog loaded");

    let db = init_database(&server_config).await?;
    let store: Arc<dyn LedgerStore> = Arc::new(db.ledger_store());

    let auth = AuthService::new(server_config.auth_config());
    let ledger = LedgerService::new(store, auth, Arc::new(catalog))
        .with_operation_timeout(server_config.server.operation_timeout());

    let state = Arc::new(AppState::new(Arc::new(ledger)));
    let app = create_router(state, server_config.api_config());

    let addr = server_config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        address = %addr,
        idle_timeout_secs = server_config.server.idle_timeout().as_secs(),
        "Server listening"
    );

    let grace = server_config.server.shutdown_timeout();
    serve::serve(
        listener,
        app,
        server_config.server.idle_timeout(),
        shutdown_signal(),
        grace,
    )
    .await;

    // Give the pool a bounded window to close its connections
    if tokio::time::timeout(grace, db.pg.close()).await.is_err() {
        tracing::warn!(timeout_secs = grace.as_secs(), "Database pool did not close in time");
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}

// =============================================================================
// Initialization Functions
// =============================================================================

/// Initialize tracing/logging
fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .try_init()?;
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .try_init()?;
        }
    }

    Ok(())
}

/// Validate configuration
fn validate_config(config: &ServerConfig) -> anyhow::Result<()> {
    if let Err(problems) = config.validate() {
        for problem in &problems {
            tracing::error!(setting = %problem, "Missing or invalid configuration");
        }
        anyhow::bail!("Invalid configuration: {}", problems.join(", "));
    }

    if config.auth.secret.as_deref().map_or(0, str::len) < 32 {
        tracing::warn!("Signing secret is shorter than 32 bytes");
    }

    Ok(())
}

/// Connect, migrate and probe the database
async fn init_database(config: &ServerConfig) -> anyhow::Result<Database> {
    tracing::info!("Connecting to database...");

    let db = Database::connect(&config.database_config()).await?;

    if config.database.run_migrations {
        db.migrate().await?;
    }

    if !db.health_check().await {
        anyhow::bail!("Database health check failed");
    }

    tracing::info!("Database connected successfully");

    Ok(db)
}

// =============================================================================
// Graceful Shutdown
// =============================================================================

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
