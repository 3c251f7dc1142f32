//! merchcoin Database Layer
//!
//! PostgreSQL persistence for the coin ledger.
//!
//! # Schema
//!
//! - **users**: username, password hash, coin balance (never negative)
//! - **user_inventory**: per-user item counts, unique on `(user_id, item)`
//! - **coin_transactions**: append-only log of completed peer transfers
//!
//! # Store Capability
//!
//! The ledger engine talks to persistence only through [`LedgerStore`].
//! [`PgLedgerStore`] is the production implementation; `InMemoryStore`
//! (behind the `mock` feature) serves tests.

pub mod config;
pub mod error;
pub mod models;
pub mod store;
mod pg;
#[cfg(any(test, feature = "mock"))]
pub mod memory;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub use config::DatabaseConfig;
pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::PgLedgerStore;
pub use store::LedgerStore;
#[cfg(any(test, feature = "mock"))]
pub use memory::InMemoryStore;

/// Database connection pool
pub struct Database {
    /// PostgreSQL connection pool
    pub pg: PgPool,
}

impl Database {
    /// Connect to PostgreSQL
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        info!("Connecting to PostgreSQL: {}", config.postgres_url_masked());

        let pg = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.postgres_url())
            .await
            .map_err(|e| DbError::Connection(format!("PostgreSQL: {}", e)))?;

        info!("Connected to PostgreSQL");

        Ok(Self { pg })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> DbResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pg)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;
        info!("Migrations complete");
        Ok(())
    }

    /// Health check for the pool
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pg).await.is_ok()
    }

    /// Ledger store sharing this pool
    pub fn ledger_store(&self) -> PgLedgerStore {
        PgLedgerStore::new(self.pg.clone())
    }
}
