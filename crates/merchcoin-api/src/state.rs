//! Application state shared across handlers

use std::sync::Arc;

use merchcoin_ledger::LedgerService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Ledger engine (owns the store, auth services and catalog)
    pub ledger: Arc<LedgerService>,
}

impl AppState {
    /// Create a new application state
    pub fn new(ledger: Arc<LedgerService>) -> Self {
        Self { ledger }
    }
}
