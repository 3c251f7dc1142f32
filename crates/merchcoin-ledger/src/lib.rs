//! merchcoin Ledger - coin accounts for a company merch shop
//!
//! Every user holds an integer coin balance. Coins move between users by
//! transfer and leave the system by buying catalog items.
//!
//! # Invariants
//!
//! 1. No negative balances
//! 2. Every transfer record matches exactly one debit and one credit of the
//!    same amount
//! 3. Inventory quantity equals the number of successful purchases of that item
//! 4. Transfers and purchases are atomic: the balance check and all writes
//!    commit together or not at all

pub mod catalog;
pub mod error;
pub mod service;
pub mod types;

pub use catalog::{Catalog, CatalogError};
pub use error::{LedgerError, LedgerResult};
pub use service::{LedgerService, DEFAULT_OPERATION_TIMEOUT};
pub use types::*;
