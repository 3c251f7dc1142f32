//! Ledger store capability
//!
//! The operations the ledger engine needs from persistence. Balance-mutating
//! operations (`transfer`, `purchase`) are atomic units: the balance check and
//! every write happen inside one store transaction, and nothing is visible
//! unless all of it commits.

use async_trait::async_trait;

use crate::{DbCredentials, DbInventoryItem, DbResult, DbTransferEntry};

/// Persistence operations backing the coin ledger
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Look up id and password hash by username.
    ///
    /// `Ok(None)` means the username is unknown; `Err` means the lookup itself
    /// failed and says nothing about whether the user exists.
    async fn find_credentials(&self, username: &str) -> DbResult<Option<DbCredentials>>;

    /// Insert a user with [`crate::STARTING_BALANCE`] coins and return its id.
    ///
    /// Fails with [`crate::DbError::Duplicate`] if the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> DbResult<i64>;

    /// Current coin balance
    async fn balance(&self, user_id: i64) -> DbResult<i64>;

    /// Inventory lines ordered by item name
    async fn inventory(&self, user_id: i64) -> DbResult<Vec<DbInventoryItem>>;

    /// Transfers received by the user, oldest first; counterparty is the sender
    async fn received_transfers(&self, user_id: i64) -> DbResult<Vec<DbTransferEntry>>;

    /// Transfers sent by the user, oldest first; counterparty is the recipient
    async fn sent_transfers(&self, user_id: i64) -> DbResult<Vec<DbTransferEntry>>;

    /// Move `amount` coins from `sender_id` to the user named `recipient` and
    /// record the transfer.
    ///
    /// Fails with [`crate::DbError::UnknownRecipient`] or
    /// [`crate::DbError::InsufficientBalance`] without changing any state.
    async fn transfer(&self, sender_id: i64, recipient: &str, amount: i64) -> DbResult<()>;

    /// Charge `price` coins and add one `item` to the user's inventory.
    ///
    /// Fails with [`crate::DbError::InsufficientBalance`] without changing any
    /// state.
    async fn purchase(&self, user_id: i64, item: &str, price: i64) -> DbResult<()>;

    /// Cheap liveness probe
    async fn ping(&self) -> DbResult<()>;
}
