//! In-memory ledger store for tests
//!
//! All state sits behind one async mutex; holding it across a whole
//! `transfer` or `purchase` makes each of them a single atomic unit.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    DbCredentials, DbError, DbInventoryItem, DbResult, DbTransferEntry, LedgerStore,
    STARTING_BALANCE,
};

#[derive(Debug, Clone)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    coins: i64,
}

#[derive(Debug, Clone)]
struct TransferRow {
    from_user_id: i64,
    to_user_id: i64,
    amount: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    users: Vec<UserRow>,
    inventory: BTreeMap<(i64, String), i64>,
    transfers: Vec<TransferRow>,
}

impl State {
    fn user(&self, id: i64) -> DbResult<&UserRow> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| DbError::NotFound(format!("user {}", id)))
    }

    fn user_mut(&mut self, id: i64) -> DbResult<&mut UserRow> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DbError::NotFound(format!("user {}", id)))
    }

    fn username(&self, id: i64) -> String {
        self.user(id).map(|u| u.username.clone()).unwrap_or_default()
    }
}

/// [`LedgerStore`] kept entirely in process memory
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a user's balance
    pub async fn set_balance(&self, user_id: i64, coins: i64) -> DbResult<()> {
        let mut state = self.state.lock().await;
        state.user_mut(user_id)?.coins = coins;
        Ok(())
    }

    /// Number of transfer records across all users
    pub async fn transfer_count(&self) -> usize {
        self.state.lock().await.transfers.len()
    }

    /// Number of registered users
    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn find_credentials(&self, username: &str) -> DbResult<Option<DbCredentials>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| DbCredentials {
                id: u.id,
                password_hash: u.password_hash.clone(),
            }))
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> DbResult<i64> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|u| u.username == username) {
            return Err(DbError::Duplicate(format!("Username {} already exists", username)));
        }

        let id = state.users.last().map_or(1, |u| u.id + 1);
        state.users.push(UserRow {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            coins: STARTING_BALANCE,
        });

        Ok(id)
    }

    async fn balance(&self, user_id: i64) -> DbResult<i64> {
        let state = self.state.lock().await;
        Ok(state.user(user_id)?.coins)
    }

    async fn inventory(&self, user_id: i64) -> DbResult<Vec<DbInventoryItem>> {
        let state = self.state.lock().await;
        Ok(state
            .inventory
            .iter()
            .filter(|((owner, _), _)| *owner == user_id)
            .map(|((_, item), quantity)| DbInventoryItem {
                item: item.clone(),
                quantity: *quantity,
            })
            .collect())
    }

    async fn received_transfers(&self, user_id: i64) -> DbResult<Vec<DbTransferEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .transfers
            .iter()
            .filter(|t| t.to_user_id == user_id)
            .map(|t| DbTransferEntry {
                counterparty: state.username(t.from_user_id),
                amount: t.amount,
                created_at: t.created_at,
            })
            .collect())
    }

    async fn sent_transfers(&self, user_id: i64) -> DbResult<Vec<DbTransferEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .transfers
            .iter()
            .filter(|t| t.from_user_id == user_id)
            .map(|t| DbTransferEntry {
                counterparty: state.username(t.to_user_id),
                amount: t.amount,
                created_at: t.created_at,
            })
            .collect())
    }

    async fn transfer(&self, sender_id: i64, recipient: &str, amount: i64) -> DbResult<()> {
        let mut state = self.state.lock().await;

        let recipient_id = state
            .users
            .iter()
            .find(|u| u.username == recipient)
            .map(|u| u.id)
            .ok_or_else(|| DbError::UnknownRecipient(recipient.to_string()))?;

        let available = state.user(sender_id)?.coins;
        if available < amount {
            return Err(DbError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        state.user_mut(sender_id)?.coins -= amount;
        state.user_mut(recipient_id)?.coins += amount;
        state.transfers.push(TransferRow {
            from_user_id: sender_id,
            to_user_id: recipient_id,
            amount,
            created_at: Utc::now(),
        });

        Ok(())
    }

    async fn purchase(&self, user_id: i64, item: &str, price: i64) -> DbResult<()> {
        let mut state = self.state.lock().await;

        let available = state.user(user_id)?.coins;
        if available < price {
            return Err(DbError::InsufficientBalance {
                available,
                required: price,
            });
        }

        state.user_mut(user_id)?.coins -= price;
        *state
            .inventory
            .entry((user_id, item.to_string()))
            .or_insert(0) += 1;

        Ok(())
    }

    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_user_grants_starting_balance() {
        let store = InMemoryStore::new();
        let id = store.create_user("alice", "hash").await.unwrap();

        assert_eq!(store.balance(id).await.unwrap(), STARTING_BALANCE);
        let creds = store.find_credentials("alice").await.unwrap().unwrap();
        assert_eq!(creds.id, id);
        assert_eq!(creds.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_unknown_username_is_none() {
        let store = InMemoryStore::new();
        assert!(store.find_credentials("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let store = InMemoryStore::new();
        store.create_user("alice", "hash").await.unwrap();

        let result = store.create_user("alice", "other").await;
        assert!(matches!(result, Err(DbError::Duplicate(_))));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_transfer_to_unknown_recipient_changes_nothing() {
        let store = InMemoryStore::new();
        let alice = store.create_user("alice", "hash").await.unwrap();

        let result = store.transfer(alice, "ghost", 10).await;
        assert!(matches!(result, Err(DbError::UnknownRecipient(_))));
        assert_eq!(store.balance(alice).await.unwrap(), STARTING_BALANCE);
        assert_eq!(store.transfer_count().await, 0);
    }

    #[tokio::test]
    async fn test_history_is_oldest_first() {
        let store = InMemoryStore::new();
        let alice = store.create_user("alice", "hash").await.unwrap();
        store.create_user("bob", "hash").await.unwrap();
        store.create_user("carol", "hash").await.unwrap();

        store.transfer(alice, "bob", 10).await.unwrap();
        store.transfer(alice, "carol", 20).await.unwrap();

        let sent = store.sent_transfers(alice).await.unwrap();
        let parties: Vec<_> = sent.iter().map(|e| (e.counterparty.as_str(), e.amount)).collect();
        assert_eq!(parties, vec![("bob", 10), ("carol", 20)]);
    }

    #[tokio::test]
    async fn test_purchase_without_funds_keeps_inventory_empty() {
        let store = InMemoryStore::new();
        let id = store.create_user("alice", "hash").await.unwrap();
        store.set_balance(id, 5).await.unwrap();

        let result = store.purchase(id, "cup", 20).await;
        assert!(matches!(
            result,
            Err(DbError::InsufficientBalance {
                available: 5,
                required: 20
            })
        ));
        assert!(store.inventory(id).await.unwrap().is_empty());
        assert_eq!(store.balance(id).await.unwrap(), 5);
    }
}
