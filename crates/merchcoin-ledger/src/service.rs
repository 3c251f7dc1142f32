//! Ledger engine
//!
//! Business rules sit here; atomicity is delegated to the store. Every store
//! call runs under the operation deadline. On expiry the store future is
//! dropped, which rolls back any transaction it had open.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use merchcoin_auth::{AuthError, AuthService, IdentityClaim};
use merchcoin_db::{DbCredentials, DbError, DbResult, LedgerStore};
use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::error::{LedgerError, LedgerResult};
use crate::types::{AccountInfo, InventoryEntry, ReceivedCoins, SentCoins};

/// Default bound on a single store operation
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// The coin ledger: authentication, account info, transfers and purchases
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    auth: AuthService,
    catalog: Arc<Catalog>,
    op_timeout: Duration,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>, auth: AuthService, catalog: Arc<Catalog>) -> Self {
        Self {
            store,
            auth,
            catalog,
            op_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Override the per-operation store deadline
    pub fn with_operation_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = DbResult<T>>,
    ) -> LedgerResult<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                let err = LedgerError::from(e);
                if let LedgerError::Storage(ref inner) = err {
                    error!(operation, error = %inner, "Store operation failed");
                }
                Err(err)
            }
            Err(_) => {
                error!(
                    operation,
                    timeout_ms = self.op_timeout.as_millis() as u64,
                    "Store operation timed out"
                );
                Err(LedgerError::Timeout)
            }
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange credentials for a token, registering the user on first use.
    pub async fn authenticate(&self, username: &str, password: &str) -> LedgerResult<String> {
        let found = self
            .bounded("find_credentials", self.store.find_credentials(username))
            .await?;

        let user_id = match found {
            Some(credentials) => self.check_password(username, password, credentials).await?,
            None => self.register(username, password).await?,
        };

        Ok(self.auth.jwt.issue(user_id, username)?)
    }

    async fn register(&self, username: &str, password: &str) -> LedgerResult<i64> {
        let hash = self.hash_password(password).await?;

        match self
            .bounded("create_user", self.store.create_user(username, &hash))
            .await
        {
            Ok(user_id) => {
                info!(user_id, username, "Registered new user");
                Ok(user_id)
            }
            Err(LedgerError::Storage(DbError::Duplicate(_))) => {
                // A concurrent first login for the same name won the insert
                let credentials = self
                    .bounded("find_credentials", self.store.find_credentials(username))
                    .await?
                    .ok_or_else(|| {
                        LedgerError::Storage(DbError::NotFound(format!("user {}", username)))
                    })?;
                self.check_password(username, password, credentials).await
            }
            Err(e) => Err(e),
        }
    }

    async fn check_password(
        &self,
        username: &str,
        password: &str,
        credentials: DbCredentials,
    ) -> LedgerResult<i64> {
        let passwords = self.auth.password.clone();
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || {
            passwords.verify_password(&password, &credentials.password_hash)
        })
        .await
        .map_err(|e| AuthError::Internal(format!("password verification task failed: {}", e)))?;

        if matches {
            Ok(credentials.id)
        } else {
            warn!(username, "Rejected credentials");
            Err(LedgerError::InvalidCredentials)
        }
    }

    async fn hash_password(&self, password: &str) -> LedgerResult<String> {
        let passwords = self.auth.password.clone();
        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || passwords.hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("password hashing task failed: {}", e)))??;
        Ok(hash)
    }

    // =========================================================================
    // Read side
    // =========================================================================

    /// Balance, inventory and transfer history, read concurrently
    pub async fn account_info(&self, user_id: i64) -> LedgerResult<AccountInfo> {
        let (coins, inventory, received, sent) = tokio::try_join!(
            self.bounded("balance", self.store.balance(user_id)),
            self.bounded("inventory", self.store.inventory(user_id)),
            self.bounded("received_transfers", self.store.received_transfers(user_id)),
            self.bounded("sent_transfers", self.store.sent_transfers(user_id)),
        )?;

        Ok(AccountInfo {
            coins,
            inventory: inventory
                .into_iter()
                .map(|line| InventoryEntry {
                    item: line.item,
                    quantity: line.quantity,
                })
                .collect(),
            received: received
                .into_iter()
                .map(|entry| ReceivedCoins {
                    from_user: entry.counterparty,
                    amount: entry.amount,
                })
                .collect(),
            sent: sent
                .into_iter()
                .map(|entry| SentCoins {
                    to_user: entry.counterparty,
                    amount: entry.amount,
                })
                .collect(),
        })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Send coins from the authenticated user to another user by name
    pub async fn transfer(
        &self,
        sender: &IdentityClaim,
        recipient: &str,
        amount: i64,
    ) -> LedgerResult<()> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if recipient.is_empty() || recipient == sender.username {
            return Err(LedgerError::InvalidRecipient);
        }

        self.bounded("transfer", self.store.transfer(sender.user_id, recipient, amount))
            .await?;

        info!(user_id = sender.user_id, to_user = recipient, amount, "Coins transferred");
        Ok(())
    }

    /// Buy one unit of a catalog item
    pub async fn purchase(&self, user_id: i64, item: &str) -> LedgerResult<()> {
        let price = self
            .catalog
            .price(item)
            .ok_or_else(|| LedgerError::ItemNotFound(item.to_string()))?;

        self.bounded("purchase", self.store.purchase(user_id, item, price))
            .await?;

        info!(user_id, item, price, "Item purchased");
        Ok(())
    }

    /// Store liveness
    pub async fn ping(&self) -> LedgerResult<()> {
        self.bounded("ping", self.store.ping()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use merchcoin_auth::{AuthConfig, PasswordConfig};
    use merchcoin_db::{DbInventoryItem, DbTransferEntry, InMemoryStore, STARTING_BALANCE};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn auth() -> AuthService {
        let mut config = AuthConfig::default();
        config.jwt.secret = "ledger-test-secret".to_string();
        config.password = PasswordConfig {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            pepper: None,
        };
        AuthService::new(config)
    }

    fn ledger(store: Arc<dyn LedgerStore>) -> LedgerService {
        LedgerService::new(store, auth(), Arc::new(Catalog::default_merch()))
    }

    fn claim(user_id: i64, username: &str) -> IdentityClaim {
        IdentityClaim {
            user_id,
            username: username.to_string(),
            iat: 0,
            exp: 0,
        }
    }

    async fn login(ledger: &LedgerService, username: &str) -> IdentityClaim {
        let token = ledger.authenticate(username, "pw").await.unwrap();
        ledger.auth().jwt.verify(&token).unwrap()
    }

    /// Store that fails every call and counts how often it was asked
    #[derive(Default)]
    struct FailingStore {
        calls: AtomicUsize,
    }

    impl FailingStore {
        fn fail<T>(&self) -> DbResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DbError::Connection("store offline".to_string()))
        }
    }

    #[async_trait]
    impl LedgerStore for FailingStore {
        async fn find_credentials(&self, _: &str) -> DbResult<Option<DbCredentials>> {
            self.fail()
        }
        async fn create_user(&self, _: &str, _: &str) -> DbResult<i64> {
            self.fail()
        }
        async fn balance(&self, _: i64) -> DbResult<i64> {
            self.fail()
        }
        async fn inventory(&self, _: i64) -> DbResult<Vec<DbInventoryItem>> {
            self.fail()
        }
        async fn received_transfers(&self, _: i64) -> DbResult<Vec<DbTransferEntry>> {
            self.fail()
        }
        async fn sent_transfers(&self, _: i64) -> DbResult<Vec<DbTransferEntry>> {
            self.fail()
        }
        async fn transfer(&self, _: i64, _: &str, _: i64) -> DbResult<()> {
            self.fail()
        }
        async fn purchase(&self, _: i64, _: &str, _: i64) -> DbResult<()> {
            self.fail()
        }
        async fn ping(&self) -> DbResult<()> {
            self.fail()
        }
    }

    /// Store that wraps an in-memory store and stalls before every mutation
    struct StallingStore {
        inner: InMemoryStore,
        stall: Duration,
    }

    #[async_trait]
    impl LedgerStore for StallingStore {
        async fn find_credentials(&self, username: &str) -> DbResult<Option<DbCredentials>> {
            self.inner.find_credentials(username).await
        }
        async fn create_user(&self, username: &str, hash: &str) -> DbResult<i64> {
            self.inner.create_user(username, hash).await
        }
        async fn balance(&self, user_id: i64) -> DbResult<i64> {
            self.inner.balance(user_id).await
        }
        async fn inventory(&self, user_id: i64) -> DbResult<Vec<DbInventoryItem>> {
            self.inner.inventory(user_id).await
        }
        async fn received_transfers(&self, user_id: i64) -> DbResult<Vec<DbTransferEntry>> {
            self.inner.received_transfers(user_id).await
        }
        async fn sent_transfers(&self, user_id: i64) -> DbResult<Vec<DbTransferEntry>> {
            self.inner.sent_transfers(user_id).await
        }
        async fn transfer(&self, sender_id: i64, recipient: &str, amount: i64) -> DbResult<()> {
            tokio::time::sleep(self.stall).await;
            self.inner.transfer(sender_id, recipient, amount).await
        }
        async fn purchase(&self, user_id: i64, item: &str, price: i64) -> DbResult<()> {
            tokio::time::sleep(self.stall).await;
            self.inner.purchase(user_id, item, price).await
        }
        async fn ping(&self) -> DbResult<()> {
            self.inner.ping().await
        }
    }

    #[tokio::test]
    async fn test_first_login_registers_with_starting_balance() {
        let store = InMemoryStore::new();
        let ledger = ledger(Arc::new(store.clone()));

        let token = ledger.authenticate("alice", "pw").await.unwrap();
        let claims = ledger.auth().jwt.verify(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(store.user_count().await, 1);

        let info = ledger.account_info(claims.user_id).await.unwrap();
        assert_eq!(info.coins, STARTING_BALANCE);
        assert_eq!(info.coins, 1000);
        assert!(info.inventory.is_empty());
        assert!(info.received.is_empty());
        assert!(info.sent.is_empty());
    }

    #[tokio::test]
    async fn test_second_login_reuses_account() {
        let store = InMemoryStore::new();
        let ledger = ledger(Arc::new(store.clone()));

        let first = login(&ledger, "alice").await;
        let second = login(&ledger, "alice").await;
        assert_eq!(first.user_id, second.user_id);
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let ledger = ledger(Arc::new(InMemoryStore::new()));
        ledger.authenticate("alice", "right").await.unwrap();

        let result = ledger.authenticate("alice", "wrong").await;
        assert!(matches!(result, Err(LedgerError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_lookup_failure_never_registers() {
        let store = Arc::new(FailingStore::default());
        let ledger = ledger(store.clone());

        let result = ledger.authenticate("alice", "pw").await;
        assert!(matches!(result, Err(LedgerError::Storage(_))));
        // Only the lookup was attempted; no insert followed
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_alice_bob_scenario() {
        let ledger = ledger(Arc::new(InMemoryStore::new()));
        let alice = login(&ledger, "alice").await;
        let bob = login(&ledger, "bob").await;

        ledger.purchase(alice.user_id, "t-shirt").await.unwrap();
        assert_eq!(ledger.account_info(alice.user_id).await.unwrap().coins, 920);

        ledger.transfer(&alice, "bob", 50).await.unwrap();

        let alice_info = ledger.account_info(alice.user_id).await.unwrap();
        assert_eq!(alice_info.coins, 870);
        assert_eq!(
            alice_info.inventory,
            vec![InventoryEntry {
                item: "t-shirt".to_string(),
                quantity: 1
            }]
        );
        assert_eq!(
            alice_info.sent,
            vec![SentCoins {
                to_user: "bob".to_string(),
                amount: 50
            }]
        );
        assert!(alice_info.received.is_empty());

        let bob_info = ledger.account_info(bob.user_id).await.unwrap();
        assert_eq!(bob_info.coins, 1050);
        assert_eq!(
            bob_info.received,
            vec![ReceivedCoins {
                from_user: "alice".to_string(),
                amount: 50
            }]
        );
        assert!(bob_info.sent.is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_funds_changes_nothing() {
        let store = InMemoryStore::new();
        let ledger = ledger(Arc::new(store.clone()));
        let alice = login(&ledger, "alice").await;
        let bob = login(&ledger, "bob").await;

        let result = ledger.transfer(&alice, "bob", 1001).await;
        assert!(matches!(result, Err(LedgerError::InsufficientFunds)));

        assert_eq!(ledger.account_info(alice.user_id).await.unwrap().coins, 1000);
        assert_eq!(ledger.account_info(bob.user_id).await.unwrap().coins, 1000);
        assert_eq!(store.transfer_count().await, 0);
    }

    #[tokio::test]
    async fn test_non_positive_amount_never_touches_store() {
        let store = Arc::new(FailingStore::default());
        let ledger = ledger(store.clone());
        let alice = claim(1, "alice");

        assert!(matches!(
            ledger.transfer(&alice, "bob", 0).await,
            Err(LedgerError::InvalidAmount)
        ));
        assert!(matches!(
            ledger.transfer(&alice, "bob", -5).await,
            Err(LedgerError::InvalidAmount)
        ));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_self_transfer_rejected() {
        let store = Arc::new(FailingStore::default());
        let ledger = ledger(store.clone());
        let alice = claim(1, "alice");

        assert!(matches!(
            ledger.transfer(&alice, "alice", 10).await,
            Err(LedgerError::InvalidRecipient)
        ));
        assert!(matches!(
            ledger.transfer(&alice, "", 10).await,
            Err(LedgerError::InvalidRecipient)
        ));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_recipient() {
        let ledger = ledger(Arc::new(InMemoryStore::new()));
        let alice = login(&ledger, "alice").await;

        let result = ledger.transfer(&alice, "nobody", 10).await;
        assert!(matches!(result, Err(LedgerError::RecipientNotFound(name)) if name == "nobody"));
        assert_eq!(ledger.account_info(alice.user_id).await.unwrap().coins, 1000);
    }

    #[tokio::test]
    async fn test_buying_twice_accumulates_quantity() {
        let ledger = ledger(Arc::new(InMemoryStore::new()));
        let alice = login(&ledger, "alice").await;

        ledger.purchase(alice.user_id, "cup").await.unwrap();
        ledger.purchase(alice.user_id, "cup").await.unwrap();

        let info = ledger.account_info(alice.user_id).await.unwrap();
        assert_eq!(info.coins, 960);
        assert_eq!(
            info.inventory,
            vec![InventoryEntry {
                item: "cup".to_string(),
                quantity: 2
            }]
        );
    }

    #[tokio::test]
    async fn test_unknown_item() {
        let ledger = ledger(Arc::new(InMemoryStore::new()));
        let alice = login(&ledger, "alice").await;

        let result = ledger.purchase(alice.user_id, "yacht").await;
        assert!(matches!(result, Err(LedgerError::ItemNotFound(_))));
        assert_eq!(ledger.account_info(alice.user_id).await.unwrap().coins, 1000);
    }

    #[tokio::test]
    async fn test_purchase_insufficient_funds() {
        let store = InMemoryStore::new();
        let ledger = ledger(Arc::new(store.clone()));
        let alice = login(&ledger, "alice").await;
        store.set_balance(alice.user_id, 5).await.unwrap();

        let result = ledger.purchase(alice.user_id, "pen").await;
        assert!(matches!(result, Err(LedgerError::InsufficientFunds)));

        let info = ledger.account_info(alice.user_id).await.unwrap();
        assert_eq!(info.coins, 5);
        assert!(info.inventory.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_transfers_never_overdraw() {
        let store = InMemoryStore::new();
        let ledger = ledger(Arc::new(store.clone()));
        let alice = login(&ledger, "alice").await;
        login(&ledger, "bob").await;
        login(&ledger, "carol").await;

        let first = {
            let ledger = ledger.clone();
            let alice = alice.clone();
            tokio::spawn(async move { ledger.transfer(&alice, "bob", 600).await })
        };
        let second = {
            let ledger = ledger.clone();
            let alice = alice.clone();
            tokio::spawn(async move { ledger.transfer(&alice, "carol", 600).await })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let overdrawn = results
            .iter()
            .filter(|r| matches!(r, Err(LedgerError::InsufficientFunds)))
            .count();

        assert_eq!(succeeded, 1);
        assert_eq!(overdrawn, 1);
        assert_eq!(ledger.account_info(alice.user_id).await.unwrap().coins, 400);
        assert_eq!(store.transfer_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_store_times_out() {
        let inner = InMemoryStore::new();
        let store = StallingStore {
            inner: inner.clone(),
            stall: Duration::from_secs(30),
        };
        let ledger = ledger(Arc::new(store)).with_operation_timeout(Duration::from_secs(1));
        let alice = login(&ledger, "alice").await;

        let result = ledger.purchase(alice.user_id, "pen").await;
        assert!(matches!(result, Err(LedgerError::Timeout)));
        assert_eq!(result.unwrap_err().status_code(), 504);

        // The abandoned purchase left nothing behind
        assert_eq!(inner.balance(alice.user_id).await.unwrap(), 1000);
        assert!(inner.inventory(alice.user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ping_reports_storage_failure() {
        let ledger = ledger(Arc::new(FailingStore::default()));
        assert!(matches!(ledger.ping().await, Err(LedgerError::Storage(_))));
    }
}
