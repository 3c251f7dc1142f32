//! PostgreSQL ledger store
//!
//! Balance mutations lock the affected `users` rows with `FOR UPDATE` before
//! reading balances, so the check and the writes that follow it see the same
//! value. An early return drops the open transaction, which rolls it back.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    DbCredentials, DbError, DbInventoryItem, DbResult, DbTransferEntry, LedgerStore,
    STARTING_BALANCE,
};

/// [`LedgerStore`] backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn find_credentials(&self, username: &str) -> DbResult<Option<DbCredentials>> {
        let credentials = sqlx::query_as::<_, DbCredentials>(
            "SELECT id, password AS password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credentials)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> DbResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (username, password, coins) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(username)
        .bind(password_hash)
        .bind(STARTING_BALANCE)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("users_username_key") {
                    return DbError::Duplicate(format!("Username {} already exists", username));
                }
            }
            DbError::Query(e)
        })?;

        Ok(id)
    }

    async fn balance(&self, user_id: i64) -> DbResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT coins FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("user {}", user_id)))
    }

    async fn inventory(&self, user_id: i64) -> DbResult<Vec<DbInventoryItem>> {
        let items = sqlx::query_as::<_, DbInventoryItem>(
            "SELECT item, quantity FROM user_inventory WHERE user_id = $1 ORDER BY item",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn received_transfers(&self, user_id: i64) -> DbResult<Vec<DbTransferEntry>> {
        let entries = sqlx::query_as::<_, DbTransferEntry>(
            r#"
            SELECT u.username AS counterparty, ct.amount, ct.created_at
            FROM coin_transactions ct
            JOIN users u ON ct.from_user_id = u.id
            WHERE ct.to_user_id = $1
            ORDER BY ct.created_at, ct.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn sent_transfers(&self, user_id: i64) -> DbResult<Vec<DbTransferEntry>> {
        let entries = sqlx::query_as::<_, DbTransferEntry>(
            r#"
            SELECT u.username AS counterparty, ct.amount, ct.created_at
            FROM coin_transactions ct
            JOIN users u ON ct.to_user_id = u.id
            WHERE ct.from_user_id = $1
            ORDER BY ct.created_at, ct.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn transfer(&self, sender_id: i64, recipient: &str, amount: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let recipient_id = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = $1")
            .bind(recipient)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::UnknownRecipient(recipient.to_string()))?;

        // Lock both rows in id order so opposite-direction transfers between
        // the same pair cannot deadlock.
        let locked = sqlx::query_as::<_, (i64, i64)>(
            "SELECT id, coins FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(vec![sender_id, recipient_id])
        .fetch_all(&mut *tx)
        .await?;

        let available = locked
            .iter()
            .find(|(id, _)| *id == sender_id)
            .map(|(_, coins)| *coins)
            .ok_or_else(|| DbError::NotFound(format!("user {}", sender_id)))?;

        if available < amount {
            return Err(DbError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        sqlx::query("UPDATE users SET coins = coins - $1 WHERE id = $2")
            .bind(amount)
            .bind(sender_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET coins = coins + $1 WHERE id = $2")
            .bind(amount)
            .bind(recipient_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO coin_transactions (from_user_id, to_user_id, amount) VALUES ($1, $2, $3)",
        )
        .bind(sender_id)
        .bind(recipient_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn purchase(&self, user_id: i64, item: &str, price: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let available =
            sqlx::query_scalar::<_, i64>("SELECT coins FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::NotFound(format!("user {}", user_id)))?;

        if available < price {
            return Err(DbError::InsufficientBalance {
                available,
                required: price,
            });
        }

        sqlx::query("UPDATE users SET coins = coins - $1 WHERE id = $2")
            .bind(price)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO user_inventory (user_id, item, quantity)
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id, item)
            DO UPDATE SET quantity = user_inventory.quantity + 1
            "#,
        )
        .bind(user_id)
        .bind(item)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
