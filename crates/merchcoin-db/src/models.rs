//! Database row models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Coins granted to every user on registration
pub const STARTING_BALANCE: i64 = 1000;

/// Stored credentials for a username
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DbCredentials {
    pub id: i64,
    pub password_hash: String,
}

/// One inventory line: how many of `item` the user owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DbInventoryItem {
    pub item: String,
    pub quantity: i64,
}

/// A completed transfer seen from one side, with the other party's username
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DbTransferEntry {
    pub counterparty: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}
