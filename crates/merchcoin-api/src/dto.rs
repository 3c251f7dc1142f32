//! Wire types
//!
//! Field names follow the public JSON contract (`toUser`, `coinHistory`, ...).

use merchcoin_ledger::AccountInfo;
use serde::{Deserialize, Serialize};

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCoinRequest {
    pub to_user: String,
    pub amount: i64,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub coins: i64,
    pub inventory: Vec<InventoryItem>,
    pub coin_history: CoinHistory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(rename = "type")]
    pub item_type: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinHistory {
    pub received: Vec<ReceivedEntry>,
    pub sent: Vec<SentEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedEntry {
    pub from_user: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentEntry {
    pub to_user: String,
    pub amount: i64,
}

impl From<AccountInfo> for InfoResponse {
    fn from(info: AccountInfo) -> Self {
        Self {
            coins: info.coins,
            inventory: info
                .inventory
                .into_iter()
                .map(|entry| InventoryItem {
                    item_type: entry.item,
                    quantity: entry.quantity,
                })
                .collect(),
            coin_history: CoinHistory {
                received: info
                    .received
                    .into_iter()
                    .map(|entry| ReceivedEntry {
                        from_user: entry.from_user,
                        amount: entry.amount,
                    })
                    .collect(),
                sent: info
                    .sent
                    .into_iter()
                    .map(|entry| SentEntry {
                        to_user: entry.to_user,
                        amount: entry.amount,
                    })
                    .collect(),
            },
        }
    }
}
