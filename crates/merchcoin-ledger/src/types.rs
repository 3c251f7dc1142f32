use serde::{Deserialize, Serialize};

/// Account snapshot: balance, inventory and transfer history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub coins: i64,
    /// Ordered by item name
    pub inventory: Vec<InventoryEntry>,
    /// Oldest first
    pub received: Vec<ReceivedCoins>,
    /// Oldest first
    pub sent: Vec<SentCoins>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub item: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedCoins {
    pub from_user: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentCoins {
    pub to_user: String,
    pub amount: i64,
}
