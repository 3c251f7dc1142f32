//! Merch catalog: item name to price, fixed for the life of the process

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Errors building a catalog from configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Catalog is empty")]
    Empty,

    #[error("Price of {item} must be positive, got {price}")]
    NonPositivePrice { item: String, price: i64 },

    #[error("Catalog item name must not be empty")]
    EmptyItemName,
}

/// Immutable item → price mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    prices: BTreeMap<String, i64>,
}

impl Catalog {
    /// The standard merchandise list
    pub fn default_merch() -> Self {
        let prices = [
            ("t-shirt", 80),
            ("cup", 20),
            ("book", 50),
            ("pen", 10),
            ("powerbank", 200),
            ("hoody", 300),
            ("umbrella", 200),
            ("socks", 10),
            ("wallet", 50),
            ("pink-hoody", 500),
        ]
        .into_iter()
        .map(|(item, price)| (item.to_string(), price))
        .collect();

        Self { prices }
    }

    /// Build a catalog from explicit prices
    pub fn new(prices: impl IntoIterator<Item = (String, i64)>) -> Result<Self, CatalogError> {
        let prices: BTreeMap<String, i64> = prices.into_iter().collect();

        if prices.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (item, price) in &prices {
            if item.is_empty() {
                return Err(CatalogError::EmptyItemName);
            }
            if *price <= 0 {
                return Err(CatalogError::NonPositivePrice {
                    item: item.clone(),
                    price: *price,
                });
            }
        }

        Ok(Self { prices })
    }

    pub fn price(&self, item: &str) -> Option<i64> {
        self.prices.get(item).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Items in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.prices.iter().map(|(item, price)| (item.as_str(), *price))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::default_merch()
    }
}
