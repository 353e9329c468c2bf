//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use chalkboard_core::ProductId;

/// A sellable product (domain type).
///
/// The `stock` field is the single source of truth for "how many units are
/// sellable right now" and is never negative at any observable time. Only
/// the order processor (decrement) and catalog-admin operations write it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Catalog description.
    pub description: Option<String>,
    /// Unit price. Decimal to avoid floating-point error.
    pub price: Decimal,
    /// Sellable units on hand.
    pub stock: i32,
    /// Whether the product is visible and purchasable.
    pub active: bool,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product (catalog-admin seeding path).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    /// Display name.
    pub name: String,
    /// Catalog description.
    pub description: Option<String>,
    /// Unit price.
    pub price: Decimal,
    /// Initial stock on hand.
    pub stock: i32,
    /// Whether the product starts active. Defaults to true.
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl NewProduct {
    /// Convenience constructor for an active product.
    #[must_use]
    pub fn new(name: impl Into<String>, price: Decimal, stock: i32) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            stock,
            active: true,
        }
    }
}
