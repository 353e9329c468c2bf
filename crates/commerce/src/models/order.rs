//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use chalkboard_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

/// A placed order (domain type).
///
/// Created once, atomically, and immutable afterwards except for `status`,
/// which the admin workflow owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// User who placed the order.
    pub user_id: UserId,
    /// Sum of line `unit_price` × `quantity`, recomputed server-side at
    /// creation time.
    pub total: Decimal,
    /// Lifecycle status; `pending` on creation.
    pub status: OrderStatus,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

/// An immutable order line: product, quantity, and the unit price frozen at
/// purchase time, independent of later catalog price changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique order item ID.
    pub id: OrderItemId,
    /// Order this line belongs to.
    pub order_id: OrderId,
    /// Product purchased.
    pub product_id: ProductId,
    /// Units purchased.
    pub quantity: i32,
    /// Price per unit at time of purchase.
    pub unit_price: Decimal,
}

/// A requested order line, supplied by the checkout caller.
///
/// The unit price comes from the catalog collaborator and is trusted at
/// order time; the order *total* is never taken from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// Product to purchase.
    pub product_id: ProductId,
    /// Units to purchase, always positive.
    pub quantity: i32,
    /// Catalog unit price to freeze into the order.
    pub unit_price: Decimal,
}

impl OrderLine {
    /// Build a line for `quantity` units of `product_id` at `unit_price`.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: i32, unit_price: Decimal) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }
}

/// An order together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetails {
    /// The order header.
    pub order: Order,
    /// The order's immutable line items.
    pub items: Vec<OrderItem>,
}
