//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chalkboard_core::{CartItemId, ProductId, UserId};

/// A cart line: one (user, product) pairing with a desired quantity.
///
/// Adding to a cart reserves nothing; the stock check at cart time is
/// advisory and re-validated at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Unique cart item ID.
    pub id: CartItemId,
    /// User who owns the cart.
    pub user_id: UserId,
    /// Product placed in the cart.
    pub product_id: ProductId,
    /// Desired quantity, always positive.
    pub quantity: i32,
    /// When the line was first added.
    pub created_at: DateTime<Utc>,
    /// When the line was last changed.
    pub updated_at: DateTime<Utc>,
}
