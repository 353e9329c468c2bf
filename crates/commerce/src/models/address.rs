//! Shipping address domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chalkboard_core::{AddressId, UserId};

/// A user's shipping address (domain type).
///
/// At most one address per user carries `is_default = true`; once a user
/// has any address, exactly one does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    /// Unique address ID.
    pub id: AddressId,
    /// User who owns this address.
    pub user_id: UserId,
    /// Recipient full name.
    pub recipient: String,
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
    /// State or province.
    pub region: String,
    /// Postal code.
    pub postal_code: String,
    /// Country.
    pub country: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Whether this is the user's implicit shipping target.
    pub is_default: bool,
    /// When the address was created.
    pub created_at: DateTime<Utc>,
    /// When the address was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAddress {
    /// Recipient full name.
    pub recipient: String,
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
    /// State or province.
    pub region: String,
    /// Postal code.
    pub postal_code: String,
    /// Country.
    pub country: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Whether the caller asked for this address to become the default.
    /// Forced to true when it is the user's first address.
    #[serde(default)]
    pub is_default: bool,
}

/// Partial update for an address. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressPatch {
    pub recipient: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    /// Setting this to `Some(true)` clears the default flag on the owner's
    /// other addresses in the same transaction scope.
    pub is_default: Option<bool>,
}
