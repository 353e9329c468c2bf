//! Typed errors for the transaction core.
//!
//! Failures are carried as structured values end-to-end so the HTTP layer
//! can map them to status codes without parsing message strings. Stock
//! failures report actionable quantities (requested, already in cart,
//! available) wherever the information exists.

use thiserror::Error;

use chalkboard_core::{AddressId, CartItemId, OrderId, ProductId};

/// Storage-layer error, independent of domain semantics.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Domain error returned by the cart, address, and order managers.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// Referenced product does not exist (or is no longer active).
    #[error("product {product_id} not found")]
    ProductNotFound {
        /// The product that failed to resolve.
        product_id: ProductId,
    },

    /// Referenced cart item does not exist.
    #[error("cart item {cart_item_id} not found")]
    CartItemNotFound {
        /// The cart item that failed to resolve.
        cart_item_id: CartItemId,
    },

    /// Referenced address does not exist.
    #[error("address {address_id} not found")]
    AddressNotFound {
        /// The address that failed to resolve.
        address_id: AddressId,
    },

    /// Referenced order does not exist.
    #[error("order {order_id} not found")]
    OrderNotFound {
        /// The order that failed to resolve.
        order_id: OrderId,
    },

    /// The product has zero sellable units.
    #[error("product {product_id} is out of stock")]
    OutOfStock {
        /// The product with no stock.
        product_id: ProductId,
    },

    /// Requested quantity exceeds the sellable stock.
    #[error(
        "insufficient stock for product {product_id}: \
         requested {requested}, {in_cart} already in cart, {available} available"
    )]
    InsufficientStock {
        /// The product that cannot satisfy the request.
        product_id: ProductId,
        /// Units requested by this call.
        requested: i32,
        /// Units the caller already holds in their cart (0 outside cart paths).
        in_cart: i32,
        /// Units currently sellable.
        available: i32,
    },

    /// Caller-supplied input violated a shape or range constraint.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The storage engine failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Flat error classification for protocol mapping.
///
/// The HTTP collaborator matches on this instead of inspecting messages:
/// `NotFound` -> 404, `OutOfStock`/`InsufficientStock` -> 409,
/// `Validation` -> 400, `Storage` -> 500.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    OutOfStock,
    InsufficientStock,
    Validation,
    Storage,
}

impl CommerceError {
    /// Classify this error for protocol mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ProductNotFound { .. }
            | Self::CartItemNotFound { .. }
            | Self::AddressNotFound { .. }
            | Self::OrderNotFound { .. } => ErrorKind::NotFound,
            Self::OutOfStock { .. } => ErrorKind::OutOfStock,
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_reports_quantities() {
        let err = CommerceError::InsufficientStock {
            product_id: ProductId::new(9),
            requested: 1,
            in_cart: 2,
            available: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("requested 1"));
        assert!(msg.contains("2 already in cart"));
        assert!(msg.contains("2 available"));
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            CommerceError::ProductNotFound {
                product_id: ProductId::new(1)
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CommerceError::OutOfStock {
                product_id: ProductId::new(1)
            }
            .kind(),
            ErrorKind::OutOfStock
        );
        assert_eq!(
            CommerceError::Validation("quantity must be positive".into()).kind(),
            ErrorKind::Validation
        );
    }
}
