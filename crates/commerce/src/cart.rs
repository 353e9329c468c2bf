//! Cart manager.
//!
//! Owns per-user cart lines and the write-time rule that a line's quantity
//! never exceeds the product's current stock. Nothing here reserves stock:
//! the checks are advisory, for honest UX, and the binding re-validation
//! happens inside [`OrderProcessor::create_order`].
//!
//! [`OrderProcessor::create_order`]: crate::orders::OrderProcessor::create_order

use tracing::{debug, instrument};

use chalkboard_core::{CartItemId, ProductId, UserId};

use crate::error::CommerceError;
use crate::models::CartItem;
use crate::store::{StorageEngine, TransactionScope};

/// Manager for per-user cart lines.
pub struct CartManager<'a, S: StorageEngine> {
    store: &'a S,
}

impl<'a, S: StorageEngine> CartManager<'a, S> {
    /// Create a new cart manager over the given storage engine.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Add `quantity` units of a product to the user's cart.
    ///
    /// If the user already holds a line for this product, the requested
    /// quantity is added to the held quantity and the combined total is
    /// checked against current stock; there is no silent clamping.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::Validation`] if `quantity` is not positive.
    /// - [`CommerceError::ProductNotFound`] if the product is missing or
    ///   inactive.
    /// - [`CommerceError::OutOfStock`] if the product has zero stock.
    /// - [`CommerceError::InsufficientStock`] if held + requested exceeds
    ///   stock, reporting both the held quantity and the available stock.
    /// - [`CommerceError::Storage`] if the storage engine fails.
    #[instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::Validation(
                "quantity must be a positive integer".to_owned(),
            ));
        }

        let mut scope = self.store.begin().await?;

        let product = scope
            .product(product_id)
            .await?
            .filter(|p| p.active)
            .ok_or(CommerceError::ProductNotFound { product_id })?;

        if product.stock <= 0 {
            return Err(CommerceError::OutOfStock { product_id });
        }

        let held = scope
            .cart_line(user_id, product_id)
            .await?
            .map_or(0, |line| line.quantity);

        let combined = held + quantity;
        if combined > product.stock {
            return Err(CommerceError::InsufficientStock {
                product_id,
                requested: quantity,
                in_cart: held,
                available: product.stock,
            });
        }

        let item = scope.upsert_cart_line(user_id, product_id, combined).await?;
        scope.commit().await?;

        debug!(cart_item_id = %item.id, quantity = item.quantity, "cart line upserted");
        Ok(item)
    }

    /// Overwrite a cart line's quantity.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::Validation`] if `quantity` is not positive.
    /// - [`CommerceError::CartItemNotFound`] if the line is gone.
    /// - [`CommerceError::ProductNotFound`] if its product no longer exists
    ///   or has been deactivated since the line was added.
    /// - [`CommerceError::InsufficientStock`] if `quantity` exceeds stock.
    /// - [`CommerceError::Storage`] if the storage engine fails.
    #[instrument(skip(self))]
    pub async fn update_cart_item(
        &self,
        cart_item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartItem, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::Validation(
                "quantity must be a positive integer".to_owned(),
            ));
        }

        let mut scope = self.store.begin().await?;

        let item = scope
            .cart_item(cart_item_id)
            .await?
            .ok_or(CommerceError::CartItemNotFound { cart_item_id })?;

        let product_id = item.product_id;
        let product = scope
            .product(product_id)
            .await?
            .filter(|p| p.active)
            .ok_or(CommerceError::ProductNotFound { product_id })?;

        if quantity > product.stock {
            return Err(CommerceError::InsufficientStock {
                product_id,
                requested: quantity,
                in_cart: item.quantity,
                available: product.stock,
            });
        }

        let updated = scope
            .set_cart_quantity(cart_item_id, quantity)
            .await?
            .ok_or(CommerceError::CartItemNotFound { cart_item_id })?;
        scope.commit().await?;

        Ok(updated)
    }

    /// Remove one cart line. Idempotent: removing a nonexistent line is not
    /// an error, the return value says whether a row was affected.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Storage`] if the storage engine fails.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, cart_item_id: CartItemId) -> Result<bool, CommerceError> {
        let mut scope = self.store.begin().await?;
        let removed = scope.delete_cart_item(cart_item_id).await?;
        scope.commit().await?;
        Ok(removed)
    }

    /// Remove all of the user's cart lines. Idempotent.
    ///
    /// The checkout caller invokes this after a successful order; a failure
    /// here never rolls back the order.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Storage`] if the storage engine fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: UserId) -> Result<bool, CommerceError> {
        let mut scope = self.store.begin().await?;
        let cleared = scope.clear_cart(user_id).await?;
        scope.commit().await?;
        Ok(cleared)
    }

    /// All cart lines for a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Storage`] if the storage engine fails.
    #[instrument(skip(self))]
    pub async fn cart(&self, user_id: UserId) -> Result<Vec<CartItem>, CommerceError> {
        let mut scope = self.store.begin().await?;
        Ok(scope.cart_items(user_id).await?)
    }
}
