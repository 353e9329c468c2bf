//! Order processor: the critical path.
//!
//! `create_order` runs three passes inside one transaction scope: validate
//! stock for every line, persist the order header and its frozen line
//! items, then conditionally decrement stock per line. Any failure drops
//! the scope, so no partial order (header without items, items without a
//! decrement) is ever observable.
//!
//! The order total is recomputed here from the lines; a client-sent total
//! is never trusted. Unit prices come from the catalog collaborator and
//! are frozen into the order items as the price at time of purchase.

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use chalkboard_core::{OrderId, OrderStatus, UserId};

use crate::error::CommerceError;
use crate::models::{Order, OrderDetails, OrderLine};
use crate::store::{StorageEngine, TransactionScope};

/// Processor for order creation and lookup.
pub struct OrderProcessor<'a, S: StorageEngine> {
    store: &'a S,
}

impl<'a, S: StorageEngine> OrderProcessor<'a, S> {
    /// Create a new order processor over the given storage engine.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Atomically create an order from the given lines.
    ///
    /// On success the product stock has been decremented for every line and
    /// the persisted total equals the sum of line price × quantity. The
    /// caller is responsible for clearing the user's cart afterwards; a
    /// cart-clearing failure must not roll back a placed order, so this
    /// method never touches the cart.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::Validation`] if `lines` is empty or any quantity
    ///   is not positive.
    /// - [`CommerceError::ProductNotFound`] if a line's product is missing
    ///   or inactive.
    /// - [`CommerceError::InsufficientStock`] if a line's product cannot
    ///   cover the requested quantity, at validation time or at decrement
    ///   time (a concurrent order may have taken the stock in between).
    /// - [`CommerceError::Storage`] if the storage engine fails.
    ///
    /// Every failure aborts the whole operation; no write survives.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        lines: &[OrderLine],
    ) -> Result<OrderDetails, CommerceError> {
        if lines.is_empty() {
            return Err(CommerceError::Validation(
                "order must contain at least one line item".to_owned(),
            ));
        }
        if lines.iter().any(|line| line.quantity <= 0) {
            return Err(CommerceError::Validation(
                "line quantity must be a positive integer".to_owned(),
            ));
        }

        let mut scope = self.store.begin().await?;

        // Validation pass: every line must be satisfiable right now.
        for line in lines {
            let product_id = line.product_id;
            let product = scope
                .product(product_id)
                .await?
                .filter(|p| p.active)
                .ok_or(CommerceError::ProductNotFound { product_id })?;

            if product.stock < line.quantity {
                return Err(CommerceError::InsufficientStock {
                    product_id,
                    requested: line.quantity,
                    in_cart: 0,
                    available: product.stock,
                });
            }
        }

        // Commit pass: header with the recomputed total, then frozen lines.
        let total: Decimal = lines
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum();

        let order = scope
            .insert_order(user_id, total, OrderStatus::Pending)
            .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let item = scope
                .insert_order_item(order.id, line.product_id, line.quantity, line.unit_price)
                .await?;
            items.push(item);
        }

        // Decrement pass: the guarded decrement re-checks stock, so a
        // racing order on the same product either serializes behind this
        // scope or fails here instead of overselling.
        for line in lines {
            let product_id = line.product_id;
            if !scope.decrement_stock(product_id, line.quantity).await? {
                let available = scope
                    .product(product_id)
                    .await?
                    .map_or(0, |p| p.stock);
                warn!(%product_id, requested = line.quantity, available, "stock raced at decrement");
                return Err(CommerceError::InsufficientStock {
                    product_id,
                    requested: line.quantity,
                    in_cart: 0,
                    available,
                });
            }
        }

        scope.commit().await?;

        info!(order_id = %order.id, %total, "order created");
        Ok(OrderDetails { order, items })
    }

    /// Fetch an order with its line items.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::OrderNotFound`] if the order does not
    /// exist, or [`CommerceError::Storage`] if the storage engine fails.
    #[instrument(skip(self))]
    pub async fn order_details(&self, order_id: OrderId) -> Result<OrderDetails, CommerceError> {
        let mut scope = self.store.begin().await?;

        let order = scope
            .order(order_id)
            .await?
            .ok_or(CommerceError::OrderNotFound { order_id })?;
        let items = scope.order_items(order_id).await?;

        Ok(OrderDetails { order, items })
    }

    /// All orders placed by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Storage`] if the storage engine fails.
    #[instrument(skip(self))]
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, CommerceError> {
        let mut scope = self.store.begin().await?;
        Ok(scope.orders_for_user(user_id).await?)
    }
}
