//! Product ledger: stock reads and catalog-admin seeding.
//!
//! The ledger is the read/write accessor for `product.stock`, the single
//! source of truth for sellable units. The only decrement path is the
//! order processor's transaction scope
//! ([`TransactionScope::decrement_stock`]); no increment is exposed here
//! (restocking is a catalog-admin concern outside this core).
//!
//! [`TransactionScope::decrement_stock`]: crate::store::TransactionScope::decrement_stock

use tracing::instrument;

use chalkboard_core::ProductId;

use crate::error::CommerceError;
use crate::models::{NewProduct, Product};
use crate::store::{StorageEngine, TransactionScope};

/// Accessor for product stock.
pub struct ProductLedger<'a, S: StorageEngine> {
    store: &'a S,
}

impl<'a, S: StorageEngine> ProductLedger<'a, S> {
    /// Create a new ledger over the given storage engine.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Current sellable units of a product.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::ProductNotFound`] if the product does not
    /// exist, or [`CommerceError::Storage`] if the storage engine fails.
    #[instrument(skip(self))]
    pub async fn stock(&self, product_id: ProductId) -> Result<i32, CommerceError> {
        let mut scope = self.store.begin().await?;
        let product = scope
            .product(product_id)
            .await?
            .ok_or(CommerceError::ProductNotFound { product_id })?;
        Ok(product.stock)
    }

    /// Fetch a product by ID.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::ProductNotFound`] if the product does not
    /// exist, or [`CommerceError::Storage`] if the storage engine fails.
    #[instrument(skip(self))]
    pub async fn product(&self, product_id: ProductId) -> Result<Product, CommerceError> {
        let mut scope = self.store.begin().await?;
        scope
            .product(product_id)
            .await?
            .ok_or(CommerceError::ProductNotFound { product_id })
    }

    /// Create a product (catalog-admin seeding path).
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Validation`] for a negative price or stock,
    /// or [`CommerceError::Storage`] if the storage engine fails.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &NewProduct) -> Result<Product, CommerceError> {
        if input.stock < 0 {
            return Err(CommerceError::Validation(
                "product stock cannot be negative".to_owned(),
            ));
        }
        if input.price.is_sign_negative() {
            return Err(CommerceError::Validation(
                "product price cannot be negative".to_owned(),
            ));
        }

        let mut scope = self.store.begin().await?;
        let product = scope.insert_product(input).await?;
        scope.commit().await?;

        tracing::info!(product_id = %product.id, stock = product.stock, "product created");
        Ok(product)
    }
}
