//! Storage engine abstraction.
//!
//! All persistence flows through [`StorageEngine`], an explicitly injected
//! handle (no ambient global) that hands out [`TransactionScope`] values.
//! A scope is an all-or-nothing execution boundary: writes made through it
//! become visible as a unit on [`TransactionScope::commit`] and are rolled
//! back when the scope is dropped without committing. Managers pass one
//! scope by reference through every write sequence that touches more than
//! one row.
//!
//! Two backends implement the traits:
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx; a scope wraps a real database
//!   transaction, and dropping a `sqlx::Transaction` rolls it back.
//! - [`MemoryStore`] - in-process tables behind an exclusive async lock,
//!   with a snapshot restored on drop; used as the test double.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use rust_decimal::Decimal;

use chalkboard_core::{AddressId, CartItemId, OrderId, OrderStatus, ProductId, UserId};

use crate::error::StoreError;
use crate::models::{
    Address, AddressPatch, CartItem, NewAddress, NewProduct, Order, OrderItem, Product,
};

/// A handle to the storage engine, injected into each manager's constructor.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// The transaction scope type this engine produces.
    type Scope: TransactionScope;

    /// Open a new transaction scope.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the transaction cannot be started.
    async fn begin(&self) -> Result<Self::Scope, StoreError>;
}

/// Row-level operations executed inside one all-or-nothing boundary.
///
/// Every method sees the writes made earlier through the same scope. All
/// methods return [`StoreError`] for infrastructure failures only; domain
/// outcomes ("row missing", "stock too low") are conveyed through `Option`
/// and `bool` returns and turned into typed errors by the managers.
#[async_trait]
pub trait TransactionScope: Send {
    // ------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------

    /// Fetch a product by ID.
    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Insert a product (catalog-admin seeding path).
    async fn insert_product(&mut self, input: &NewProduct) -> Result<Product, StoreError>;

    /// Conditionally decrement a product's stock by `amount`.
    ///
    /// The decrement only applies when the current stock covers `amount`
    /// (`stock = stock - amount` guarded by `stock >= amount`), re-checking
    /// availability at decrement time. Returns `false` when the guard fails
    /// or the product does not exist; no write happens in that case.
    async fn decrement_stock(&mut self, id: ProductId, amount: i32) -> Result<bool, StoreError>;

    // ------------------------------------------------------------------
    // Cart
    // ------------------------------------------------------------------

    /// Fetch a cart item by ID.
    async fn cart_item(&mut self, id: CartItemId) -> Result<Option<CartItem>, StoreError>;

    /// Fetch the cart line for a (user, product) pair, if any.
    async fn cart_line(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, StoreError>;

    /// All cart lines for a user, oldest first.
    async fn cart_items(&mut self, user_id: UserId) -> Result<Vec<CartItem>, StoreError>;

    /// Insert the cart line for (user, product), or overwrite its quantity
    /// with `quantity` if it already exists.
    async fn upsert_cart_line(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, StoreError>;

    /// Overwrite a cart item's quantity. Returns `None` if the item is gone.
    async fn set_cart_quantity(
        &mut self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<Option<CartItem>, StoreError>;

    /// Delete a cart item. Returns whether a row was affected.
    async fn delete_cart_item(&mut self, id: CartItemId) -> Result<bool, StoreError>;

    /// Delete all of a user's cart lines. Returns whether any row was affected.
    async fn clear_cart(&mut self, user_id: UserId) -> Result<bool, StoreError>;

    // ------------------------------------------------------------------
    // Addresses
    // ------------------------------------------------------------------

    /// Fetch an address by ID.
    async fn address(&mut self, id: AddressId) -> Result<Option<Address>, StoreError>;

    /// All addresses for a user, oldest first.
    async fn addresses(&mut self, user_id: UserId) -> Result<Vec<Address>, StoreError>;

    /// Number of addresses the user has.
    async fn count_addresses(&mut self, user_id: UserId) -> Result<i64, StoreError>;

    /// Unset `is_default` on all of the user's addresses.
    async fn clear_default_address(&mut self, user_id: UserId) -> Result<(), StoreError>;

    /// Insert an address with an explicit default flag.
    async fn insert_address(
        &mut self,
        user_id: UserId,
        input: &NewAddress,
        is_default: bool,
    ) -> Result<Address, StoreError>;

    /// Apply a patch to an address. `None` fields are left unchanged.
    /// Returns `None` if the address is gone.
    async fn update_address(
        &mut self,
        id: AddressId,
        patch: &AddressPatch,
    ) -> Result<Option<Address>, StoreError>;

    /// Set `is_default` on the address only if it belongs to `user_id`.
    /// Returns whether a row was affected.
    async fn mark_default_address(
        &mut self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<bool, StoreError>;

    /// Delete an address. Returns whether a row was affected.
    async fn delete_address(&mut self, id: AddressId) -> Result<bool, StoreError>;

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    /// Insert an order header.
    async fn insert_order(
        &mut self,
        user_id: UserId,
        total: Decimal,
        status: OrderStatus,
    ) -> Result<Order, StoreError>;

    /// Insert one immutable order line.
    async fn insert_order_item(
        &mut self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<OrderItem, StoreError>;

    /// Fetch an order header by ID.
    async fn order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// All line items of an order, in insertion order.
    async fn order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError>;

    /// All orders placed by a user, newest first.
    async fn orders_for_user(&mut self, user_id: UserId) -> Result<Vec<Order>, StoreError>;

    /// Make every write in this scope visible atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the commit fails; no writes from
    /// this scope are observable in that case.
    async fn commit(self) -> Result<(), StoreError>;
}
