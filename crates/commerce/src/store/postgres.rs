//! `PostgreSQL` storage backend.
//!
//! A [`PgScope`] wraps one `sqlx::Transaction`; dropping the scope without
//! committing rolls the transaction back, which is what gives the managers
//! their all-or-nothing guarantee. Stock decrements are guarded in SQL
//! (`stock >= amount`), so under read-committed isolation two racing
//! checkouts serialize on the product row and the loser observes the
//! reduced stock instead of overselling.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use chalkboard_core::{
    AddressId, CartItemId, OrderId, OrderItemId, OrderStatus, ProductId, UserId,
};

use super::{StorageEngine, TransactionScope};
use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::models::{
    Address, AddressPatch, CartItem, NewAddress, NewProduct, Order, OrderItem, Product,
};

/// Embedded migrations for the commerce schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: Option<String>,
    price: Decimal,
    stock: i32,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    user_id: i32,
    product_id: i32,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    recipient: String,
    street: String,
    city: String,
    region: String,
    postal_code: String,
    country: String,
    phone: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            recipient: row.recipient,
            street: row.street,
            city: row.city,
            region: row.region,
            postal_code: row.postal_code,
            country: row.country,
            phone: row.phone,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    total: Decimal,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_str(&row.status)
            .map_err(|e| StoreError::DataCorruption(format!("invalid order status: {e}")))?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            total: row.total,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    unit_price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// `PostgreSQL` storage engine backed by a connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with sensible pool defaults from [`DatabaseConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection cannot be
    /// established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(config.url.expose_secret())
            .await?;

        Ok(Self { pool })
    }

    /// Apply the embedded commerce migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(sqlx::Error::Migrate(Box::new(e))))
    }

    /// Access the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StorageEngine for PgStore {
    type Scope = PgScope;

    async fn begin(&self) -> Result<PgScope, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgScope { tx })
    }
}

/// One open database transaction. Dropping it without commit rolls back.
pub struct PgScope {
    tx: Transaction<'static, Postgres>,
}

impl std::fmt::Debug for PgScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgScope").finish_non_exhaustive()
    }
}

#[async_trait]
impl TransactionScope for PgScope {
    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, stock, active, created_at, updated_at
            FROM commerce.product
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert_product(&mut self, input: &NewProduct) -> Result<Product, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO commerce.product (name, description, price, stock, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, price, stock, active, created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock)
        .bind(input.active)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn decrement_stock(&mut self, id: ProductId, amount: i32) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            UPDATE commerce.product
            SET stock = stock - $2, updated_at = now()
            WHERE id = $1 AND stock >= $2
            ",
        )
        .bind(id.as_i32())
        .bind(amount)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn cart_item(&mut self, id: CartItemId) -> Result<Option<CartItem>, StoreError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT id, user_id, product_id, quantity, created_at, updated_at
            FROM commerce.cart_item
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn cart_line(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, StoreError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT id, user_id, product_id, quantity, created_at, updated_at
            FROM commerce.cart_item
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn cart_items(&mut self, user_id: UserId) -> Result<Vec<CartItem>, StoreError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT id, user_id, product_id, quantity, created_at, updated_at
            FROM commerce.cart_item
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_cart_line(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, StoreError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO commerce.cart_item (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = now()
            RETURNING id, user_id, product_id, quantity, created_at, updated_at
            ",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .bind(quantity)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn set_cart_quantity(
        &mut self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<Option<CartItem>, StoreError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            UPDATE commerce.cart_item
            SET quantity = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, user_id, product_id, quantity, created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(quantity)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn delete_cart_item(&mut self, id: CartItemId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            DELETE FROM commerce.cart_item
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&mut self, user_id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            DELETE FROM commerce.cart_item
            WHERE user_id = $1
            ",
        )
        .bind(user_id.as_i32())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn address(&mut self, id: AddressId) -> Result<Option<Address>, StoreError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, recipient, street, city, region, postal_code,
                   country, phone, is_default, created_at, updated_at
            FROM commerce.address
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn addresses(&mut self, user_id: UserId) -> Result<Vec<Address>, StoreError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, recipient, street, city, region, postal_code,
                   country, phone, is_default, created_at, updated_at
            FROM commerce.address
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_addresses(&mut self, user_id: UserId) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM commerce.address
            WHERE user_id = $1
            ",
        )
        .bind(user_id.as_i32())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count)
    }

    async fn clear_default_address(&mut self, user_id: UserId) -> Result<(), StoreError> {
        sqlx::query(
            r"
            UPDATE commerce.address
            SET is_default = FALSE, updated_at = now()
            WHERE user_id = $1 AND is_default
            ",
        )
        .bind(user_id.as_i32())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn insert_address(
        &mut self,
        user_id: UserId,
        input: &NewAddress,
        is_default: bool,
    ) -> Result<Address, StoreError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            INSERT INTO commerce.address (
                user_id, recipient, street, city, region,
                postal_code, country, phone, is_default
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, recipient, street, city, region, postal_code,
                      country, phone, is_default, created_at, updated_at
            ",
        )
        .bind(user_id.as_i32())
        .bind(&input.recipient)
        .bind(&input.street)
        .bind(&input.city)
        .bind(&input.region)
        .bind(&input.postal_code)
        .bind(&input.country)
        .bind(&input.phone)
        .bind(is_default)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn update_address(
        &mut self,
        id: AddressId,
        patch: &AddressPatch,
    ) -> Result<Option<Address>, StoreError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            UPDATE commerce.address
            SET recipient   = COALESCE($2, recipient),
                street      = COALESCE($3, street),
                city        = COALESCE($4, city),
                region      = COALESCE($5, region),
                postal_code = COALESCE($6, postal_code),
                country     = COALESCE($7, country),
                phone       = COALESCE($8, phone),
                is_default  = COALESCE($9, is_default),
                updated_at  = now()
            WHERE id = $1
            RETURNING id, user_id, recipient, street, city, region, postal_code,
                      country, phone, is_default, created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(&patch.recipient)
        .bind(&patch.street)
        .bind(&patch.city)
        .bind(&patch.region)
        .bind(&patch.postal_code)
        .bind(&patch.country)
        .bind(&patch.phone)
        .bind(patch.is_default)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn mark_default_address(
        &mut self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            UPDATE commerce.address
            SET is_default = TRUE, updated_at = now()
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id.as_i32())
        .bind(user_id.as_i32())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_address(&mut self, id: AddressId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            DELETE FROM commerce.address
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_order(
        &mut self,
        user_id: UserId,
        total: Decimal,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO commerce.customer_order (user_id, total, status)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, total, status, created_at
            ",
        )
        .bind(user_id.as_i32())
        .bind(total)
        .bind(status.to_string())
        .fetch_one(&mut *self.tx)
        .await?;

        row.try_into()
    }

    async fn insert_order_item(
        &mut self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<OrderItem, StoreError> {
        let row = sqlx::query_as::<_, OrderItemRow>(
            r"
            INSERT INTO commerce.order_item (order_id, product_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_id, product_id, quantity, unit_price
            ",
        )
        .bind(order_id.as_i32())
        .bind(product_id.as_i32())
        .bind(quantity)
        .bind(unit_price)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, total, status, created_at
            FROM commerce.customer_order
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, quantity, unit_price
            FROM commerce.order_item
            WHERE order_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(order_id.as_i32())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn orders_for_user(&mut self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, total, status, created_at
            FROM commerce.customer_order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
