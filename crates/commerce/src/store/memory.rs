//! In-memory storage backend.
//!
//! The test double for the `PostgreSQL` backend: the same trait surface,
//! the same scope semantics. A scope takes the exclusive lock over the
//! whole state and snapshots it; commit keeps the mutations, dropping the
//! scope without commit restores the snapshot. The exclusive lock also
//! serializes concurrent scopes, so racing checkouts observe each other's
//! committed decrements exactly as they would behind the SQL guard.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use chalkboard_core::{
    AddressId, CartItemId, OrderId, OrderItemId, OrderStatus, ProductId, UserId,
};

use super::{StorageEngine, TransactionScope};
use crate::error::StoreError;
use crate::models::{
    Address, AddressPatch, CartItem, NewAddress, NewProduct, Order, OrderItem, Product,
};

#[derive(Debug, Clone, Default)]
struct State {
    products: BTreeMap<i32, Product>,
    cart_items: BTreeMap<i32, CartItem>,
    addresses: BTreeMap<i32, Address>,
    orders: BTreeMap<i32, Order>,
    order_items: BTreeMap<i32, OrderItem>,
    next_id: i32,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory storage engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageEngine for MemoryStore {
    type Scope = MemoryScope;

    async fn begin(&self) -> Result<MemoryScope, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let snapshot = guard.clone();
        Ok(MemoryScope {
            guard,
            snapshot: Some(snapshot),
        })
    }
}

/// One open scope over the in-memory state.
///
/// Holds the exclusive lock for its whole lifetime. Dropping without
/// [`TransactionScope::commit`] restores the snapshot taken at `begin`.
#[derive(Debug)]
pub struct MemoryScope {
    guard: OwnedMutexGuard<State>,
    snapshot: Option<State>,
}

impl Drop for MemoryScope {
    fn drop(&mut self) {
        // Not committed: roll back to the state seen at begin.
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

fn touch(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (now, now)
}

#[async_trait]
impl TransactionScope for MemoryScope {
    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.guard.products.get(&id.as_i32()).cloned())
    }

    async fn insert_product(&mut self, input: &NewProduct) -> Result<Product, StoreError> {
        let id = self.guard.next_id();
        let (created_at, updated_at) = touch(Utc::now());
        let product = Product {
            id: ProductId::new(id),
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            stock: input.stock,
            active: input.active,
            created_at,
            updated_at,
        };
        self.guard.products.insert(id, product.clone());
        Ok(product)
    }

    async fn decrement_stock(&mut self, id: ProductId, amount: i32) -> Result<bool, StoreError> {
        match self.guard.products.get_mut(&id.as_i32()) {
            Some(product) if product.stock >= amount => {
                product.stock -= amount;
                product.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cart_item(&mut self, id: CartItemId) -> Result<Option<CartItem>, StoreError> {
        Ok(self.guard.cart_items.get(&id.as_i32()).cloned())
    }

    async fn cart_line(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, StoreError> {
        Ok(self
            .guard
            .cart_items
            .values()
            .find(|item| item.user_id == user_id && item.product_id == product_id)
            .cloned())
    }

    async fn cart_items(&mut self, user_id: UserId) -> Result<Vec<CartItem>, StoreError> {
        Ok(self
            .guard
            .cart_items
            .values()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_cart_line(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, StoreError> {
        let existing = self
            .guard
            .cart_items
            .values_mut()
            .find(|item| item.user_id == user_id && item.product_id == product_id);

        if let Some(item) = existing {
            item.quantity = quantity;
            item.updated_at = Utc::now();
            return Ok(item.clone());
        }

        let id = self.guard.next_id();
        let (created_at, updated_at) = touch(Utc::now());
        let item = CartItem {
            id: CartItemId::new(id),
            user_id,
            product_id,
            quantity,
            created_at,
            updated_at,
        };
        self.guard.cart_items.insert(id, item.clone());
        Ok(item)
    }

    async fn set_cart_quantity(
        &mut self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<Option<CartItem>, StoreError> {
        Ok(self.guard.cart_items.get_mut(&id.as_i32()).map(|item| {
            item.quantity = quantity;
            item.updated_at = Utc::now();
            item.clone()
        }))
    }

    async fn delete_cart_item(&mut self, id: CartItemId) -> Result<bool, StoreError> {
        Ok(self.guard.cart_items.remove(&id.as_i32()).is_some())
    }

    async fn clear_cart(&mut self, user_id: UserId) -> Result<bool, StoreError> {
        let before = self.guard.cart_items.len();
        self.guard
            .cart_items
            .retain(|_, item| item.user_id != user_id);
        Ok(self.guard.cart_items.len() < before)
    }

    async fn address(&mut self, id: AddressId) -> Result<Option<Address>, StoreError> {
        Ok(self.guard.addresses.get(&id.as_i32()).cloned())
    }

    async fn addresses(&mut self, user_id: UserId) -> Result<Vec<Address>, StoreError> {
        Ok(self
            .guard
            .addresses
            .values()
            .filter(|address| address.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_addresses(&mut self, user_id: UserId) -> Result<i64, StoreError> {
        Ok(self
            .guard
            .addresses
            .values()
            .filter(|address| address.user_id == user_id)
            .count() as i64)
    }

    async fn clear_default_address(&mut self, user_id: UserId) -> Result<(), StoreError> {
        let now = Utc::now();
        for address in self.guard.addresses.values_mut() {
            if address.user_id == user_id && address.is_default {
                address.is_default = false;
                address.updated_at = now;
            }
        }
        Ok(())
    }

    async fn insert_address(
        &mut self,
        user_id: UserId,
        input: &NewAddress,
        is_default: bool,
    ) -> Result<Address, StoreError> {
        let id = self.guard.next_id();
        let (created_at, updated_at) = touch(Utc::now());
        let address = Address {
            id: AddressId::new(id),
            user_id,
            recipient: input.recipient.clone(),
            street: input.street.clone(),
            city: input.city.clone(),
            region: input.region.clone(),
            postal_code: input.postal_code.clone(),
            country: input.country.clone(),
            phone: input.phone.clone(),
            is_default,
            created_at,
            updated_at,
        };
        self.guard.addresses.insert(id, address.clone());
        Ok(address)
    }

    async fn update_address(
        &mut self,
        id: AddressId,
        patch: &AddressPatch,
    ) -> Result<Option<Address>, StoreError> {
        Ok(self.guard.addresses.get_mut(&id.as_i32()).map(|address| {
            if let Some(recipient) = &patch.recipient {
                address.recipient = recipient.clone();
            }
            if let Some(street) = &patch.street {
                address.street = street.clone();
            }
            if let Some(city) = &patch.city {
                address.city = city.clone();
            }
            if let Some(region) = &patch.region {
                address.region = region.clone();
            }
            if let Some(postal_code) = &patch.postal_code {
                address.postal_code = postal_code.clone();
            }
            if let Some(country) = &patch.country {
                address.country = country.clone();
            }
            if let Some(phone) = &patch.phone {
                address.phone = Some(phone.clone());
            }
            if let Some(is_default) = patch.is_default {
                address.is_default = is_default;
            }
            address.updated_at = Utc::now();
            address.clone()
        }))
    }

    async fn mark_default_address(
        &mut self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<bool, StoreError> {
        match self.guard.addresses.get_mut(&id.as_i32()) {
            Some(address) if address.user_id == user_id => {
                address.is_default = true;
                address.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_address(&mut self, id: AddressId) -> Result<bool, StoreError> {
        Ok(self.guard.addresses.remove(&id.as_i32()).is_some())
    }

    async fn insert_order(
        &mut self,
        user_id: UserId,
        total: Decimal,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        let id = self.guard.next_id();
        let order = Order {
            id: OrderId::new(id),
            user_id,
            total,
            status,
            created_at: Utc::now(),
        };
        self.guard.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn insert_order_item(
        &mut self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<OrderItem, StoreError> {
        let id = self.guard.next_id();
        let item = OrderItem {
            id: OrderItemId::new(id),
            order_id,
            product_id,
            quantity,
            unit_price,
        };
        self.guard.order_items.insert(id, item.clone());
        Ok(item)
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.guard.orders.get(&id.as_i32()).cloned())
    }

    async fn order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        Ok(self
            .guard
            .order_items
            .values()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn orders_for_user(&mut self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .guard
            .orders
            .values()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|order| std::cmp::Reverse(order.id.as_i32()));
        Ok(orders)
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        // Keep the mutations: drop without restoring the snapshot.
        self.snapshot = None;
        Ok(())
    }
}
