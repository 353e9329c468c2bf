//! Shared helpers for the in-memory backend tests.

use rust_decimal::Decimal;

use chalkboard_commerce::ProductLedger;
use chalkboard_commerce::models::{NewProduct, Product};
use chalkboard_commerce::store::MemoryStore;

/// A decimal price from cents, avoiding float literals in tests.
#[allow(dead_code)]
pub fn price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Seed one active product through the catalog-admin path.
#[allow(dead_code)]
pub async fn seed_product(store: &MemoryStore, name: &str, cents: i64, stock: i32) -> Product {
    ProductLedger::new(store)
        .create_product(&NewProduct::new(name, price(cents), stock))
        .await
        .expect("failed to seed product")
}

/// Seed an inactive product.
#[allow(dead_code)]
pub async fn seed_inactive_product(store: &MemoryStore, name: &str, stock: i32) -> Product {
    let mut input = NewProduct::new(name, price(999), stock);
    input.active = false;
    ProductLedger::new(store)
        .create_product(&input)
        .await
        .expect("failed to seed product")
}
