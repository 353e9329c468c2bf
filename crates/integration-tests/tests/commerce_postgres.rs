//! Live-database tests for the commerce managers.
//!
//! These tests require a running `PostgreSQL` database reachable through
//! `CHALKBOARD_DATABASE_URL`. They share one database, so each test seeds
//! its own products and uses throwaway user ids.
//!
//! Run with: cargo test -p chalkboard-integration-tests -- --ignored

use rust_decimal::Decimal;

use chalkboard_core::UserId;

use chalkboard_commerce::models::{NewAddress, NewProduct, OrderLine};
use chalkboard_commerce::store::PgStore;
use chalkboard_commerce::{
    AddressManager, CartManager, CommerceError, OrderProcessor, ProductLedger,
};

use chalkboard_integration_tests::test_store;

fn throwaway_user() -> UserId {
    // Each test works under its own user id so suites can share a database.
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .subsec_nanos();
    UserId::new(i32::try_from(nanos % 1_000_000_000).expect("in range") + 1000)
}

async fn seed_product(store: &PgStore, stock: i32) -> chalkboard_commerce::models::Product {
    ProductLedger::new(store)
        .create_product(&NewProduct::new(
            "Integration Workbook",
            Decimal::new(1999, 2),
            stock,
        ))
        .await
        .expect("failed to seed product")
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_cart_roundtrip_against_postgres() {
    let store = test_store().await;
    let user = throwaway_user();
    let product = seed_product(&store, 5).await;
    let cart = CartManager::new(&store);

    let item = cart.add_to_cart(user, product.id, 2).await.unwrap();
    assert_eq!(item.quantity, 2);

    // Merge and hit the stock ceiling.
    let item = cart.add_to_cart(user, product.id, 3).await.unwrap();
    assert_eq!(item.quantity, 5);
    let err = cart.add_to_cart(user, product.id, 1).await.unwrap_err();
    assert!(matches!(err, CommerceError::InsufficientStock { .. }));

    assert!(cart.clear_cart(user).await.unwrap());
    assert!(cart.cart(user).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_order_atomicity_against_postgres() {
    let store = test_store().await;
    let user = throwaway_user();
    let plentiful = seed_product(&store, 10).await;
    let scarce = seed_product(&store, 1).await;
    let orders = OrderProcessor::new(&store);
    let ledger = ProductLedger::new(&store);

    let err = orders
        .create_order(
            user,
            &[
                OrderLine::new(plentiful.id, 2, plentiful.price),
                OrderLine::new(scarce.id, 2, scarce.price),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::InsufficientStock { .. }));

    // The transaction rolled back: nothing was decremented, nothing persisted.
    assert_eq!(ledger.stock(plentiful.id).await.unwrap(), 10);
    assert_eq!(ledger.stock(scarce.id).await.unwrap(), 1);
    assert!(orders.orders_for_user(user).await.unwrap().is_empty());

    let details = orders
        .create_order(user, &[OrderLine::new(plentiful.id, 2, plentiful.price)])
        .await
        .unwrap();
    assert_eq!(ledger.stock(plentiful.id).await.unwrap(), 8);
    assert_eq!(details.order.total, Decimal::new(3998, 2));
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_concurrent_checkout_against_postgres() {
    let store = test_store().await;
    let product = seed_product(&store, 5).await;
    let ledger = ProductLedger::new(&store);

    let mut handles = Vec::new();
    for _ in 0..2 {
        let store = store.clone();
        let product_id = product.id;
        let unit_price = product.price;
        handles.push(tokio::spawn(async move {
            OrderProcessor::new(&store)
                .create_order(
                    throwaway_user(),
                    &[OrderLine::new(product_id, 3, unit_price)],
                )
                .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(CommerceError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    // One winner; the guarded decrement keeps stock non-negative.
    assert_eq!(succeeded, 1);
    assert_eq!(ledger.stock(product.id).await.unwrap(), 2);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_default_address_invariant_against_postgres() {
    let store = test_store().await;
    let user = throwaway_user();
    let manager = AddressManager::new(&store);

    let input = NewAddress {
        recipient: "Test Customer".to_owned(),
        street: "1 Test St".to_owned(),
        city: "Testville".to_owned(),
        region: "TS".to_owned(),
        postal_code: "00000".to_owned(),
        country: "US".to_owned(),
        phone: None,
        is_default: false,
    };

    let first = manager.create_address(user, &input).await.unwrap();
    assert!(first.is_default);

    let second = manager.create_address(user, &input).await.unwrap();
    assert!(!second.is_default);

    assert!(manager.set_default_address(user, second.id).await.unwrap());
    let defaults: Vec<_> = manager
        .addresses(user)
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.is_default)
        .collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, second.id);
}
