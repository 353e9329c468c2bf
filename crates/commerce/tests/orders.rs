//! Order processor atomicity and stock consistency against the in-memory
//! backend.

mod common;

use std::sync::Arc;

use rust_decimal::Decimal;

use chalkboard_core::{OrderId, OrderStatus, ProductId, UserId};

use chalkboard_commerce::models::OrderLine;
use chalkboard_commerce::store::MemoryStore;
use chalkboard_commerce::{CartManager, CommerceError, OrderProcessor, ProductLedger};

use common::{price, seed_product};

const ALICE: UserId = UserId::new(1);
const BOB: UserId = UserId::new(2);

#[tokio::test]
async fn test_create_order_decrements_stock() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "Algebra Workbook", 1999, 5).await;
    let orders = OrderProcessor::new(&store);
    let ledger = ProductLedger::new(&store);

    let details = orders
        .create_order(ALICE, &[OrderLine::new(product.id, 3, product.price)])
        .await
        .unwrap();

    assert_eq!(details.order.user_id, ALICE);
    assert_eq!(details.order.status, OrderStatus::Pending);
    assert_eq!(details.order.total, price(5997));
    assert_eq!(details.items.len(), 1);
    assert_eq!(details.items[0].quantity, 3);
    assert_eq!(details.items[0].unit_price, product.price);

    assert_eq!(ledger.stock(product.id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_order_total_recomputed_from_lines() {
    let store = MemoryStore::new();
    let workbook = seed_product(&store, "Algebra Workbook", 1999, 10).await;
    let posters = seed_product(&store, "Periodic Table Poster", 750, 10).await;
    let orders = OrderProcessor::new(&store);

    let details = orders
        .create_order(
            ALICE,
            &[
                OrderLine::new(workbook.id, 2, workbook.price),
                OrderLine::new(posters.id, 3, posters.price),
            ],
        )
        .await
        .unwrap();

    // 2 × 19.99 + 3 × 7.50
    assert_eq!(details.order.total, price(6248));

    // Persisted total always equals the sum over the persisted items.
    let expected: Decimal = details
        .items
        .iter()
        .map(|item| item.unit_price * Decimal::from(item.quantity))
        .sum();
    assert_eq!(details.order.total, expected);
}

#[tokio::test]
async fn test_order_items_freeze_unit_price() {
    // A catalog price change after checkout must not affect the order.
    let store = MemoryStore::new();
    let product = seed_product(&store, "Algebra Workbook", 1999, 10).await;
    let orders = OrderProcessor::new(&store);

    let checkout_price = price(1499); // sale price supplied by the catalog
    let details = orders
        .create_order(ALICE, &[OrderLine::new(product.id, 1, checkout_price)])
        .await
        .unwrap();

    let fetched = orders.order_details(details.order.id).await.unwrap();
    assert_eq!(fetched.items[0].unit_price, checkout_price);
    assert_eq!(fetched.order.total, checkout_price);
}

#[tokio::test]
async fn test_insufficient_stock_rolls_back_everything() {
    let store = MemoryStore::new();
    let workbook = seed_product(&store, "Algebra Workbook", 1999, 10).await;
    let scarce = seed_product(&store, "Lab Kit", 4999, 2).await;
    let orders = OrderProcessor::new(&store);
    let ledger = ProductLedger::new(&store);

    let err = orders
        .create_order(
            ALICE,
            &[
                OrderLine::new(workbook.id, 1, workbook.price),
                OrderLine::new(scarce.id, 3, scarce.price),
            ],
        )
        .await
        .unwrap_err();

    match err {
        CommerceError::InsufficientStock {
            product_id,
            requested,
            available,
            ..
        } => {
            assert_eq!(product_id, scarce.id);
            assert_eq!(requested, 3);
            assert_eq!(available, 2);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // All-or-nothing: no order, no items, no decrement of the first line.
    assert!(orders.orders_for_user(ALICE).await.unwrap().is_empty());
    assert_eq!(ledger.stock(workbook.id).await.unwrap(), 10);
    assert_eq!(ledger.stock(scarce.id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_duplicate_lines_cannot_oversell() {
    // Each line alone passes validation, but together they exceed stock;
    // the decrement-time guard catches it and the whole order rolls back.
    let store = MemoryStore::new();
    let product = seed_product(&store, "Lab Kit", 4999, 5).await;
    let orders = OrderProcessor::new(&store);
    let ledger = ProductLedger::new(&store);

    let err = orders
        .create_order(
            ALICE,
            &[
                OrderLine::new(product.id, 3, product.price),
                OrderLine::new(product.id, 3, product.price),
            ],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CommerceError::InsufficientStock { .. }));
    assert_eq!(ledger.stock(product.id).await.unwrap(), 5);
    assert!(orders.orders_for_user(ALICE).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_and_inactive_products_fail_the_order() {
    let store = MemoryStore::new();
    let inactive = common::seed_inactive_product(&store, "Retired Flashcards", 5).await;
    let orders = OrderProcessor::new(&store);

    let err = orders
        .create_order(ALICE, &[OrderLine::new(ProductId::new(404), 1, price(100))])
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::ProductNotFound { .. }));

    let err = orders
        .create_order(ALICE, &[OrderLine::new(inactive.id, 1, price(100))])
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::ProductNotFound { .. }));
}

#[tokio::test]
async fn test_empty_and_non_positive_lines_are_rejected() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "Algebra Workbook", 1999, 5).await;
    let orders = OrderProcessor::new(&store);

    let err = orders.create_order(ALICE, &[]).await.unwrap_err();
    assert!(matches!(err, CommerceError::Validation(_)));

    let err = orders
        .create_order(ALICE, &[OrderLine::new(product.id, 0, product.price)])
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::Validation(_)));
}

#[tokio::test]
async fn test_second_order_fails_once_stock_is_taken() {
    // Stock 5: Alice takes 3 (stock 2), Bob's 3 must fail and stock must
    // never go negative.
    let store = MemoryStore::new();
    let product = seed_product(&store, "Algebra Workbook", 1999, 5).await;
    let orders = OrderProcessor::new(&store);
    let ledger = ProductLedger::new(&store);

    orders
        .create_order(ALICE, &[OrderLine::new(product.id, 3, product.price)])
        .await
        .unwrap();
    assert_eq!(ledger.stock(product.id).await.unwrap(), 2);

    let err = orders
        .create_order(BOB, &[OrderLine::new(product.id, 3, product.price)])
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::InsufficientStock { .. }));
    assert_eq!(ledger.stock(product.id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_concurrent_orders_never_oversell() {
    let store = Arc::new(MemoryStore::new());
    let product = seed_product(&store, "Algebra Workbook", 1999, 5).await;

    let mut handles = Vec::new();
    for user in [ALICE, BOB] {
        let store = Arc::clone(&store);
        let unit_price = product.price;
        let product_id = product.id;
        handles.push(tokio::spawn(async move {
            OrderProcessor::new(store.as_ref())
                .create_order(user, &[OrderLine::new(product_id, 3, unit_price)])
                .await
        }));
    }

    let mut succeeded = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(CommerceError::InsufficientStock { .. }) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    // Exactly one of the racing checkouts wins.
    assert_eq!(succeeded, 1);
    assert_eq!(insufficient, 1);

    let stock = ProductLedger::new(store.as_ref())
        .stock(product.id)
        .await
        .unwrap();
    assert_eq!(stock, 2);
}

#[tokio::test]
async fn test_create_order_does_not_clear_cart() {
    // Cart clearing is the caller's job, outside the order transaction.
    let store = MemoryStore::new();
    let product = seed_product(&store, "Algebra Workbook", 1999, 10).await;
    let cart = CartManager::new(&store);
    let orders = OrderProcessor::new(&store);

    cart.add_to_cart(ALICE, product.id, 2).await.unwrap();
    orders
        .create_order(ALICE, &[OrderLine::new(product.id, 2, product.price)])
        .await
        .unwrap();

    assert_eq!(cart.cart(ALICE).await.unwrap().len(), 1);
    assert!(cart.clear_cart(ALICE).await.unwrap());
}

#[tokio::test]
async fn test_order_details_and_listing() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "Algebra Workbook", 1999, 10).await;
    let orders = OrderProcessor::new(&store);

    let first = orders
        .create_order(ALICE, &[OrderLine::new(product.id, 1, product.price)])
        .await
        .unwrap();
    let second = orders
        .create_order(ALICE, &[OrderLine::new(product.id, 2, product.price)])
        .await
        .unwrap();

    let details = orders.order_details(first.order.id).await.unwrap();
    assert_eq!(details.order.id, first.order.id);
    assert_eq!(details.items.len(), 1);

    // Newest first.
    let listed = orders.orders_for_user(ALICE).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.order.id);
    assert_eq!(listed[1].id, first.order.id);

    let err = orders.order_details(OrderId::new(404)).await.unwrap_err();
    assert!(matches!(err, CommerceError::OrderNotFound { .. }));
}
