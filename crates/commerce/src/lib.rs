//! Chalkboard Commerce - the cart/order transaction core.
//!
//! This crate owns the one subsystem of the Chalkboard storefront with real
//! consistency stakes: inventory-consistent carts and order fulfillment. It
//! guarantees that a unit of stock is never sold twice, that a cart line
//! never exceeds available stock at write time, that a persisted order's
//! line items and total always match what was reserved, and that a customer
//! with any addresses has exactly one default shipping address.
//!
//! The HTTP router, session auth, catalog search, and UI are external
//! collaborators: they resolve the authenticated [`UserId`], call into the
//! managers here, and translate [`CommerceError`] kinds into protocol
//! responses.
//!
//! # Architecture
//!
//! All persistence goes through the [`store::StorageEngine`] trait, which
//! hands out [`store::TransactionScope`] values: explicit all-or-nothing
//! execution boundaries that roll back when dropped without a commit. Two
//! backends are provided:
//!
//! - [`store::PgStore`] - `PostgreSQL` via sqlx, with embedded migrations
//! - [`store::MemoryStore`] - in-process test double with the same semantics
//!
//! The managers borrow an engine and contain all the domain logic:
//!
//! - [`CartManager`] - advisory stock checks on cart writes
//! - [`AddressManager`] - the single-default-address invariant
//! - [`OrderProcessor`] - the critical validate/commit/decrement path
//! - [`ProductLedger`] - stock reads and catalog-admin seeding
//!
//! [`UserId`]: chalkboard_core::UserId

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod cart;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod orders;
pub mod store;

pub use address::AddressManager;
pub use cart::CartManager;
pub use error::{CommerceError, ErrorKind, StoreError};
pub use ledger::ProductLedger;
pub use orders::OrderProcessor;
