//! Integration tests for Chalkboard.
//!
//! The in-memory backend is exercised by the unit suites inside
//! `chalkboard-commerce`; the tests in this crate run the same manager
//! operations against a live `PostgreSQL` database.
//!
//! # Running Tests
//!
//! ```bash
//! # Start a database and point the suite at it
//! export CHALKBOARD_DATABASE_URL=postgres://localhost/chalkboard_test
//!
//! # Run the ignored live-database tests
//! cargo test -p chalkboard-integration-tests -- --ignored
//! ```

use secrecy::SecretString;

use chalkboard_commerce::config::DatabaseConfig;
use chalkboard_commerce::store::PgStore;

/// Connect to the test database named by `CHALKBOARD_DATABASE_URL` and
/// apply migrations.
///
/// # Panics
///
/// Panics if the variable is unset or the database is unreachable; the
/// tests calling this are `#[ignore]`d for exactly that reason.
pub async fn test_store() -> PgStore {
    let url = std::env::var("CHALKBOARD_DATABASE_URL")
        .expect("CHALKBOARD_DATABASE_URL must point at a test database");

    let config = DatabaseConfig::new(SecretString::from(url));
    let store = PgStore::connect(&config)
        .await
        .expect("failed to connect to test database");
    store.migrate().await.expect("failed to run migrations");
    store
}
