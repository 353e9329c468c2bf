//! Database configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHALKBOARD_DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `CHALKBOARD_DB_MAX_CONNECTIONS` - pool upper bound (default: 10)
//! - `CHALKBOARD_DB_MIN_CONNECTIONS` - pool lower bound (default: 2)
//! - `CHALKBOARD_DB_ACQUIRE_TIMEOUT_SECS` - connection wait limit (default: 10)

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Connection settings for the `PostgreSQL` storage engine.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL (contains password).
    pub url: SecretString,
    /// Pool upper bound.
    pub max_connections: u32,
    /// Pool lower bound.
    pub min_connections: u32,
    /// How long to wait for a pooled connection.
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Build a config with pool defaults from a connection URL.
    #[must_use]
    pub fn new(url: SecretString) -> Self {
        Self {
            url,
            max_connections: 10,
            min_connections: 2,
            acquire_timeout_secs: 10,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads a `.env` file first if one is present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `CHALKBOARD_DATABASE_URL`
    /// is unset, or [`ConfigError::InvalidEnvVar`] if a pool knob fails to
    /// parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let url = std::env::var("CHALKBOARD_DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("CHALKBOARD_DATABASE_URL".to_owned()))?;

        let mut config = Self::new(SecretString::from(url));
        config.max_connections = optional_var("CHALKBOARD_DB_MAX_CONNECTIONS")?
            .unwrap_or(config.max_connections);
        config.min_connections = optional_var("CHALKBOARD_DB_MIN_CONNECTIONS")?
            .unwrap_or(config.min_connections);
        config.acquire_timeout_secs = optional_var("CHALKBOARD_DB_ACQUIRE_TIMEOUT_SECS")?
            .unwrap_or(config.acquire_timeout_secs);

        Ok(config)
    }
}

fn optional_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(name.to_owned(), e.to_string())),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_pool_defaults() {
        let config = DatabaseConfig::new(SecretString::from("postgres://localhost/chalkboard"));
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.acquire_timeout_secs, 10);
    }
}
