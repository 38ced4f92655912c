//! Storefront ledger configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                          | Default          |
//! |-----------------------------------|------------------|
//! | `STOREFRONT_DATABASE_PATH`        | `storefront.db`  |
//! | `STOREFRONT_DB_MAX_CONNECTIONS`   | `5`              |
//! | `STOREFRONT_DB_BUSY_TIMEOUT_MS`   | `5000`           |
//! | `STOREFRONT_STOCK_COMMIT_POINT`   | `on_placement`   |
//! | `STOREFRONT_AUDIT_BUFFER`         | `256`            |
//! | `STOREFRONT_AUDIT_ACTOR`          | `Admin`          |
//! | `STOREFRONT_MIN_PHONE_LENGTH`     | `10`             |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use storefront_core::{StockCommitPoint, DEFAULT_AUDIT_ACTOR, DEFAULT_MIN_PHONE_LENGTH};

use crate::pool::DbConfig;

/// Storefront ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// How long a writer waits for the database lock before failing
    pub busy_timeout_ms: u64,

    /// When an order's stock leaves inventory
    pub stock_commit_point: StockCommitPoint,

    /// Audit queue capacity; entries beyond it are dropped with a warning
    pub audit_buffer: usize,

    /// Actor recorded on back-office audit entries
    pub audit_actor: String,

    /// Minimum customer phone length at checkout
    pub min_phone_length: usize,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        StorefrontConfig {
            database_path: PathBuf::from("storefront.db"),
            max_connections: 5,
            busy_timeout_ms: 5_000,
            stock_commit_point: StockCommitPoint::OnPlacement,
            audit_buffer: 256,
            audit_actor: DEFAULT_AUDIT_ACTOR.to_string(),
            min_phone_length: DEFAULT_MIN_PHONE_LENGTH,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = StorefrontConfig::default();

        let config = StorefrontConfig {
            database_path: lookup("STOREFRONT_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_or(&lookup, "STOREFRONT_DB_MAX_CONNECTIONS", defaults.max_connections)?,

            busy_timeout_ms: parse_or(&lookup, "STOREFRONT_DB_BUSY_TIMEOUT_MS", defaults.busy_timeout_ms)?,

            stock_commit_point: parse_or(
                &lookup,
                "STOREFRONT_STOCK_COMMIT_POINT",
                defaults.stock_commit_point,
            )?,

            audit_buffer: parse_or(&lookup, "STOREFRONT_AUDIT_BUFFER", defaults.audit_buffer)?,

            audit_actor: lookup("STOREFRONT_AUDIT_ACTOR")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.audit_actor),

            min_phone_length: parse_or(&lookup, "STOREFRONT_MIN_PHONE_LENGTH", defaults.min_phone_length)?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("STOREFRONT_DB_MAX_CONNECTIONS".to_string()));
        }
        if config.audit_buffer == 0 {
            return Err(ConfigError::InvalidValue("STOREFRONT_AUDIT_BUFFER".to_string()));
        }

        Ok(config)
    }

    /// Pool settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.stock_commit_point, StockCommitPoint::OnPlacement);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.audit_actor, "Admin");
        assert_eq!(config.min_phone_length, 10);
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_lookup(lookup(&[
            ("STOREFRONT_DATABASE_PATH", "/var/lib/shop.db"),
            ("STOREFRONT_STOCK_COMMIT_POINT", "on_confirmation"),
            ("STOREFRONT_DB_BUSY_TIMEOUT_MS", "250"),
            ("STOREFRONT_AUDIT_ACTOR", "Ops"),
        ]))
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/shop.db"));
        assert_eq!(config.stock_commit_point, StockCommitPoint::OnConfirmation);
        assert_eq!(config.db_config().busy_timeout, Duration::from_millis(250));
        assert_eq!(config.audit_actor, "Ops");
    }

    #[test]
    fn test_invalid_values() {
        let err = StorefrontConfig::from_lookup(lookup(&[("STOREFRONT_DB_MAX_CONNECTIONS", "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key) if key == "STOREFRONT_DB_MAX_CONNECTIONS"));

        assert!(StorefrontConfig::from_lookup(lookup(&[("STOREFRONT_AUDIT_BUFFER", "0")])).is_err());
        assert!(StorefrontConfig::from_lookup(lookup(&[("STOREFRONT_STOCK_COMMIT_POINT", "later")])).is_err());
    }
}
