//! Store configuration loading and representation.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteConnectOptions;

use crate::error::InventoryError;

/// Default location of the inventory database (relative to the working directory).
pub const DEFAULT_DATABASE_URL: &str = "sqlite://inventory.db";

/// Default pool size for file-backed stores.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

pub const DATABASE_URL_ENV: &str = "STOCKROOM_DATABASE_URL";
pub const MAX_CONNECTIONS_ENV: &str = "STOCKROOM_MAX_CONNECTIONS";

const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Where the store lives and how many connections it may hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite connection URL, e.g. `sqlite://inventory.db` or `sqlite::memory:`.
    pub database_url: String,
    /// Upper bound on pooled connections. Ignored (forced to 1) for in-memory stores.
    pub max_connections: u32,
    /// How long to wait for a free pooled connection.
    #[serde(with = "duration_secs")]
    pub acquire_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_URL)
    }
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    /// Private in-memory database.
    ///
    /// The store pins a single connection so data survives between sessions.
    /// Only one transaction can be open at a time: a second session that needs
    /// a connection while another holds an open transaction waits for
    /// `acquire_timeout` and then fails.
    pub fn in_memory() -> Self {
        Self {
            max_connections: 1,
            ..Self::new(IN_MEMORY_URL)
        }
    }

    /// File-backed database at `path` (created if missing).
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::new(format!("sqlite://{}", path.as_ref().to_string_lossy()))
    }

    /// Load configuration from `STOCKROOM_DATABASE_URL` / `STOCKROOM_MAX_CONNECTIONS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = match lookup(DATABASE_URL_ENV) {
            Some(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        };

        if let Some(raw) = lookup(MAX_CONNECTIONS_ENV) {
            match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => config.max_connections = n,
                _ => tracing::warn!(
                    value = %raw,
                    fallback = DEFAULT_MAX_CONNECTIONS,
                    "{MAX_CONNECTIONS_ENV} is not a positive integer; using default"
                ),
            }
        }

        config
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    /// Pool size actually used when opening the store.
    pub fn effective_max_connections(&self) -> u32 {
        if self.is_in_memory() {
            1
        } else {
            self.max_connections.max(1)
        }
    }

    pub(crate) fn connect_options(&self) -> Result<SqliteConnectOptions, InventoryError> {
        if self.database_url.trim().is_empty() {
            return Err(InventoryError::Config("database_url cannot be empty".to_string()));
        }

        let options = SqliteConnectOptions::from_str(&self.database_url)
            .map_err(|e| InventoryError::Config(format!("{}: {e}", self.database_url)))?;

        Ok(options.create_if_missing(true).foreign_keys(true))
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_inventory_db() {
        let config = StoreConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(!config.is_in_memory());
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            (DATABASE_URL_ENV, " sqlite:///tmp/shop.db "),
            (MAX_CONNECTIONS_ENV, "8"),
        ]));
        assert_eq!(config.database_url, "sqlite:///tmp/shop.db");
        assert_eq!(config.max_connections, 8);
    }

    #[test]
    fn malformed_pool_size_falls_back_to_default() {
        let config = StoreConfig::from_lookup(lookup_from(&[(MAX_CONNECTIONS_ENV, "zero")]));
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);

        let config = StoreConfig::from_lookup(lookup_from(&[(MAX_CONNECTIONS_ENV, "0")]));
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn in_memory_is_pinned_to_one_connection() {
        let config = StoreConfig {
            max_connections: 10,
            ..StoreConfig::in_memory()
        };
        assert!(config.is_in_memory());
        assert_eq!(config.effective_max_connections(), 1);
    }

    #[test]
    fn from_path_builds_sqlite_url() {
        let config = StoreConfig::from_path("/var/lib/stockroom/inventory.db");
        assert_eq!(config.database_url, "sqlite:///var/lib/stockroom/inventory.db");
    }

    #[test]
    fn empty_url_is_a_config_error() {
        let err = StoreConfig::new("  ").connect_options().unwrap_err();
        assert!(matches!(err, InventoryError::Config(_)));
    }

    #[test]
    fn deserializes_with_missing_fields_defaulted() {
        let config: StoreConfig =
            serde_json::from_str(r#"{ "database_url": "sqlite::memory:" }"#).unwrap();
        assert!(config.is_in_memory());
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }
}
