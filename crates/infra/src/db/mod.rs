//! SQLite-backed inventory store: connection pool, schema management and sessions.
//!
//! A `Store` is an explicitly constructed handle; there is no process-wide
//! connection. Tests open as many independent stores as they like.

mod rows;
pub mod schema;
mod session;

use std::time::Duration;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{info, instrument, warn};

use crate::config::StoreConfig;
use crate::error::{InventoryError, map_sqlx_error};

pub use session::{ProductFilter, ProductStock, Session};

#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
    config: StoreConfig,
}

impl Store {
    /// Connect to the configured database and make sure both tables exist.
    #[instrument(skip_all, fields(database_url = %config.database_url), err)]
    pub async fn open(config: StoreConfig) -> Result<Self, InventoryError> {
        let options = config.connect_options()?;

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.effective_max_connections())
            .acquire_timeout(config.acquire_timeout);
        if config.is_in_memory() {
            // An in-memory database lives exactly as long as its connection.
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self { pool, config };
        store.ensure_schema().await?;
        info!(
            max_connections = store.config.effective_max_connections(),
            "inventory store opened"
        );
        Ok(store)
    }

    /// Ensure the schema exists and hand out a new unit of work.
    ///
    /// Sessions are independent of each other; each holds a pooled connection
    /// only while it has a transaction open.
    pub async fn open_session(&self) -> Result<Session, InventoryError> {
        self.ensure_schema().await?;
        Ok(Session::new(self.pool.clone()))
    }

    /// Create any missing tables.
    pub async fn ensure_schema(&self) -> Result<(), InventoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        schema::create_all(&mut *tx).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }

    /// Drop and recreate every table. **All data is discarded.**
    ///
    /// For test fixtures only; production code must never call this.
    #[instrument(skip(self), err)]
    pub async fn reset_all(&self) -> Result<(), InventoryError> {
        warn!("dropping and recreating all inventory tables");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        schema::drop_all(&mut *tx).await?;
        schema::create_all(&mut *tx).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Names of the inventory tables currently present.
    pub async fn tables(&self) -> Result<Vec<String>, InventoryError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))?;
        schema::existing_tables(&mut conn).await
    }

    /// Close the pool, waiting for checked-out connections to come back.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
