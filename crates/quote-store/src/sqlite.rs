//! # SQLite Store
//!
//! History as rows of JSON payloads in a `quote_orders` table, for shops
//! that keep their data in a database file.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DbConfig::new(path) ──► SqliteStore::connect(config).await            │
//! │                               │                                         │
//! │                               ├── SqlitePool (WAL, NORMAL sync)        │
//! │                               └── migrations (001, 002, ...)           │
//! │                                                                         │
//! │  quote_orders                       settings                            │
//! │  ┌──────┬──────────┬─────────┐      ┌────────────────┬────────┐        │
//! │  │ id   │ position │ payload │      │ key            │ value  │        │
//! │  ├──────┼──────────┼─────────┤      ├────────────────┼────────┤        │
//! │  │ uuid │ 0 = new  │ {json}  │      │ owner_pin_hash │ hex    │        │
//! │  └──────┴──────────┴─────────┘      └────────────────┴────────┘        │
//! │                                                                         │
//! │  save_all = one transaction: DELETE all rows, INSERT each in order     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use quote_core::Order;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::migrations;
use crate::store::{normalize, OrderStore, PinStore};

/// Settings key of the owner PIN reference.
const PIN_SETTING: &str = "owner_pin_hash";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust
/// use quote_store::DbConfig;
///
/// let config = DbConfig::new("/tmp/quotes.db").max_connections(2);
/// assert_eq!(config.max_connections, 2);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 2 (one desk, one writer at a time)
    pub max_connections: u32,

    /// Connection timeout.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Configuration for the database file at `path`. Created if missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 2,
            connect_timeout: Duration::from_secs(30),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// An isolated in-memory database (for testing).
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            connect_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// SQLite-backed history and PIN store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens the pool and applies pending migrations.
    pub async fn connect(config: DbConfig) -> StoreResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening quote database"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());
        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(config.connect_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        let store = SqliteStore { pool };
        if config.run_migrations {
            migrations::run_migrations(&store.pool).await?;
        }
        Ok(store)
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of saved orders.
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quote_orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Closes the pool. Later calls fail.
    pub async fn close(&self) {
        info!("Closing quote database");
        self.pool.close().await;
    }
}

#[async_trait]
impl OrderStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn try_load_all(&self) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query("SELECT id, payload FROM quote_orders ORDER BY position ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let payload: String = row.try_get("payload")?;
            match serde_json::from_str::<Order>(&payload) {
                Ok(order) => orders.push(order),
                Err(e) => warn!(id = %id, error = %e, "Skipping unreadable history row"),
            }
        }
        debug!(count = orders.len(), "History loaded");
        Ok(normalize(orders))
    }

    async fn save_all(&self, orders: &[Order]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM quote_orders")
            .execute(&mut *tx)
            .await?;

        for (position, order) in orders.iter().enumerate() {
            let payload = serde_json::to_string(order)?;
            sqlx::query("INSERT INTO quote_orders (id, position, payload) VALUES (?, ?, ?)")
                .bind(&order.id)
                .bind(position as i64)
                .bind(payload)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!(count = orders.len(), "History saved");
        Ok(())
    }
}

#[async_trait]
impl PinStore for SqliteStore {
    async fn load_pin_hash(&self) -> StoreResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(PIN_SETTING)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value.filter(|v| !v.trim().is_empty()))
    }

    async fn save_pin_hash(&self, hash: &str) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(PIN_SETTING)
        .bind(hash)
        .execute(&self.pool)
        .await?;
        info!("Owner PIN reference stored");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn named(customer: &str) -> Order {
        let mut order = Order::new();
        order.customer = customer.to_string();
        order
    }

    #[tokio::test]
    async fn test_empty_database_is_empty_history() {
        let store = SqliteStore::connect(DbConfig::in_memory()).await.unwrap();
        assert!(store.try_load_all().await.unwrap().is_empty());
        assert_eq!(store.load_pin_hash().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_preserves_history_order() {
        let store = SqliteStore::connect(DbConfig::in_memory()).await.unwrap();
        let history = vec![named("C"), named("A"), named("B")];
        store.save_all(&history).await.unwrap();

        let loaded = store.try_load_all().await.unwrap();
        let names: Vec<&str> = loaded.iter().map(|o| o.customer.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        assert_eq!(loaded, history);
    }

    #[tokio::test]
    async fn test_save_replaces_everything() {
        let store = SqliteStore::connect(DbConfig::in_memory()).await.unwrap();
        store.save_all(&[named("A"), named("B")]).await.unwrap();
        store.save_all(&[named("Z")]).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        store.save_all(&[]).await.unwrap();
        assert!(store.try_load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pin_hash_upsert() {
        let store = SqliteStore::connect(DbConfig::in_memory()).await.unwrap();
        store.save_pin_hash("first").await.unwrap();
        store.save_pin_hash("second").await.unwrap();
        assert_eq!(store.load_pin_hash().await.unwrap(), Some("second".to_string()));
    }

    #[tokio::test]
    async fn test_closed_pool_fails_soft() {
        let store = SqliteStore::connect(DbConfig::in_memory()).await.unwrap();
        store.close().await;
        assert!(store.try_load_all().await.is_err());
        assert!(store.load_all().await.is_empty());
    }
}
