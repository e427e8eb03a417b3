//! # Store State
//!
//! Opens the persistence backend named in the configuration.
//!
//! ## Backend Selection
//! ```text
//! store.backend ─┬─ json   ──► JsonFileStore(data_dir)
//!                ├─ sqlite ──► SqliteStore(data_dir/quotes.db), migrated
//!                └─ memory ──► MemoryStore (nothing survives the process)
//! ```
//!
//! The desk only ever sees `Arc<dyn QuoteStore>`.

use std::sync::Arc;
use tracing::info;

use quote_store::{DbConfig, JsonFileStore, MemoryStore, QuoteStore, SqliteStore};

use super::config::{DeskConfig, StoreBackend};
use crate::error::AppResult;

/// Opens the configured store.
pub async fn open_store(config: &DeskConfig) -> AppResult<Arc<dyn QuoteStore>> {
    let store: Arc<dyn QuoteStore> = match config.store.backend {
        StoreBackend::Json => {
            let dir = config.data_dir();
            info!(data_dir = %dir.display(), "Using JSON file store");
            Arc::new(JsonFileStore::new(dir))
        }
        StoreBackend::Sqlite => {
            let path = config.database_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            info!(path = %path.display(), "Using SQLite store");
            Arc::new(SqliteStore::connect(DbConfig::new(path)).await?)
        }
        StoreBackend::Memory => {
            info!("Using in-memory store, history will not be kept");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}
