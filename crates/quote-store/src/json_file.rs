//! # JSON Document Store
//!
//! History as one pretty-printed JSON array in `orders.json`, PIN hash as
//! a single line in `owner_pin.txt`, both inside one data directory.
//!
//! ## Write Path
//! ```text
//! save_all(orders)
//!     │
//!     ├── create_dir_all(data_dir)
//!     ├── write  orders.json.tmp   (full document)
//!     └── rename orders.json.tmp → orders.json
//!
//! A crash mid-write leaves the previous orders.json intact.
//! ```

use async_trait::async_trait;
use quote_core::Order;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::store::{normalize, OrderStore, PinStore};

/// History file name inside the data directory.
pub const ORDERS_FILE: &str = "orders.json";

/// PIN reference file name inside the data directory.
pub const PIN_FILE: &str = "owner_pin.txt";

/// File-backed store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    /// A store in `data_dir`. Nothing is touched until the first call.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        JsonFileStore {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn orders_path(&self) -> PathBuf {
        self.data_dir.join(ORDERS_FILE)
    }

    pub fn pin_path(&self) -> PathBuf {
        self.data_dir.join(PIN_FILE)
    }

    /// Reads a file, mapping "not found" to `None`.
    async fn read_optional(path: &Path) -> StoreResult<Option<String>> {
        match fs::read_to_string(path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Writes `contents` next to `path` and renames it into place.
    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> StoreResult<()> {
        fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| StoreError::io(&self.data_dir, e))?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let result = match fs::write(&tmp, contents).await {
            Ok(()) => fs::rename(&tmp, path)
                .await
                .map_err(|e| StoreError::io(path, e)),
            Err(e) => Err(StoreError::io(&tmp, e)),
        };
        if let Err(err) = &result {
            warn!(path = %path.display(), error = %err, "Write failed, previous file kept");
            if let Err(e) = fs::remove_file(&tmp).await {
                debug!(path = %tmp.display(), error = %e, "No temp file to remove");
            }
        }
        result
    }
}

/// Parses the history document.
///
/// Records that do not decode as orders are skipped with a warning rather
/// than discarding the whole history.
fn parse_history(text: &str) -> StoreResult<Vec<Order>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let records: Vec<serde_json::Value> = serde_json::from_str(text)?;
    let mut orders = Vec::with_capacity(records.len());
    for (idx, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Order>(record) {
            Ok(order) => orders.push(order),
            Err(e) => warn!(index = idx, error = %e, "Skipping unreadable history record"),
        }
    }
    Ok(normalize(orders))
}

#[async_trait]
impl OrderStore for JsonFileStore {
    fn backend(&self) -> &'static str {
        "json"
    }

    async fn try_load_all(&self) -> StoreResult<Vec<Order>> {
        let path = self.orders_path();
        let Some(text) = Self::read_optional(&path).await? else {
            debug!(path = %path.display(), "No history file yet");
            return Ok(Vec::new());
        };
        let orders = parse_history(&text)?;
        debug!(path = %path.display(), count = orders.len(), "History loaded");
        Ok(orders)
    }

    async fn save_all(&self, orders: &[Order]) -> StoreResult<()> {
        let path = self.orders_path();
        let json = serde_json::to_vec_pretty(orders)?;
        self.write_atomic(&path, &json).await?;
        info!(path = %path.display(), count = orders.len(), "History saved");
        Ok(())
    }
}

#[async_trait]
impl PinStore for JsonFileStore {
    async fn load_pin_hash(&self) -> StoreResult<Option<String>> {
        let text = Self::read_optional(&self.pin_path()).await?;
        Ok(text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }

    async fn save_pin_hash(&self, hash: &str) -> StoreResult<()> {
        self.write_atomic(&self.pin_path(), hash.as_bytes()).await?;
        info!("Owner PIN reference stored");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
