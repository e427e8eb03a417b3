//! # Store Traits
//!
//! The persistence seam between the quote desk and its backends.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  QuoteDesk ──► Arc<dyn QuoteStore>                                     │
//! │                   │                                                     │
//! │                   ├── try_load_all()  whole history, most recent first │
//! │                   ├── load_all()      same, but empty on any failure   │
//! │                   ├── save_all(&[..]) whole history, all or nothing    │
//! │                   ├── load_pin_hash() owner PIN reference, if enrolled │
//! │                   └── save_pin_hash()                                  │
//! │                                                                         │
//! │  No partial updates, no locking: the last save_all wins in full.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use quote_core::Order;
use tracing::warn;

use crate::error::StoreResult;

/// Persistent order history.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Loads the whole history. A missing store is an empty history.
    async fn try_load_all(&self) -> StoreResult<Vec<Order>>;

    /// Loads the whole history, falling back to empty on failure.
    async fn load_all(&self) -> Vec<Order> {
        match self.try_load_all().await {
            Ok(orders) => orders,
            Err(e) => {
                warn!(backend = self.backend(), error = %e, "History unavailable, starting empty");
                Vec::new()
            }
        }
    }

    /// Replaces the stored history with `orders`.
    async fn save_all(&self, orders: &[Order]) -> StoreResult<()>;
}

/// Persistent owner PIN reference.
#[async_trait]
pub trait PinStore: Send + Sync {
    /// The stored SHA-256 hex of the owner PIN, if one was ever set.
    async fn load_pin_hash(&self) -> StoreResult<Option<String>>;

    async fn save_pin_hash(&self, hash: &str) -> StoreResult<()>;
}

/// A backend holding both the history and the PIN reference.
pub trait QuoteStore: OrderStore + PinStore {}

impl<T: OrderStore + PinStore> QuoteStore for T {}

/// Fixes up records read from storage: every order gets at least one line.
pub(crate) fn normalize(mut orders: Vec<Order>) -> Vec<Order> {
    for order in &mut orders {
        order.ensure_line();
    }
    orders
}
