//! # In-Memory Store
//!
//! Keeps history and PIN in process memory. Used by tests and by
//! `store.backend = "memory"` for throwaway sessions.
//!
//! A failure switch makes every call fail, to exercise save-failure paths.

use async_trait::async_trait;
use quote_core::Order;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::store::{OrderStore, PinStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    orders: Mutex<Vec<Order>>,
    pin_hash: Mutex<Option<String>>,
    failing: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with `orders`.
    pub fn with_orders(orders: Vec<Order>) -> Self {
        MemoryStore {
            orders: Mutex::new(orders),
            ..Self::default()
        }
    }

    /// Makes every following call fail (`true`) or succeed again (`false`).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful `save_all` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Current stored history.
    pub async fn snapshot(&self) -> Vec<Order> {
        self.orders.lock().await.clone()
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn try_load_all(&self) -> StoreResult<Vec<Order>> {
        self.check()?;
        Ok(self.orders.lock().await.clone())
    }

    async fn save_all(&self, orders: &[Order]) -> StoreResult<()> {
        self.check()?;
        *self.orders.lock().await = orders.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl PinStore for MemoryStore {
    async fn load_pin_hash(&self) -> StoreResult<Option<String>> {
        self.check()?;
        Ok(self.pin_hash.lock().await.clone())
    }

    async fn save_pin_hash(&self, hash: &str) -> StoreResult<()> {
        self.check()?;
        *self.pin_hash.lock().await = Some(hash.to_string());
        Ok(())
    }
}
