//! # quote-store: Persistence Layer for the Print Quote Desk
//!
//! Loads and saves the order history and the owner PIN reference.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Print Quote Data Flow                            │
//! │                                                                         │
//! │  QuoteDesk::save()                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   quote-store (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   trait OrderStore + PinStore  (= QuoteStore)                   │   │
//! │  │        │                │                  │                    │   │
//! │  │   JsonFileStore    SqliteStore        MemoryStore               │   │
//! │  │   orders.json      quote_orders       Vec<Order>                │   │
//! │  │   owner_pin.txt    settings           (tests)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The `OrderStore` / `PinStore` traits
//! - [`json_file`] - JSON document backend
//! - [`sqlite`] - SQLite backend and pool configuration
//! - [`migrations`] - Embedded SQLite migrations
//! - [`memory`] - In-memory backend
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quote_store::{JsonFileStore, OrderStore};
//!
//! let store = JsonFileStore::new("./data");
//! let mut history = store.load_all().await;
//! history.insert(0, order);
//! store.save_all(&history).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod json_file;
pub mod memory;
pub mod migrations;
pub mod sqlite;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::{DbConfig, SqliteStore};
pub use store::{OrderStore, PinStore, QuoteStore};
