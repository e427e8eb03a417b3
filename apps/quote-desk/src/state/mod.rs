//! # State Module
//!
//! Long-lived state of a desk process.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │   DeskConfig     │  │  SessionState    │  │  Arc<dyn QuoteStore> │  │
//! │  │                  │  │                  │  │                      │  │
//! │  │  store backend   │  │  Arc<Mutex<      │  │  json / sqlite /     │  │
//! │  │  idle settings   │  │   SessionGate>>  │  │  memory              │  │
//! │  │  shop name       │  │  + IdleWatcher   │  │                      │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DeskConfig: read-only after startup                                 │
//! │  • SessionState: shared with the idle watcher task                     │
//! │  • Store: internally synchronized (pool / atomic file writes)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod session;
mod store;

pub use config::{default_config_path, DeskConfig, StoreBackend, CONFIG_FILE};
pub use session::{IdleWatcher, IdleWatcherHandle, SessionState};
pub use store::open_store;
