//! # quote-core: Pure Business Logic for the Print Quote Desk
//!
//! This crate is the **heart** of the quote desk. It contains the pricing
//! rules, the role/session state machine and the report formatter as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Print Quote Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                quote-desk (controller + CLI)                    │   │
//! │  │   edit order ──► recalculate ──► save ──► share / print        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ quote-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  pricing  │  │  session  │  │  report   │  │   │
//! │  │   │  Order    │  │ totals    │  │  Role     │  │ share txt │  │   │
//! │  │   │  LineItem │  │ warnings  │  │  PIN      │  │ print doc │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO TIMERS • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 quote-store (persistence)                       │   │
//! │  │            orders.json  •  SQLite table  •  memory              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, LineItem, Totals)
//! - [`pricing`] - Area/unit pricing, warnings and the share/print gate
//! - [`money`] - VND display formatting
//! - [`session`] - Staff/owner roles, PIN hashing, idle demotion
//! - [`report`] - Share text, printable document, history rows
//! - [`stats`] - Monthly revenue/profit summary
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use quote_core::pricing::recalculate;
//! use quote_core::types::{LineItem, Order};
//!
//! let mut order = Order::new();
//! order.items[0] = LineItem::blank();
//! order.items[0].set_name("Giấy in");
//! order.items[0].set_dimensions(1.2, 0.8).unwrap();
//! order.items[0].qty = 2.0;
//! order.items[0].sell_price = 50_000.0;
//!
//! let warnings = recalculate(&mut order);
//! assert!(warnings.is_empty());
//! assert!((order.totals.subtotal - 96_000.0).abs() < 1e-6);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod report;
pub mod session;
pub mod stats;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{AuthError, CoreError, GateError, ValidationError};
pub use money::Vnd;
pub use pricing::{Confirmation, ItemWarning, LineWarnings, ShareAction};
pub use session::{Capability, Role, SessionGate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Keyword that marks a line item as area-priced (paper is sold by the m²).
///
/// Matched case-insensitively as a substring of the item name.
pub const AREA_KEYWORD: &str = "giấy";

/// Unit label given to an area-priced item that has none (a roll).
pub const DEFAULT_AREA_UNIT: &str = "Cuộn";

/// Status label of a draft order.
pub const DRAFT_STATUS: &str = "Nháp";

/// Owner sessions are demoted after this many seconds without input.
pub const IDLE_LIMIT_SECS: u64 = 10 * 60;

/// How often the idle check runs.
///
/// Demotion is accurate to within one poll interval.
pub const IDLE_POLL_SECS: u64 = 15;

/// Number of customers listed in the monthly top list.
pub const TOP_CUSTOMER_COUNT: usize = 5;
