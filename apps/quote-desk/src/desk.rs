//! # Quote Desk
//!
//! The controller: owns the current draft and the in-memory history, and
//! wires pricing, session and store together.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  new_order() ──► current draft ◄── open_from_history(id)  (deep copy)  │
//! │                      │    ▲                                             │
//! │           edit ──────┤    └──── duplicate() (save, then copy as draft) │
//! │     (recalculated)   │                                                  │
//! │                      ▼                                                  │
//! │                   save() ──► upsert by id ──► store.save_all(history)  │
//! │                      │         (replace in place, else prepend)        │
//! │                      │                                                  │
//! │                      └── store failed? history stays as it was         │
//! │                                                                         │
//! │  share_current() / print_current(confirm) ──► gate ──► text / document │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! History is most recent first. Every edit recalculates the current order,
//! so its totals are never stale.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use quote_core::pricing::{recalculate, Confirmation, LineWarnings};
use quote_core::report::{self, HistoryRow, PrintableDocument};
use quote_core::session::PinOutcome;
use quote_core::stats::{self, MonthlyStats};
use quote_core::validation::{search_keyword, validate_discount, validate_non_negative};
use quote_core::{today, Capability, CoreError, LineItem, Order, Role};
use quote_store::{OrderStore, PinStore, QuoteStore};

use crate::error::{AppError, AppResult};
use crate::state::SessionState;

/// Prefix of exported history files.
pub const EXPORT_PREFIX: &str = "bao-gia-export";

/// Inserts or replaces `order` in `history` by id.
///
/// An existing entry is replaced in place; a new one goes to the front.
pub fn upsert(history: &mut Vec<Order>, order: Order) {
    match history.iter().position(|o| o.id == order.id) {
        Some(idx) => history[idx] = order,
        None => history.insert(0, order),
    }
}

/// The desk controller.
pub struct QuoteDesk {
    store: Arc<dyn QuoteStore>,
    session: SessionState,
    current: Order,
    history: Vec<Order>,
    shop_name: String,
}

impl QuoteDesk {
    /// Loads the history (empty if unavailable) and starts a blank draft.
    pub async fn open(store: Arc<dyn QuoteStore>, session: SessionState) -> Self {
        let history = store.load_all().await;
        info!(
            backend = store.backend(),
            orders = history.len(),
            "Quote desk ready"
        );
        let mut desk = QuoteDesk {
            store,
            session,
            current: Order::new(),
            history,
            shop_name: String::new(),
        };
        desk.recalculate();
        desk
    }

    /// Sets the shop name printed on quotes.
    pub fn with_shop_name(mut self, name: impl Into<String>) -> Self {
        self.shop_name = name.into();
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn current(&self) -> &Order {
        &self.current
    }

    pub fn history(&self) -> &[Order] {
        &self.history
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn role(&self) -> Role {
        self.session.role()
    }

    fn find(&self, id: &str) -> Option<&Order> {
        self.history.iter().find(|o| o.id == id)
    }

    /// A saved entry by id.
    pub fn history_entry(&self, id: &str) -> Option<&Order> {
        self.find(id)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Switches to the owner role.
    ///
    /// On first use the PIN becomes the reference. If storing it fails the
    /// session goes back to staff and the error is returned.
    pub async fn elevate(&mut self, pin: &str) -> AppResult<PinOutcome> {
        let stored = self.store.load_pin_hash().await?;
        let outcome = self.session.elevate(pin, stored.as_deref())?;

        if let PinOutcome::Enrolled(hash) = &outcome {
            if let Err(e) = self.store.save_pin_hash(hash).await {
                self.session.logout();
                return Err(e.into());
            }
            info!("Owner PIN enrolled");
        }
        Ok(outcome)
    }

    pub fn logout(&mut self) {
        self.session.logout();
    }

    // =========================================================================
    // Current order
    // =========================================================================

    /// Recalculates the current order and returns its warnings.
    pub fn recalculate(&mut self) -> Vec<LineWarnings> {
        recalculate(&mut self.current)
    }

    /// Warnings of the current order, from the last recalculation.
    pub fn warnings(&self) -> Vec<LineWarnings> {
        self.current
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.warnings.is_empty())
            .map(|(idx, item)| LineWarnings {
                line: idx + 1,
                warnings: item.warnings.clone(),
            })
            .collect()
    }

    /// Starts a fresh draft. Unsaved edits to the previous one are dropped.
    pub fn new_order(&mut self) -> &Order {
        self.current = Order::new();
        self.recalculate();
        debug!(id = %self.current.id, "New draft");
        &self.current
    }

    /// Makes `order` the current draft (e.g. read from a file).
    pub fn replace_current(&mut self, mut order: Order) -> Vec<LineWarnings> {
        order.ensure_line();
        self.current = order;
        self.recalculate()
    }

    /// Like [`replace_current`](Self::replace_current), for orders edited
    /// outside the desk.
    ///
    /// Staff may not change cost prices this way either: every line must
    /// carry the cost stored for it in history (0 for lines not saved yet).
    pub fn import_order(&mut self, order: Order) -> AppResult<Vec<LineWarnings>> {
        if !self.role().can(Capability::EditCost) {
            let stored = self.find(&order.id);
            let changed = order.items.iter().any(|item| {
                let stored_cost = stored
                    .and_then(|o| o.items.iter().find(|i| i.id == item.id))
                    .map_or(0.0, |i| i.cost_price);
                item.cost_price != stored_cost
            });
            if changed {
                return Err(CoreError::PermissionDenied(Capability::EditCost).into());
            }
        }
        Ok(self.replace_current(order))
    }

    /// Saves the current order into the history.
    ///
    /// ## Returns
    /// The warnings of the saved order. Warnings never block a save.
    pub async fn save(&mut self) -> AppResult<Vec<LineWarnings>> {
        let warnings = self.recalculate();
        let previous_stamp = self.current.updated_at;
        self.current.updated_at = Some(Utc::now());

        let mut next = self.history.clone();
        upsert(&mut next, self.current.clone());

        if let Err(e) = self.store.save_all(&next).await {
            self.current.updated_at = previous_stamp;
            warn!(id = %self.current.id, "Save failed, history unchanged");
            return Err(e.into());
        }

        self.history = next;
        info!(id = %self.current.id, orders = self.history.len(), "Order saved");
        Ok(warnings)
    }

    /// Saves the current order, then continues on a copy of it.
    ///
    /// The copy has a new id, no order number, today's date and draft
    /// status. If the save fails nothing changes.
    pub async fn duplicate(&mut self) -> AppResult<&Order> {
        self.save().await?;
        self.current = self.current.duplicate_as_draft(today());
        self.recalculate();
        info!(id = %self.current.id, "Duplicated into new draft");
        Ok(&self.current)
    }

    /// Continues on a draft copy of a saved entry. The current draft is
    /// dropped without saving. Returns `false` if the id is unknown.
    pub fn duplicate_from_history(&mut self, id: &str) -> bool {
        let Some(source) = self.find(id) else {
            debug!(id, "Duplicate: no such history entry");
            return false;
        };
        self.current = source.duplicate_as_draft(today());
        self.recalculate();
        true
    }

    /// Makes a copy of a saved entry the current order.
    /// Returns `false` if the id is unknown.
    pub fn open_from_history(&mut self, id: &str) -> bool {
        let Some(entry) = self.find(id) else {
            debug!(id, "Open: no such history entry");
            return false;
        };
        self.current = entry.clone();
        self.current.ensure_line();
        self.recalculate();
        true
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Entries whose customer or order number contains `keyword`
    /// (case-insensitive), in history order.
    pub fn search(&self, keyword: &str) -> Vec<&Order> {
        let keyword = search_keyword(keyword);
        self.history
            .iter()
            .filter(|o| o.matches_keyword(&keyword))
            .collect()
    }

    /// The whole history as pretty JSON.
    pub fn export_all(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(&self.history)?)
    }

    /// `bao-gia-export-YYYY-MM-DD.json`
    pub fn export_file_name(date: NaiveDate) -> String {
        format!("{}-{}.json", EXPORT_PREFIX, date.format("%Y-%m-%d"))
    }

    /// Empties the history. Owner only.
    ///
    /// ## Returns
    /// `false` (and nothing happens) for staff.
    pub async fn clear_all(&mut self) -> AppResult<bool> {
        if !self.role().can(Capability::ClearHistory) {
            debug!("Clear history refused for staff");
            return Ok(false);
        }
        self.store.save_all(&[]).await?;
        let cleared = std::mem::take(&mut self.history).len();
        info!(cleared, "History cleared");
        Ok(true)
    }

    /// History rows as the current role may see them.
    pub fn history_rows(&self, orders: &[Order]) -> Vec<HistoryRow> {
        report::history_rows(orders, self.role())
    }

    /// Revenue summary of one month. Profit is shown to the owner only.
    pub fn monthly_stats(&self, year: i32, month: u32) -> MonthlyStats {
        let summary = stats::monthly_stats(&self.history, year, month);
        if self.role().can(Capability::ViewProfit) {
            summary
        } else {
            summary.without_profit()
        }
    }

    // =========================================================================
    // Share / print
    // =========================================================================

    /// Chat summary of the current order.
    pub fn share_current(&self) -> AppResult<String> {
        Ok(report::to_share_text(&self.current)?)
    }

    /// Printable quote of the current order.
    pub fn print_current(&self, confirmation: Confirmation) -> AppResult<PrintableDocument> {
        self.print(&self.current, confirmation)
    }

    /// Chat summary of a saved entry; the current draft is untouched.
    pub fn share_history_entry(&self, id: &str) -> AppResult<Option<String>> {
        match self.find(id) {
            Some(order) => Ok(Some(report::to_share_text(order)?)),
            None => Ok(None),
        }
    }

    /// Printable quote of a saved entry; the current draft is untouched.
    pub fn print_history_entry(
        &self,
        id: &str,
        confirmation: Confirmation,
    ) -> AppResult<Option<PrintableDocument>> {
        match self.find(id) {
            Some(order) => Ok(Some(self.print(order, confirmation)?)),
            None => Ok(None),
        }
    }

    fn print(&self, order: &Order, confirmation: Confirmation) -> AppResult<PrintableDocument> {
        let doc = report::to_printable_document(order, confirmation)?;
        Ok(doc.with_shop_name(self.shop_name.clone()))
    }

    // =========================================================================
    // Editing
    // =========================================================================

    pub fn set_customer(&mut self, value: &str) {
        self.current.customer = value.trim().to_string();
    }

    pub fn set_phone(&mut self, value: &str) {
        self.current.phone = value.trim().to_string();
    }

    pub fn set_address(&mut self, value: &str) {
        self.current.address = value.trim().to_string();
    }

    pub fn set_order_no(&mut self, value: &str) {
        self.current.order_no = value.trim().to_string();
    }

    pub fn set_status(&mut self, value: &str) -> AppResult<()> {
        let value = value.trim();
        if value.is_empty() {
            return Err(AppError::validation("status is required"));
        }
        self.current.status = value.to_string();
        Ok(())
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.current.date = date;
    }

    pub fn set_shipping_fee(&mut self, fee: f64) -> AppResult<Vec<LineWarnings>> {
        self.current.shipping_fee = validate_non_negative("shipping fee", fee)?;
        Ok(self.recalculate())
    }

    pub fn set_transport_fee(&mut self, fee: f64) -> AppResult<Vec<LineWarnings>> {
        self.current.transport_fee = validate_non_negative("transport fee", fee)?;
        Ok(self.recalculate())
    }

    pub fn set_discount(&mut self, percent: f64) -> AppResult<Vec<LineWarnings>> {
        self.current.discount = validate_discount(percent)?;
        Ok(self.recalculate())
    }

    /// Line `line` (1-based) of the current order.
    fn line_mut(&mut self, line: usize) -> AppResult<&mut LineItem> {
        let index = self.current.line_index(line)?;
        Ok(self.current.item_mut(index)?)
    }

    /// Appends a blank line; returns its 1-based number.
    pub fn add_item(&mut self) -> usize {
        let idx = self.current.add_item();
        self.recalculate();
        idx + 1
    }

    /// Removes line `line` (1-based).
    pub fn remove_item(&mut self, line: usize) -> AppResult<Vec<LineWarnings>> {
        let index = self.current.line_index(line)?;
        self.current.remove_item(index)?;
        Ok(self.recalculate())
    }

    pub fn set_item_name(&mut self, line: usize, name: &str) -> AppResult<Vec<LineWarnings>> {
        self.line_mut(line)?.set_name(name.trim());
        Ok(self.recalculate())
    }

    pub fn set_item_dimensions(
        &mut self,
        line: usize,
        width: f64,
        length: f64,
    ) -> AppResult<Vec<LineWarnings>> {
        let width = validate_non_negative("width", width)?;
        let length = validate_non_negative("length", length)?;
        self.line_mut(line)?.set_dimensions(width, length)?;
        Ok(self.recalculate())
    }

    pub fn set_item_qty(&mut self, line: usize, qty: f64) -> AppResult<Vec<LineWarnings>> {
        let qty = validate_non_negative("quantity", qty)?;
        self.line_mut(line)?.qty = qty;
        Ok(self.recalculate())
    }

    pub fn set_item_unit(&mut self, line: usize, unit: &str) -> AppResult<()> {
        self.line_mut(line)?.unit = unit.trim().to_string();
        Ok(())
    }

    pub fn set_item_sell_price(&mut self, line: usize, price: f64) -> AppResult<Vec<LineWarnings>> {
        let price = validate_non_negative("sell price", price)?;
        self.line_mut(line)?.sell_price = price;
        Ok(self.recalculate())
    }

    /// Owner only.
    pub fn set_item_cost_price(&mut self, line: usize, price: f64) -> AppResult<Vec<LineWarnings>> {
        self.session.require(Capability::EditCost)?;
        let price = validate_non_negative("cost price", price)?;
        self.line_mut(line)?.cost_price = price;
        Ok(self.recalculate())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
