//! # Domain Types
//!
//! Core domain types used throughout the quote desk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │    LineItem     │   │     Totals      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │──►│  id (UUID)      │   │  subtotal       │       │
//! │  │  order_no       │   │  name           │   │  after_discount │       │
//! │  │  customer ...   │   │  width × length │   │  profit ...     │       │
//! │  │  items (≥ 1)    │   │  qty, prices    │   │  (derived)      │       │
//! │  │  totals ────────┼──────────────────────►│                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every order has:
//! - `id`: UUID v4 - immutable, used for history upserts
//! - `order_no`: typed by the operator, may be blank, cleared on duplicate
//!
//! ## Derived Fields
//! `area`, `amount`, `cost`, `warnings` and `totals` are written only by
//! [`crate::pricing::recalculate`]. Read them after a recalculation, never
//! after a raw edit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::pricing::{is_area_priced, ItemWarning};
use crate::{DEFAULT_AREA_UNIT, DRAFT_STATUS};

/// Today's date (UTC), the default date of a new or duplicated order.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// =============================================================================
// Line Item
// =============================================================================

/// One line of a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct LineItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Free-text description. Decides area vs unit pricing.
    pub name: String,

    /// Width in metres (area-priced items only).
    pub width: f64,

    /// Length in metres (area-priced items only).
    pub length: f64,

    /// Quantity (rolls, sheets, pieces...).
    pub qty: f64,

    /// Unit label shown next to the quantity.
    pub unit: String,

    /// Derived: width × length × qty, or 0 for unit-priced items.
    pub area: f64,

    /// Sell price per m² or per unit.
    pub sell_price: f64,

    /// Cost price per m² or per unit. Owner-only field.
    pub cost_price: f64,

    /// Derived: revenue of this line.
    pub amount: f64,

    /// Derived: cost of this line.
    pub cost: f64,

    /// Derived: warnings from the last recalculation.
    pub warnings: Vec<ItemWarning>,
}

impl LineItem {
    /// A blank line: no name, quantity 1, everything else zero.
    pub fn blank() -> Self {
        LineItem {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            width: 0.0,
            length: 0.0,
            qty: 1.0,
            unit: String::new(),
            area: 0.0,
            sell_price: 0.0,
            cost_price: 0.0,
            amount: 0.0,
            cost: 0.0,
            warnings: Vec::new(),
        }
    }

    /// Whether this line is priced by area. Depends on the name only.
    #[inline]
    pub fn is_area_priced(&self) -> bool {
        is_area_priced(&self.name)
    }

    /// Renames the item.
    ///
    /// If the rename flips the pricing mode, width/length/area are reset.
    /// An area-priced item without a unit gets the default roll unit.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let was_area = self.is_area_priced();
        self.name = name.into();
        let is_area = self.is_area_priced();

        if was_area != is_area {
            self.width = 0.0;
            self.length = 0.0;
            self.area = 0.0;
        }
        if is_area && self.unit.trim().is_empty() {
            self.unit = DEFAULT_AREA_UNIT.to_string();
        }
    }

    /// Sets width and length. Only valid on area-priced items.
    pub fn set_dimensions(&mut self, width: f64, length: f64) -> CoreResult<()> {
        if !self.is_area_priced() {
            return Err(CoreError::DimensionsNotApplicable {
                name: self.name.clone(),
            });
        }
        self.width = width;
        self.length = length;
        Ok(())
    }
}

impl Default for LineItem {
    fn default() -> Self {
        LineItem::blank()
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Order-level figures derived from the items and the adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Totals {
    /// Sum of line amounts.
    pub subtotal: f64,
    /// Subtotal after the percentage discount.
    pub after_discount: f64,
    /// Sum of line costs.
    pub total_cost: f64,
    /// after_discount − total_cost − shipping_fee.
    pub profit: f64,
    /// after_discount + shipping_fee + transport_fee.
    pub customer_total: f64,
    /// profit / after_discount × 100, or 0 when nothing was sold.
    pub profit_percent: f64,
    /// Whether any line is area-priced (selects the print layout).
    pub has_area_items: bool,
}

// =============================================================================
// Order
// =============================================================================

/// A quote for one customer.
///
/// ## Invariants
/// - `items` is never empty (a blank line stands in for "nothing yet")
/// - `totals` is a pure function of `items` + the three adjustments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Order {
    pub id: String,

    /// Free-text lifecycle tag. `Nháp` is draft.
    pub status: String,

    pub customer: String,
    pub phone: String,
    pub address: String,

    /// Quote date (`YYYY-MM-DD`).
    #[ts(as = "String")]
    pub date: NaiveDate,

    /// Operator-typed order number, may be blank.
    pub order_no: String,

    /// Shipping paid by the shop (reduces profit, billed to customer).
    pub shipping_fee: f64,

    /// Transport billed to the customer.
    pub transport_fee: f64,

    /// Discount in percent (10 = 10%).
    pub discount: f64,

    pub items: Vec<LineItem>,

    pub totals: Totals,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Set on every save.
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// A fresh draft: new id, today's date, one blank line.
    pub fn new() -> Self {
        Order {
            id: Uuid::new_v4().to_string(),
            status: DRAFT_STATUS.to_string(),
            customer: String::new(),
            phone: String::new(),
            address: String::new(),
            date: today(),
            order_no: String::new(),
            shipping_fee: 0.0,
            transport_fee: 0.0,
            discount: 0.0,
            items: vec![LineItem::blank()],
            totals: Totals::default(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Whether the order is still a draft.
    pub fn is_draft(&self) -> bool {
        self.status == DRAFT_STATUS
    }

    /// Restores the "at least one line" invariant (e.g. after decoding).
    pub fn ensure_line(&mut self) {
        if self.items.is_empty() {
            self.items.push(LineItem::blank());
        }
    }

    /// Appends a blank line and returns its index.
    pub fn add_item(&mut self) -> usize {
        self.items.push(LineItem::blank());
        self.items.len() - 1
    }

    /// Index of 1-based line number `line`.
    pub fn line_index(&self, line: usize) -> CoreResult<usize> {
        let len = self.items.len();
        if line == 0 || line > len {
            return Err(CoreError::LineOutOfRange { line, len });
        }
        Ok(line - 1)
    }

    /// Removes a line. Removing the last line leaves a blank one.
    pub fn remove_item(&mut self, index: usize) -> CoreResult<LineItem> {
        if index >= self.items.len() {
            return Err(CoreError::LineOutOfRange {
                line: index.saturating_add(1),
                len: self.items.len(),
            });
        }
        let removed = self.items.remove(index);
        self.ensure_line();
        Ok(removed)
    }

    /// Mutable access to a line by index.
    pub fn item_mut(&mut self, index: usize) -> CoreResult<&mut LineItem> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(CoreError::LineOutOfRange {
                line: index.saturating_add(1),
                len,
            })
    }

    /// A copy under a new identity: order number cleared, dated `date`,
    /// back to draft. Lines and customer data are kept.
    pub fn duplicate_as_draft(&self, date: NaiveDate) -> Order {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4().to_string();
        copy.order_no.clear();
        copy.date = date;
        copy.status = DRAFT_STATUS.to_string();
        copy.created_at = Utc::now();
        copy.updated_at = None;
        copy
    }

    /// Case-insensitive match on customer name and order number.
    ///
    /// `keyword` must already be lower-cased.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        format!("{} {}", self.customer, self.order_no)
            .to_lowercase()
            .contains(keyword)
    }
}

impl Default for Order {
    fn default() -> Self {
        Order::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_defaults() {
        let order = Order::new();
        assert!(order.is_draft());
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].qty, 1.0);
        assert!(order.order_no.is_empty());
        assert_eq!(order.date, today());
        assert!(order.updated_at.is_none());
    }

    #[test]
    fn test_rename_into_area_pricing_sets_roll_unit() {
        let mut item = LineItem::blank();
        item.set_name("Giấy couche");
        assert!(item.is_area_priced());
        assert_eq!(item.unit, DEFAULT_AREA_UNIT);
    }

    #[test]
    fn test_rename_out_of_area_pricing_resets_dimensions() {
        let mut item = LineItem::blank();
        item.set_name("Giấy in");
        item.set_dimensions(1.2, 0.8).unwrap();
        item.area = 0.96;

        item.set_name("Dịch vụ ép");
        assert!(!item.is_area_priced());
        assert_eq!((item.width, item.length, item.area), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_rename_within_mode_keeps_dimensions() {
        let mut item = LineItem::blank();
        item.set_name("Giấy in");
        item.set_dimensions(1.2, 0.8).unwrap();
        item.set_name("Giấy in màu");
        assert_eq!((item.width, item.length), (1.2, 0.8));
    }

    #[test]
    fn test_dimensions_rejected_on_unit_item() {
        let mut item = LineItem::blank();
        item.set_name("Cắt chữ");
        assert!(matches!(
            item.set_dimensions(1.0, 1.0),
            Err(CoreError::DimensionsNotApplicable { .. })
        ));
    }

    #[test]
    fn test_remove_last_item_leaves_blank_line() {
        let mut order = Order::new();
        order.items[0].set_name("Decal");
        let removed = order.remove_item(0).unwrap();
        assert_eq!(removed.name, "Decal");
        assert_eq!(order.items.len(), 1);
        assert!(order.items[0].name.is_empty());
        assert!(order.remove_item(5).is_err());
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        let mut order = Order::new();
        order.add_item();
        assert_eq!(order.line_index(1).unwrap(), 0);
        assert_eq!(order.line_index(2).unwrap(), 1);

        let err = order.line_index(0).unwrap_err();
        assert_eq!(err.to_string(), "Line 0 does not exist (order has 2 lines)");
        let err = order.line_index(5).unwrap_err();
        assert_eq!(err.to_string(), "Line 5 does not exist (order has 2 lines)");

        let err = order.item_mut(2).unwrap_err();
        assert_eq!(err.to_string(), "Line 3 does not exist (order has 2 lines)");
    }

    #[test]
    fn test_duplicate_as_draft() {
        let mut order = Order::new();
        order.order_no = "DH-7".to_string();
        order.status = "Đã giao".to_string();
        order.customer = "Anh Minh".to_string();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        let copy = order.duplicate_as_draft(date);
        assert_ne!(copy.id, order.id);
        assert!(copy.order_no.is_empty());
        assert!(copy.is_draft());
        assert_eq!(copy.date, date);
        assert_eq!(copy.customer, "Anh Minh");
        assert_eq!(order.order_no, "DH-7");
    }

    #[test]
    fn test_matches_keyword() {
        let mut order = Order::new();
        order.customer = "Cô Lan".to_string();
        order.order_no = "DH-0042".to_string();
        assert!(order.matches_keyword("lan"));
        assert!(order.matches_keyword("dh-00"));
        assert!(order.matches_keyword(""));
        assert!(!order.matches_keyword("hùng"));
    }

    #[test]
    fn test_json_field_names() {
        let order = Order::new();
        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("orderNo").is_some());
        assert!(json.get("shippingFee").is_some());
        assert!(json["items"][0].get("sellPrice").is_some());
        assert!(json["totals"].get("customerTotal").is_some());
        assert!(json["createdAt"].is_string());
        assert_eq!(json["date"], serde_json::json!(today().to_string()));
    }

    #[test]
    fn test_lenient_decode_of_sparse_record() {
        let json = r#"{"id":"abc","date":"2024-03-05","items":[],"totals":{}}"#;
        let mut order: Order = serde_json::from_str(json).unwrap();
        order.ensure_line();
        assert_eq!(order.id, "abc");
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.totals, Totals::default());
    }
}
