//! # Pricing Engine
//!
//! Derives per-line and per-order figures from raw line input, and decides
//! whether an order may leave the shop (copied to a chat or printed).
//!
//! ## Recalculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each line, in order                                               │
//! │     │                                                                   │
//! │     ├── name contains "giấy"? ── yes ──► area = w × l × qty            │
//! │     │                                    amount = area × sell          │
//! │     │                                    cost   = area × cost_price    │
//! │     │                                                                   │
//! │     └── no ────────────────────────────► area = 0                      │
//! │                                          amount = qty × sell           │
//! │                                          cost   = qty × cost_price     │
//! │     ▼                                                                   │
//! │  warnings: MissingDimensions / Underpriced / ZeroAmount                │
//! │     ▼                                                                   │
//! │  totals: subtotal → after_discount → profit, customer_total, margin    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Recalculation writes only derived fields, so running it twice on the
//! same input yields the same order.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::GateError;
use crate::money::finite_or_zero;
use crate::types::{LineItem, Order, Totals};
use crate::AREA_KEYWORD;

// =============================================================================
// Classification
// =============================================================================

/// Whether an item with this name is priced by area.
///
/// Case-insensitive substring match on [`AREA_KEYWORD`].
pub fn is_area_priced(name: &str) -> bool {
    name.to_lowercase().contains(AREA_KEYWORD)
}

// =============================================================================
// Warnings
// =============================================================================

/// A non-fatal problem with one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ItemWarning {
    /// Area-priced line with width or length ≤ 0.
    MissingDimensions,
    /// Sell price below cost price.
    Underpriced,
    /// Line amount ≤ 0; the order cannot be shared or printed.
    ZeroAmount,
}

impl fmt::Display for ItemWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemWarning::MissingDimensions => {
                write!(f, "missing width/length for area-priced item")
            }
            ItemWarning::Underpriced => write!(f, "sell price is below cost price"),
            ItemWarning::ZeroAmount => write!(f, "zero amount, cannot be shared or printed"),
        }
    }
}

/// Warnings of one line, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineWarnings {
    pub line: usize,
    pub warnings: Vec<ItemWarning>,
}

impl fmt::Display for LineWarnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: ", self.line)?;
        for (i, w) in self.warnings.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", w)?;
        }
        Ok(())
    }
}

// =============================================================================
// Per-line evaluation
// =============================================================================

/// Derived figures for one line.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub area_priced: bool,
    pub area: f64,
    pub amount: f64,
    pub cost: f64,
    pub warnings: Vec<ItemWarning>,
}

/// Computes a line's derived figures without touching it.
pub fn evaluate_item(item: &LineItem) -> PricedLine {
    let area_priced = item.is_area_priced();
    let width = finite_or_zero(item.width);
    let length = finite_or_zero(item.length);
    let qty = finite_or_zero(item.qty);
    let sell = finite_or_zero(item.sell_price);
    let cost_price = finite_or_zero(item.cost_price);

    let mut warnings = Vec::new();

    let (area, amount, cost) = if area_priced {
        let area = width * length * qty;
        if width <= 0.0 || length <= 0.0 {
            warnings.push(ItemWarning::MissingDimensions);
        }
        (area, area * sell, area * cost_price)
    } else {
        (0.0, qty * sell, qty * cost_price)
    };

    if sell < cost_price {
        warnings.push(ItemWarning::Underpriced);
    }
    if amount <= 0.0 {
        warnings.push(ItemWarning::ZeroAmount);
    }

    PricedLine {
        area_priced,
        area,
        amount,
        cost,
        warnings,
    }
}

/// Writes a line's derived fields and returns its warnings.
pub fn price_item(item: &mut LineItem) -> Vec<ItemWarning> {
    let priced = evaluate_item(item);
    item.area = priced.area;
    item.amount = priced.amount;
    item.cost = priced.cost;
    item.warnings = priced.warnings.clone();
    priced.warnings
}

// =============================================================================
// Order totals
// =============================================================================

/// Order totals from already-priced items and the three adjustments.
pub fn compute_totals(
    items: &[LineItem],
    shipping_fee: f64,
    transport_fee: f64,
    discount_percent: f64,
) -> Totals {
    let shipping_fee = finite_or_zero(shipping_fee);
    let transport_fee = finite_or_zero(transport_fee);
    let discount_percent = finite_or_zero(discount_percent);

    let subtotal: f64 = items.iter().map(|i| i.amount).sum();
    let total_cost: f64 = items.iter().map(|i| i.cost).sum();
    let after_discount = subtotal * (1.0 - discount_percent / 100.0);
    let profit = after_discount - total_cost - shipping_fee;
    let customer_total = after_discount + shipping_fee + transport_fee;
    let profit_percent = if after_discount > 0.0 {
        profit / after_discount * 100.0
    } else {
        0.0
    };

    Totals {
        subtotal,
        after_discount,
        total_cost,
        profit,
        customer_total,
        profit_percent,
        has_area_items: items.iter().any(LineItem::is_area_priced),
    }
}

/// Recomputes every derived field of the order.
///
/// ## Returns
/// One entry per line that has warnings, in line order.
pub fn recalculate(order: &mut Order) -> Vec<LineWarnings> {
    let mut report = Vec::new();
    for (idx, item) in order.items.iter_mut().enumerate() {
        let warnings = price_item(item);
        if !warnings.is_empty() {
            report.push(LineWarnings {
                line: idx + 1,
                warnings,
            });
        }
    }

    order.totals = compute_totals(
        &order.items,
        order.shipping_fee,
        order.transport_fee,
        order.discount,
    );
    report
}

// =============================================================================
// Share / print gate
// =============================================================================

/// What the operator is about to do with the quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareAction {
    /// Copy the plain-text summary (chat, SMS).
    Copy,
    /// Produce the printable document.
    Print,
}

/// Whether the operator explicitly accepted printing below cost.
///
/// Headless callers pass `Confirmed` to override; the default never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confirmation {
    #[default]
    NotConfirmed,
    Confirmed,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::NotConfirmed
        }
    }
}

/// Checks that an order may be copied or printed.
///
/// Evaluates the lines afresh; stored derived fields are not trusted.
/// Checks run in this order over all lines: zero amounts, then missing
/// dimensions, then (print only) unconfirmed underpricing.
pub fn check_gate(
    order: &Order,
    action: ShareAction,
    confirmation: Confirmation,
) -> Result<(), GateError> {
    let priced: Vec<PricedLine> = order.items.iter().map(evaluate_item).collect();
    let first_with = |warning: ItemWarning| {
        priced
            .iter()
            .position(|p| p.warnings.contains(&warning))
            .map(|idx| idx + 1)
    };

    if let Some(line) = first_with(ItemWarning::ZeroAmount) {
        return Err(GateError::ZeroAmountLine { line });
    }
    if let Some(line) = first_with(ItemWarning::MissingDimensions) {
        return Err(GateError::MissingDimensions { line });
    }
    if action == ShareAction::Print && confirmation != Confirmation::Confirmed {
        if let Some(line) = first_with(ItemWarning::Underpriced) {
            return Err(GateError::UnderpricedNotConfirmed { line });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn paper(width: f64, length: f64, qty: f64, sell: f64, cost: f64) -> LineItem {
        let mut item = LineItem::blank();
        item.set_name("Giấy in");
        item.width = width;
        item.length = length;
        item.qty = qty;
        item.sell_price = sell;
        item.cost_price = cost;
        item
    }

    fn unit_item(name: &str, qty: f64, unit: &str, sell: f64, cost: f64) -> LineItem {
        let mut item = LineItem::blank();
        item.set_name(name);
        item.qty = qty;
        item.unit = unit.to_string();
        item.sell_price = sell;
        item.cost_price = cost;
        item
    }

    fn order_with(items: Vec<LineItem>) -> Order {
        let mut order = Order::new();
        order.items = items;
        order
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        assert!(is_area_priced("Giấy in"));
        assert!(is_area_priced("GIẤY COUCHE"));
        assert!(is_area_priced("decal giấy"));
        assert!(!is_area_priced("Dịch vụ ép"));
        assert!(!is_area_priced(""));
    }

    #[test]
    fn test_area_priced_example() {
        let mut item = paper(1.2, 0.8, 2.0, 50_000.0, 30_000.0);
        let warnings = price_item(&mut item);

        assert!((item.area - 1.92).abs() < EPS);
        assert!((item.amount - 96_000.0).abs() < EPS);
        assert!((item.cost - 57_600.0).abs() < EPS);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_zero_amount_example() {
        let mut order = order_with(vec![unit_item("Dịch vụ ép", 3.0, "tờ", 0.0, 1000.0)]);
        let report = recalculate(&mut order);

        assert_eq!(order.items[0].amount, 0.0);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].line, 1);
        assert!(report[0].warnings.contains(&ItemWarning::ZeroAmount));
        assert_eq!(
            check_gate(&order, ShareAction::Print, Confirmation::Confirmed),
            Err(GateError::ZeroAmountLine { line: 1 })
        );
    }

    #[test]
    fn test_unit_priced_ignores_dimensions() {
        let mut item = unit_item("Cắt chữ", 4.0, "cái", 25_000.0, 10_000.0);
        item.width = 3.0;
        item.length = 3.0;
        price_item(&mut item);
        assert_eq!(item.area, 0.0);
        assert_eq!(item.amount, 100_000.0);
        assert_eq!(item.cost, 40_000.0);
    }

    #[test]
    fn test_missing_dimensions_warning() {
        let mut item = paper(0.0, 2.0, 1.0, 50_000.0, 30_000.0);
        let warnings = price_item(&mut item);
        assert!(warnings.contains(&ItemWarning::MissingDimensions));
        assert!(warnings.contains(&ItemWarning::ZeroAmount));
    }

    #[test]
    fn test_underpriced_warning() {
        let mut item = unit_item("Bế demi", 2.0, "tờ", 800.0, 1000.0);
        assert_eq!(price_item(&mut item), vec![ItemWarning::Underpriced]);
    }

    #[test]
    fn test_non_finite_inputs_count_as_zero() {
        let mut item = unit_item("Cán màng", f64::NAN, "tờ", 1000.0, 0.0);
        price_item(&mut item);
        assert_eq!(item.amount, 0.0);
    }

    #[test]
    fn test_totals_composition() {
        let mut order = order_with(vec![
            paper(1.0, 2.0, 1.0, 50_000.0, 30_000.0),     // amount 100k, cost 60k
            unit_item("Cắt chữ", 2.0, "cái", 50_000.0, 10_000.0), // amount 100k, cost 20k
        ]);
        order.discount = 10.0;
        order.shipping_fee = 15_000.0;
        order.transport_fee = 5_000.0;
        recalculate(&mut order);

        let t = order.totals;
        assert!((t.subtotal - 200_000.0).abs() < EPS);
        assert!((t.after_discount - 180_000.0).abs() < EPS);
        assert!((t.total_cost - 80_000.0).abs() < EPS);
        assert!((t.profit - 85_000.0).abs() < EPS);
        assert!((t.customer_total - 200_000.0).abs() < EPS);
        assert!((t.profit_percent - 85_000.0 / 180_000.0 * 100.0).abs() < EPS);
        assert!(t.has_area_items);
    }

    #[test]
    fn test_discount_formula_holds() {
        for discount in [0.0, 5.0, 12.5, 33.0, 100.0] {
            let mut order = order_with(vec![unit_item("Decal", 3.0, "m", 12_345.0, 0.0)]);
            order.discount = discount;
            recalculate(&mut order);
            let expected = order.totals.subtotal * (1.0 - discount / 100.0);
            assert!((order.totals.after_discount - expected).abs() < EPS);
        }
    }

    #[test]
    fn test_profit_percent_zero_without_sales() {
        let mut order = order_with(vec![unit_item("Decal", 1.0, "m", 0.0, 5000.0)]);
        order.shipping_fee = 20_000.0;
        recalculate(&mut order);
        assert!(order.totals.profit < 0.0);
        assert_eq!(order.totals.profit_percent, 0.0);

        // Full discount: after_discount is 0 even though there was a subtotal.
        let mut order = order_with(vec![unit_item("Decal", 1.0, "m", 10_000.0, 5000.0)]);
        order.discount = 100.0;
        recalculate(&mut order);
        assert_eq!(order.totals.profit_percent, 0.0);
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let mut order = order_with(vec![
            paper(1.2, 0.8, 2.0, 50_000.0, 30_000.0),
            unit_item("Bế demi", 2.0, "tờ", 800.0, 1000.0),
            LineItem::blank(),
        ]);
        order.discount = 7.5;
        order.shipping_fee = 12_000.0;

        let first_report = recalculate(&mut order);
        let once = order.clone();
        let second_report = recalculate(&mut order);

        assert_eq!(order, once);
        assert_eq!(first_report, second_report);
    }

    #[test]
    fn test_classification_stable_across_unrelated_edits() {
        let mut item = paper(1.0, 1.0, 1.0, 1.0, 1.0);
        let before = item.is_area_priced();
        item.qty = 9.0;
        item.sell_price = 0.0;
        item.unit = "tờ".to_string();
        item.width = 0.0;
        assert_eq!(item.is_area_priced(), before);
    }

    #[test]
    fn test_gate_order_of_checks() {
        let order = order_with(vec![
            paper(0.0, 1.0, 1.0, 50_000.0, 30_000.0),     // missing dims + zero
            unit_item("Decal", 1.0, "m", 500.0, 1000.0),  // underpriced
        ]);
        assert_eq!(
            check_gate(&order, ShareAction::Copy, Confirmation::NotConfirmed),
            Err(GateError::ZeroAmountLine { line: 1 })
        );
    }

    #[test]
    fn test_gate_missing_dimensions_with_positive_amount() {
        // Negative width and length still multiply to a positive area.
        let order = order_with(vec![paper(-1.0, -2.0, 1.0, 50_000.0, 0.0)]);
        assert_eq!(
            check_gate(&order, ShareAction::Copy, Confirmation::NotConfirmed),
            Err(GateError::MissingDimensions { line: 1 })
        );
    }

    #[test]
    fn test_gate_underpriced_blocks_print_only() {
        let order = order_with(vec![unit_item("Decal", 2.0, "m", 500.0, 1000.0)]);

        assert!(check_gate(&order, ShareAction::Copy, Confirmation::NotConfirmed).is_ok());
        assert_eq!(
            check_gate(&order, ShareAction::Print, Confirmation::NotConfirmed),
            Err(GateError::UnderpricedNotConfirmed { line: 1 })
        );
        assert!(check_gate(&order, ShareAction::Print, Confirmation::Confirmed).is_ok());
    }

    #[test]
    fn test_gate_ignores_stale_derived_fields() {
        let mut order = order_with(vec![unit_item("Decal", 1.0, "m", 10_000.0, 0.0)]);
        recalculate(&mut order);
        order.items[0].sell_price = 0.0; // edited, not recalculated
        assert!(check_gate(&order, ShareAction::Copy, Confirmation::NotConfirmed).is_err());
    }

    #[test]
    fn test_line_warnings_display() {
        let lw = LineWarnings {
            line: 2,
            warnings: vec![ItemWarning::Underpriced, ItemWarning::ZeroAmount],
        };
        assert_eq!(
            lw.to_string(),
            "Line 2: sell price is below cost price; zero amount, cannot be shared or printed"
        );
    }
}
