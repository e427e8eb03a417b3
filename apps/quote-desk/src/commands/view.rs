//! # Order View
//!
//! Plain-text rendering of one order for `show` and the shell.
//! Cost and profit lines appear for the owner only.

use std::fmt::Write;

use quote_core::money::{format_area, format_number, format_percent};
use quote_core::pricing::LineWarnings;
use quote_core::report::format_date;
use quote_core::{Capability, Order, Role, Vnd};

/// Renders `order` as the given role may see it.
pub fn render_order(order: &Order, role: Role) -> String {
    let show_cost = role.can(Capability::ViewCost);
    let show_profit = role.can(Capability::ViewProfit);
    let mut out = String::new();

    let order_no = match order.order_no.trim() {
        "" => "-",
        no => no,
    };
    let _ = writeln!(out, "Đơn {} [{}]  #{}", order_no, order.status, order.id);
    let _ = writeln!(out, "Ngày: {}", format_date(order.date));
    for (label, value) in [
        ("Khách", &order.customer),
        ("SĐT", &order.phone),
        ("Địa chỉ", &order.address),
    ] {
        if !value.trim().is_empty() {
            let _ = writeln!(out, "{}: {}", label, value.trim());
        }
    }

    out.push('\n');
    for (idx, item) in order.items.iter().enumerate() {
        let name = match item.name.trim() {
            "" => "(trống)",
            name => name,
        };
        let measure = if item.is_area_priced() {
            format!(
                "{} × {} × {} = {} m²",
                format_number(item.width),
                format_number(item.length),
                format_number(item.qty),
                format_area(item.area)
            )
        } else {
            format!("{} {}", format_number(item.qty), item.unit.trim())
        };
        let _ = write!(
            out,
            "{:>2}. {}: {} × {} = {}",
            idx + 1,
            name,
            measure.trim_end(),
            Vnd(item.sell_price),
            Vnd(item.amount)
        );
        if show_cost {
            let _ = write!(out, "  (vốn {})", Vnd(item.cost_price));
        }
        out.push('\n');
        for warning in &item.warnings {
            let _ = writeln!(out, "      ! {}", warning);
        }
    }

    let totals = &order.totals;
    out.push('\n');
    let _ = writeln!(out, "Cộng: {}", Vnd(totals.subtotal));
    if order.discount > 0.0 {
        let _ = writeln!(
            out,
            "Chiết khấu {}: {}",
            format_percent(order.discount),
            Vnd(totals.after_discount - totals.subtotal)
        );
    }
    if order.shipping_fee > 0.0 {
        let _ = writeln!(out, "Phí giao hàng: {}", Vnd(order.shipping_fee));
    }
    if order.transport_fee > 0.0 {
        let _ = writeln!(out, "Phí vận chuyển: {}", Vnd(order.transport_fee));
    }
    let _ = writeln!(out, "Tổng thanh toán: {}", Vnd(totals.customer_total));
    if show_cost {
        let _ = writeln!(out, "Giá vốn: {}", Vnd(totals.total_cost));
    }
    if show_profit {
        let _ = writeln!(
            out,
            "Lợi nhuận: {} ({})",
            Vnd(totals.profit),
            format_percent(totals.profit_percent)
        );
    }
    out
}

/// One line per warning entry, e.g. `Line 2: zero amount, ...`.
pub fn warning_notes(warnings: &[LineWarnings]) -> Vec<String> {
    warnings.iter().map(|w| format!("warning: {}", w)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote_core::pricing::recalculate;

    fn sample() -> Order {
        let mut order = Order::new();
        order.customer = "Anh Minh".to_string();
        order.order_no = "DH-01".to_string();
        let item = &mut order.items[0];
        item.set_name("Giấy in");
        item.width = 1.2;
        item.length = 0.8;
        item.qty = 2.0;
        item.sell_price = 50_000.0;
        item.cost_price = 30_000.0;
        order.add_item();
        recalculate(&mut order);
        order
    }

    #[test]
    fn test_staff_view_hides_cost_and_profit() {
        let text = render_order(&sample(), Role::Staff);
        assert!(text.contains("Đơn DH-01"));
        assert!(text.contains("1.2 × 0.8 × 2 = 1.920 m² × 50.000đ = 96.000đ"));
        assert!(text.contains("Tổng thanh toán: 96.000đ"));
        assert!(!text.contains("vốn"));
        assert!(!text.contains("Lợi nhuận"));
    }

    #[test]
    fn test_owner_view_shows_cost_and_profit() {
        let text = render_order(&sample(), Role::Owner);
        assert!(text.contains("(vốn 30.000đ)"));
        assert!(text.contains("Giá vốn: 57.600đ"));
        assert!(text.contains("Lợi nhuận: 38.400đ (40.00%)"));
    }

    #[test]
    fn test_discount_row_shows_the_amount_taken_off() {
        let mut order = sample();
        order.discount = 10.0;
        recalculate(&mut order);
        let text = render_order(&order, Role::Staff);
        assert!(text.contains("Cộng: 96.000đ"));
        assert!(text.contains("Chiết khấu 10.00%: -9.600đ"));
        assert!(text.contains("Tổng thanh toán: 86.400đ"));
    }

    #[test]
    fn test_warnings_are_listed_under_their_line() {
        let text = render_order(&sample(), Role::Staff);
        assert!(text.contains(" 2. (trống)"));
        assert!(text.contains("! zero amount"));
    }
}
