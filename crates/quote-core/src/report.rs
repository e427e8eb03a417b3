//! # Report Module
//!
//! Turns an order into what leaves the shop: a chat-ready text summary and
//! a printable quote. Also builds the rows of the history listing.
//!
//! ## Output Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Order ──► check_gate(Copy)  ──✗──► GateError (nothing produced)      │
//! │     │            │ ✓                                                    │
//! │     │            ▼                                                      │
//! │     │      to_share_text ──► "BÁO GIÁ: ... Tổng thanh toán: ..."      │
//! │     │                                                                   │
//! │     └──► check_gate(Print, confirmation) ──✗──► GateError              │
//! │                  │ ✓                                                    │
//! │                  ▼                                                      │
//! │          to_printable_document ──► PrintableDocument                   │
//! │                                      ├── Display (text table)          │
//! │                                      └── to_html()                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every figure is recomputed from the raw line input; derived fields
//! stored on the order are ignored.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::error::GateError;
use crate::money::{format_area, format_number, format_percent, Vnd};
use crate::pricing::{check_gate, recalculate, Confirmation, ShareAction};
use crate::session::{Capability, Role};
use crate::types::{LineItem, Order};

/// Shown instead of an empty customer name.
pub const NO_CUSTOMER_LABEL: &str = "(Chưa ghi khách)";

/// Title of the printed quote.
pub const DOCUMENT_TITLE: &str = "BẢNG BÁO GIÁ";

/// Dates as printed on quotes.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn customer_label(order: &Order) -> &str {
    let name = order.customer.trim();
    if name.is_empty() {
        NO_CUSTOMER_LABEL
    } else {
        name
    }
}

fn priced_copy(order: &Order) -> Order {
    let mut fresh = order.clone();
    recalculate(&mut fresh);
    fresh
}

/// "3 tờ", or just "3" when the line has no unit.
fn quantity_with_unit(item: &LineItem) -> String {
    let unit = item.unit.trim();
    if unit.is_empty() {
        format_number(item.qty)
    } else {
        format!("{} {}", format_number(item.qty), unit)
    }
}

// =============================================================================
// Share text
// =============================================================================

/// Plain-text summary for pasting into a chat.
///
/// ## Example Output
/// ```text
/// BÁO GIÁ: Anh Minh
/// Ngày: 01/05/2024
/// - Giấy in: 1.920 m² × 50.000đ = 96.000đ
/// - Dịch vụ ép: 3 tờ × 1.000đ = 3.000đ
/// Tổng thanh toán: 99.000đ
/// Giao: 12 Lê Lợi
/// ```
pub fn to_share_text(order: &Order) -> Result<String, GateError> {
    check_gate(order, ShareAction::Copy, Confirmation::NotConfirmed)?;
    let order = priced_copy(order);

    let mut lines = vec![
        format!("BÁO GIÁ: {}", customer_label(&order)),
        format!("Ngày: {}", format_date(order.date)),
    ];

    for item in &order.items {
        let measure = if item.is_area_priced() {
            format!("{} m²", format_area(item.area))
        } else {
            quantity_with_unit(item)
        };
        lines.push(format!(
            "- {}: {} × {} = {}",
            item.name.trim(),
            measure,
            Vnd(item.sell_price),
            Vnd(item.amount)
        ));
    }

    lines.push(format!("Tổng thanh toán: {}", Vnd(order.totals.customer_total)));

    let address = order.address.trim();
    if !address.is_empty() {
        lines.push(format!("Giao: {}", address));
    }

    lines.retain(|line| !line.trim().is_empty());
    Ok(lines.join("\n"))
}

// =============================================================================
// Printable document
// =============================================================================

/// Column set of the printed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLayout {
    /// At least one area-priced line: dimensions and m² are shown.
    AreaAware,
    /// Unit-priced lines only.
    Simple,
}

impl ColumnLayout {
    /// Column headers, left to right.
    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            ColumnLayout::AreaAware => &[
                "Mô tả", "Q.cách", "C.dài", "SL", "ĐVT", "m²", "Đơn giá", "Tổng giá",
            ],
            ColumnLayout::Simple => &["Mô tả", "Số lượng", "Đơn giá", "Tổng giá"],
        }
    }

    /// Whether a column holds text (left-aligned) rather than figures.
    fn is_text_column(&self, column: usize) -> bool {
        match self {
            ColumnLayout::AreaAware => column == 0 || column == 4,
            ColumnLayout::Simple => column == 0,
        }
    }

    fn row(&self, item: &LineItem) -> Vec<String> {
        match self {
            ColumnLayout::AreaAware => {
                let (width, length, area) = if item.is_area_priced() {
                    (
                        format_number(item.width),
                        format_number(item.length),
                        format_area(item.area),
                    )
                } else {
                    (String::new(), String::new(), String::new())
                };
                vec![
                    item.name.trim().to_string(),
                    width,
                    length,
                    format_number(item.qty),
                    item.unit.trim().to_string(),
                    area,
                    Vnd(item.sell_price).to_string(),
                    Vnd(item.amount).to_string(),
                ]
            }
            ColumnLayout::Simple => vec![
                item.name.trim().to_string(),
                quantity_with_unit(item),
                Vnd(item.sell_price).to_string(),
                Vnd(item.amount).to_string(),
            ],
        }
    }
}

/// A quote ready to print.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintableDocument {
    /// Optional shop name above the title.
    pub shop_name: Option<String>,
    pub title: String,
    /// Label/value pairs under the title (customer, date, order number...).
    pub header: Vec<(String, String)>,
    pub layout: ColumnLayout,
    pub rows: Vec<Vec<String>>,
    /// Label/value pairs under the table; the last one is the total due.
    pub footer: Vec<(String, String)>,
}

/// Builds the printable quote.
///
/// Printing a line that sells below cost needs `Confirmation::Confirmed`.
pub fn to_printable_document(
    order: &Order,
    confirmation: Confirmation,
) -> Result<PrintableDocument, GateError> {
    check_gate(order, ShareAction::Print, confirmation)?;
    let order = priced_copy(order);

    let layout = if order.totals.has_area_items {
        ColumnLayout::AreaAware
    } else {
        ColumnLayout::Simple
    };

    let mut header = vec![
        ("Khách hàng".to_string(), customer_label(&order).to_string()),
        ("Ngày".to_string(), format_date(order.date)),
    ];
    let optional = [
        ("Số đơn", &order.order_no),
        ("Điện thoại", &order.phone),
        ("Địa chỉ", &order.address),
    ];
    for (label, value) in optional {
        if !value.trim().is_empty() {
            header.push((label.to_string(), value.trim().to_string()));
        }
    }

    let rows = order.items.iter().map(|item| layout.row(item)).collect();

    let totals = order.totals;
    let mut footer = vec![("Cộng".to_string(), Vnd(totals.subtotal).to_string())];
    if order.discount > 0.0 {
        footer.push((
            format!("Chiết khấu {}", format_percent(order.discount)),
            Vnd(totals.after_discount - totals.subtotal).to_string(),
        ));
    }
    if order.shipping_fee > 0.0 {
        footer.push(("Phí giao hàng".to_string(), Vnd(order.shipping_fee).to_string()));
    }
    if order.transport_fee > 0.0 {
        footer.push(("Phí vận chuyển".to_string(), Vnd(order.transport_fee).to_string()));
    }
    footer.push((
        "Tổng thanh toán".to_string(),
        Vnd(totals.customer_total).to_string(),
    ));

    Ok(PrintableDocument {
        shop_name: None,
        title: DOCUMENT_TITLE.to_string(),
        header,
        layout,
        rows,
        footer,
    })
}

impl PrintableDocument {
    /// Sets the shop name printed above the title.
    pub fn with_shop_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.shop_name = if name.trim().is_empty() { None } else { Some(name) };
        self
    }

    /// The total due, as printed.
    pub fn total_due(&self) -> &str {
        self.footer.last().map(|(_, v)| v.as_str()).unwrap_or("")
    }

    fn column_widths(&self) -> Vec<usize> {
        let headers = self.layout.headers();
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (col, cell) in row.iter().enumerate() {
                widths[col] = widths[col].max(cell.chars().count());
            }
        }
        widths
    }

    /// HTML page for the browser's print dialog. All text is escaped.
    pub fn to_html(&self) -> String {
        let mut html =
            String::from("<!DOCTYPE html>\n<html lang=\"vi\">\n<head><meta charset=\"utf-8\">");
        html.push_str(&format!("<title>{}</title></head>\n<body>\n", escape_html(&self.title)));

        if let Some(shop) = &self.shop_name {
            html.push_str(&format!("<p class=\"shop\">{}</p>\n", escape_html(shop)));
        }
        html.push_str(&format!("<h1>{}</h1>\n", escape_html(&self.title)));

        html.push_str("<dl class=\"header\">\n");
        for (label, value) in &self.header {
            html.push_str(&format!(
                "<dt>{}</dt><dd>{}</dd>\n",
                escape_html(label),
                escape_html(value)
            ));
        }
        html.push_str("</dl>\n<table>\n<thead><tr>");
        for h in self.layout.headers() {
            html.push_str(&format!("<th>{}</th>", escape_html(h)));
        }
        html.push_str("</tr></thead>\n<tbody>\n");
        for row in &self.rows {
            html.push_str("<tr>");
            for cell in row {
                html.push_str(&format!("<td>{}</td>", escape_html(cell)));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n<dl class=\"footer\">\n");
        for (label, value) in &self.footer {
            html.push_str(&format!(
                "<dt>{}</dt><dd>{}</dd>\n",
                escape_html(label),
                escape_html(value)
            ));
        }
        html.push_str("</dl>\n</body>\n</html>\n");
        html
    }
}

/// Fixed-width text rendering.
impl fmt::Display for PrintableDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.column_widths();
        let rule_len = widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1);
        let rule = "-".repeat(rule_len);

        if let Some(shop) = &self.shop_name {
            writeln!(f, "{}", shop)?;
        }
        writeln!(f, "{}", self.title)?;
        for (label, value) in &self.header {
            writeln!(f, "{}: {}", label, value)?;
        }
        writeln!(f, "{}", rule)?;

        let headers: Vec<String> = self.layout.headers().iter().map(|h| h.to_string()).collect();
        let write_row = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
            let mut out = Vec::with_capacity(cells.len());
            for (col, cell) in cells.iter().enumerate() {
                let pad = widths[col].saturating_sub(cell.chars().count());
                if self.layout.is_text_column(col) {
                    out.push(format!("{}{}", cell, " ".repeat(pad)));
                } else {
                    out.push(format!("{}{}", " ".repeat(pad), cell));
                }
            }
            writeln!(f, "{}", out.join(" | ").trim_end())
        };

        write_row(f, &headers)?;
        writeln!(f, "{}", rule)?;
        for row in &self.rows {
            write_row(f, row)?;
        }
        writeln!(f, "{}", rule)?;

        let label_width = self
            .footer
            .iter()
            .map(|(l, _)| l.chars().count())
            .max()
            .unwrap_or(0);
        for (label, value) in &self.footer {
            let pad = label_width - label.chars().count();
            writeln!(f, "{}{}: {}", label, " ".repeat(pad), value)?;
        }
        Ok(())
    }
}

/// Escapes text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// =============================================================================
// History listing
// =============================================================================

/// One row of the history listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub id: String,
    pub date: NaiveDate,
    pub order_no: String,
    pub customer: String,
    pub status: String,
    pub total: f64,
    /// Present for the owner only.
    pub profit: Option<f64>,
}

impl fmt::Display for HistoryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order_no = if self.order_no.trim().is_empty() {
            "-"
        } else {
            self.order_no.trim()
        };
        write!(
            f,
            "{}  {}  {}  [{}]  {}",
            format_date(self.date),
            order_no,
            self.customer,
            self.status,
            Vnd(self.total)
        )?;
        if let Some(profit) = self.profit {
            write!(f, "  (lãi {})", Vnd(profit))?;
        }
        write!(f, "  #{}", self.id)
    }
}

/// History rows as the given role may see them, in history order.
///
/// Uses the totals stored with each snapshot.
pub fn history_rows(history: &[Order], role: Role) -> Vec<HistoryRow> {
    let show_profit = role.can(Capability::ViewProfit);
    history
        .iter()
        .map(|order| HistoryRow {
            id: order.id.clone(),
            date: order.date,
            order_no: order.order_no.clone(),
            customer: customer_label(order).to_string(),
            status: order.status.clone(),
            total: order.totals.customer_total,
            profit: show_profit.then_some(order.totals.profit),
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        let mut order = Order::new();
        order.customer = "Anh Minh".to_string();
        order.date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        order.address = "12 Lê Lợi".to_string();

        let paper = &mut order.items[0];
        paper.set_name("Giấy in");
        paper.set_dimensions(1.2, 0.8).unwrap();
        paper.qty = 2.0;
        paper.sell_price = 50_000.0;
        paper.cost_price = 30_000.0;

        let idx = order.add_item();
        let lam = &mut order.items[idx];
        lam.set_name("Dịch vụ ép");
        lam.qty = 3.0;
        lam.unit = "tờ".to_string();
        lam.sell_price = 1000.0;
        lam.cost_price = 500.0;
        order
    }

    fn unit_only_order() -> Order {
        let mut order = Order::new();
        order.date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let item = &mut order.items[0];
        item.set_name("Cắt chữ");
        item.qty = 4.0;
        item.unit = "cái".to_string();
        item.sell_price = 25_000.0;
        order
    }

    #[test]
    fn test_share_text() {
        let text = to_share_text(&sample_order()).unwrap();
        assert_eq!(
            text,
            "BÁO GIÁ: Anh Minh\n\
             Ngày: 01/05/2024\n\
             - Giấy in: 1.920 m² × 50.000đ = 96.000đ\n\
             - Dịch vụ ép: 3 tờ × 1.000đ = 3.000đ\n\
             Tổng thanh toán: 99.000đ\n\
             Giao: 12 Lê Lợi"
        );
    }

    #[test]
    fn test_share_text_placeholder_and_no_address() {
        let text = to_share_text(&unit_only_order()).unwrap();
        assert!(text.starts_with("BÁO GIÁ: (Chưa ghi khách)\n"));
        assert!(!text.contains("Giao:"));
        assert!(!text.contains("\n\n"));
    }

    #[test]
    fn test_share_refused_on_zero_amount() {
        let mut order = sample_order();
        order.add_item();
        assert_eq!(
            to_share_text(&order),
            Err(GateError::ZeroAmountLine { line: 3 })
        );
    }

    #[test]
    fn test_share_allows_underpriced() {
        let mut order = unit_only_order();
        order.items[0].cost_price = 30_000.0;
        assert!(to_share_text(&order).is_ok());
    }

    #[test]
    fn test_layout_selection() {
        let doc = to_printable_document(&sample_order(), Confirmation::NotConfirmed).unwrap();
        assert_eq!(doc.layout, ColumnLayout::AreaAware);
        assert_eq!(doc.rows[0].len(), 8);
        assert_eq!(doc.rows[0][5], "1.920");
        // Unit-priced row leaves the dimension columns empty.
        assert_eq!(doc.rows[1][1], "");
        assert_eq!(doc.total_due(), "99.000đ");

        let doc = to_printable_document(&unit_only_order(), Confirmation::NotConfirmed).unwrap();
        assert_eq!(doc.layout, ColumnLayout::Simple);
        assert_eq!(doc.rows[0], vec!["Cắt chữ", "4 cái", "25.000đ", "100.000đ"]);
    }

    #[test]
    fn test_print_needs_confirmation_when_underpriced() {
        let mut order = unit_only_order();
        order.items[0].cost_price = 30_000.0;

        assert_eq!(
            to_printable_document(&order, Confirmation::NotConfirmed),
            Err(GateError::UnderpricedNotConfirmed { line: 1 })
        );
        assert!(to_printable_document(&order, Confirmation::Confirmed).is_ok());
    }

    #[test]
    fn test_document_header_and_footer() {
        let mut order = sample_order();
        order.order_no = "DH-12".to_string();
        order.discount = 10.0;
        order.transport_fee = 5000.0;

        let doc = to_printable_document(&order, Confirmation::NotConfirmed)
            .unwrap()
            .with_shop_name("In Ấn Minh Phát");
        assert!(doc.header.contains(&("Số đơn".to_string(), "DH-12".to_string())));
        assert_eq!(doc.footer.first().unwrap().1, "99.000đ");
        // 99.000 × 0.9 + 5.000
        assert_eq!(doc.total_due(), "94.100đ");

        let text = doc.to_string();
        assert!(text.starts_with("In Ấn Minh Phát\nBẢNG BÁO GIÁ\n"));
        assert!(text.contains("Mô tả"));
        assert!(text.contains("Tổng thanh toán"));
    }

    #[test]
    fn test_html_is_escaped() {
        let mut order = unit_only_order();
        order.customer = "<script>alert('x')</script>".to_string();
        let html = to_printable_document(&order, Confirmation::NotConfirmed)
            .unwrap()
            .to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    #[test]
    fn test_history_rows_hide_profit_from_staff() {
        let mut order = sample_order();
        recalculate(&mut order);
        let history = vec![order];

        let staff = history_rows(&history, Role::Staff);
        assert_eq!(staff[0].profit, None);
        assert!(!staff[0].to_string().contains("lãi"));

        let owner = history_rows(&history, Role::Owner);
        assert!(owner[0].profit.is_some());
        assert_eq!(owner[0].total, history[0].totals.customer_total);
    }
}
