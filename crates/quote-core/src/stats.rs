//! # Monthly Statistics
//!
//! Revenue, profit and best customers for one calendar month of history.
//!
//! Figures come from the totals stored with each saved snapshot, which is
//! what the customer was quoted at the time.

use chrono::Datelike;
use serde::Serialize;
use std::fmt;

use crate::money::Vnd;
use crate::types::Order;
use crate::TOP_CUSTOMER_COUNT;

/// Customer bucket for orders saved without a name.
pub const WALK_IN_LABEL: &str = "(Khách lẻ)";

/// Revenue of one customer within the month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRevenue {
    pub customer: String,
    pub revenue: f64,
    pub orders: usize,
}

/// Summary of one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub year: i32,
    pub month: u32,
    pub order_count: usize,
    /// Σ customer totals.
    pub revenue: f64,
    /// Σ profits. Hidden from staff by the caller.
    pub profit: Option<f64>,
    /// Up to five customers, highest revenue first.
    pub top_customers: Vec<CustomerRevenue>,
}

impl MonthlyStats {
    /// Drops the profit figure.
    pub fn without_profit(mut self) -> Self {
        self.profit = None;
        self
    }
}

impl fmt::Display for MonthlyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tháng {:02}/{}", self.month, self.year)?;
        writeln!(f, "Số đơn: {}", self.order_count)?;
        writeln!(f, "Doanh thu: {}", Vnd(self.revenue))?;
        if let Some(profit) = self.profit {
            writeln!(f, "Lợi nhuận: {}", Vnd(profit))?;
        }
        if !self.top_customers.is_empty() {
            writeln!(f, "Khách hàng nổi bật:")?;
            for (rank, c) in self.top_customers.iter().enumerate() {
                writeln!(
                    f,
                    "  {}. {}: {} ({} đơn)",
                    rank + 1,
                    c.customer,
                    Vnd(c.revenue),
                    c.orders
                )?;
            }
        }
        Ok(())
    }
}

/// Aggregates the orders dated in `year`-`month`.
///
/// Customers are grouped by trimmed name; ties in revenue keep the order in
/// which the customer first appears in history.
pub fn monthly_stats(history: &[Order], year: i32, month: u32) -> MonthlyStats {
    let in_month: Vec<&Order> = history
        .iter()
        .filter(|o| o.date.year() == year && o.date.month() == month)
        .collect();

    let mut customers: Vec<CustomerRevenue> = Vec::new();
    for order in &in_month {
        let name = match order.customer.trim() {
            "" => WALK_IN_LABEL,
            name => name,
        };
        match customers.iter_mut().find(|c| c.customer == name) {
            Some(entry) => {
                entry.revenue += order.totals.customer_total;
                entry.orders += 1;
            }
            None => customers.push(CustomerRevenue {
                customer: name.to_string(),
                revenue: order.totals.customer_total,
                orders: 1,
            }),
        }
    }
    // Stable sort keeps first-seen order among equal revenues.
    customers.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    customers.truncate(TOP_CUSTOMER_COUNT);

    MonthlyStats {
        year,
        month,
        order_count: in_month.len(),
        revenue: in_month.iter().map(|o| o.totals.customer_total).sum(),
        profit: Some(in_month.iter().map(|o| o.totals.profit).sum()),
        top_customers: customers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn saved(customer: &str, date: (i32, u32, u32), total: f64, profit: f64) -> Order {
        let mut order = Order::new();
        order.customer = customer.to_string();
        order.date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        order.totals.customer_total = total;
        order.totals.profit = profit;
        order
    }

    #[test]
    fn test_only_requested_month_counts() {
        let history = vec![
            saved("Lan", (2024, 5, 3), 100_000.0, 30_000.0),
            saved("Minh", (2024, 4, 30), 999_000.0, 1.0),
            saved("Lan", (2024, 5, 28), 50_000.0, 10_000.0),
            saved("Lan", (2023, 5, 3), 777_000.0, 1.0),
        ];
        let stats = monthly_stats(&history, 2024, 5);
        assert_eq!(stats.order_count, 2);
        assert_eq!(stats.revenue, 150_000.0);
        assert_eq!(stats.profit, Some(40_000.0));
        assert_eq!(stats.top_customers.len(), 1);
        assert_eq!(stats.top_customers[0].orders, 2);
    }

    #[test]
    fn test_top_customers_ranked_and_capped() {
        let history: Vec<Order> = [
            ("A", 10.0),
            ("B", 60.0),
            ("", 30.0),
            ("C", 30.0),
            ("D", 5.0),
            ("E", 1.0),
            ("F", 2.0),
        ]
        .iter()
        .map(|(c, t)| saved(c, (2024, 6, 1), *t, 0.0))
        .collect();

        let stats = monthly_stats(&history, 2024, 6);
        let names: Vec<&str> = stats
            .top_customers
            .iter()
            .map(|c| c.customer.as_str())
            .collect();
        assert_eq!(names, vec!["B", WALK_IN_LABEL, "C", "A", "D"]);
    }

    #[test]
    fn test_empty_month() {
        let stats = monthly_stats(&[], 2024, 1);
        assert_eq!(stats.order_count, 0);
        assert_eq!(stats.revenue, 0.0);
        assert!(stats.top_customers.is_empty());
        assert!(stats.to_string().contains("Tháng 01/2024"));
    }

    #[test]
    fn test_without_profit_hides_line() {
        let history = vec![saved("Lan", (2024, 5, 3), 100_000.0, 30_000.0)];
        let stats = monthly_stats(&history, 2024, 5).without_profit();
        assert_eq!(stats.profit, None);
        assert!(!stats.to_string().contains("Lợi nhuận"));
    }
}
