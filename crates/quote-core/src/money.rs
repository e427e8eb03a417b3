//! # Money Module
//!
//! VND amounts and their display format.
//!
//! ## Why Floating Point Here?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AREA PRICING PRODUCES FRACTIONS                                        │
//! │                                                                         │
//! │  1.2 m × 0.8 m × 2 rolls = 1.92 m²                                      │
//! │  1.92 m² × 50.000đ/m²    = 96.000đ                                      │
//! │                                                                         │
//! │  Amounts are products of real-valued areas and whole-dong prices, so    │
//! │  they are kept as f64 and rounded to whole dong ONLY for display.       │
//! │  The đồng has no minor unit, there is nothing smaller to round to.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use quote_core::money::Vnd;
//!
//! assert_eq!(Vnd(96_000.0).to_string(), "96.000đ");
//! assert_eq!(Vnd(1_234_567.4).to_string(), "1.234.567đ");
//! assert_eq!(Vnd(-1500.0).to_string(), "-1.500đ");
//! ```

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

// =============================================================================
// Number hygiene
// =============================================================================

/// Replaces NaN and infinities with zero.
///
/// Every numeric input of an order goes through this before pricing, so a
/// garbage field degrades to "0" instead of poisoning the totals.
#[inline]
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Rounds half towards positive infinity (2.5 → 3, -2.5 → -2).
#[inline]
pub fn round_half_up(value: f64) -> f64 {
    (finite_or_zero(value) + 0.5).floor()
}

// =============================================================================
// Vnd Type
// =============================================================================

/// An amount of Vietnamese đồng.
///
/// Thin wrapper used for display and summation; records store plain `f64`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Vnd(pub f64);

impl Vnd {
    /// Zero đồng.
    #[inline]
    pub const fn zero() -> Self {
        Vnd(0.0)
    }

    /// The raw value.
    #[inline]
    pub const fn value(&self) -> f64 {
        self.0
    }

    /// Value rounded to whole đồng.
    pub fn whole_dong(&self) -> i64 {
        round_half_up(self.0) as i64
    }
}

/// Formats as `96.000đ`: rounded, `.` thousands separator, `đ` suffix.
impl fmt::Display for Vnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.whole_dong();
        let sign = if whole < 0 { "-" } else { "" };
        write!(f, "{}{}đ", sign, group_thousands(whole.unsigned_abs()))
    }
}

impl Add for Vnd {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Vnd(self.0 + other.0)
    }
}

impl AddAssign for Vnd {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Vnd {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Vnd(self.0 - other.0)
    }
}

impl std::iter::Sum for Vnd {
    fn sum<I: Iterator<Item = Vnd>>(iter: I) -> Self {
        iter.fold(Vnd::zero(), |acc, v| acc + v)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

// =============================================================================
// Other numeric display
// =============================================================================

/// Area in m² with three decimals (`1.920`).
pub fn format_area(area: f64) -> String {
    format!("{:.3}", finite_or_zero(area))
}

/// Quantities and dimensions as typed: `2`, `1.5`, `0.8`.
pub fn format_number(value: f64) -> String {
    format!("{}", finite_or_zero(value))
}

/// Percentage with two decimals (`37.50%`).
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", finite_or_zero(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_grouping() {
        assert_eq!(Vnd(0.0).to_string(), "0đ");
        assert_eq!(Vnd(999.0).to_string(), "999đ");
        assert_eq!(Vnd(1000.0).to_string(), "1.000đ");
        assert_eq!(Vnd(96_000.0).to_string(), "96.000đ");
        assert_eq!(Vnd(12_345_678.0).to_string(), "12.345.678đ");
    }

    #[test]
    fn test_display_rounds_to_whole_dong() {
        assert_eq!(Vnd(999.5).to_string(), "1.000đ");
        assert_eq!(Vnd(95_999.99).to_string(), "96.000đ");
        assert_eq!(Vnd(-1500.4).to_string(), "-1.500đ");
    }

    #[test]
    fn test_non_finite_is_zero() {
        assert_eq!(finite_or_zero(f64::NAN), 0.0);
        assert_eq!(finite_or_zero(f64::INFINITY), 0.0);
        assert_eq!(Vnd(f64::NAN).to_string(), "0đ");
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(2.4), 2.0);
    }

    #[test]
    fn test_sum() {
        let total: Vnd = [Vnd(1000.0), Vnd(2500.0)].into_iter().sum();
        assert_eq!(total, Vnd(3500.0));
    }

    #[test]
    fn test_number_formats() {
        assert_eq!(format_area(1.92), "1.920");
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_percent(37.5), "37.50%");
    }
}
