//! # Validation Module
//!
//! Input validation for the quote desk.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end (CLI / browser)                                    │
//! │  └── Parsing: "abc" is not a number                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Controller edits (quote-desk)                                │
//! │  └── THIS MODULE: negative fees, discount > 100%, bad PIN / month      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Pricing engine                                               │
//! │  └── NaN → 0, warnings for zero/underpriced/missing dims               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records loaded from disk are never validated here; the pricing engine
//! tolerates whatever they contain.
//!
//! ## Usage
//! ```rust
//! use quote_core::validation::{parse_month, validate_discount};
//!
//! assert!(validate_discount(10.0).is_ok());
//! assert_eq!(parse_month("2024-05").unwrap(), (2024, 5));
//! ```

use crate::error::{AuthError, ValidationError};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Normalizes a history search keyword.
///
/// Any input is accepted, including empty (matches everything). The keyword
/// is only lower-cased; a keyword no record contains simply matches nothing.
///
/// ## Returns
/// The keyword ready for [`crate::Order::matches_keyword`].
pub fn search_keyword(query: &str) -> String {
    query.to_lowercase()
}

/// Validates an owner PIN.
///
/// ## Rules
/// - Surrounding whitespace is ignored
/// - 4 to 6 characters, ASCII digits only
///
/// ## Example
/// ```rust
/// use quote_core::validation::validate_pin;
///
/// assert_eq!(validate_pin(" 1234 "), Ok("1234"));
/// assert!(validate_pin("12a4").is_err());
/// ```
pub fn validate_pin(pin: &str) -> Result<&str, AuthError> {
    let pin = pin.trim();
    if (4..=6).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(pin)
    } else {
        Err(AuthError::InvalidPinFormat)
    }
}

/// Parses a `YYYY-MM` month.
pub fn parse_month(value: &str) -> ValidationResult<(i32, u32)> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "month".to_string(),
        reason: reason.to_string(),
    };

    let (year, month) = value
        .trim()
        .split_once('-')
        .ok_or_else(|| invalid("expected YYYY-MM"))?;

    if year.len() != 4 || month.len() != 2 {
        return Err(invalid("expected YYYY-MM"));
    }
    let year: i32 = year.parse().map_err(|_| invalid("year is not a number"))?;
    let month: u32 = month.parse().map_err(|_| invalid("month is not a number"))?;
    if !(1..=12).contains(&month) {
        return Err(invalid("month must be 01-12"));
    }

    Ok((year, month))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a fee, price, quantity or dimension typed by the operator.
///
/// ## Rules
/// - Must be finite
/// - Must be non-negative (zero is allowed)
pub fn validate_non_negative(field: &str, value: f64) -> ValidationResult<f64> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a number".to_string(),
        });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(value)
}

/// Validates a discount percentage.
///
/// ## Rules
/// - Between 0 and 100 inclusive
pub fn validate_discount(percent: f64) -> ValidationResult<f64> {
    let percent = validate_non_negative("discount", percent)?;
    if percent > 100.0 {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0.0,
            max: 100.0,
        });
    }
    Ok(percent)
}

// =============================================================================
// Unit Tests
// =============================================================================
