//! # Error Types
//!
//! Domain-specific error types for quote-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  quote-core errors (this file)                                         │
//! │  ├── CoreError        - Editing / permission failures                  │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  ├── GateError        - Order not fit to share or print                │
//! │  └── AuthError        - PIN format or mismatch                         │
//! │                                                                         │
//! │  quote-store errors (separate crate)                                   │
//! │  └── StoreError       - Persistence failures                           │
//! │                                                                         │
//! │  quote-desk errors (app)                                               │
//! │  └── AppError         - What the operator sees (code + message)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are fatal: every failure is local to the session and the
//! worst outcome is an unsaved draft.

use thiserror::Error;

use crate::session::Capability;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised while editing the current order.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The active role lacks the capability.
    ///
    /// ## When This Occurs
    /// - Staff tries to edit a cost price
    /// - Staff tries to view profit or clear history
    #[error("Owner role required to {0}")]
    PermissionDenied(Capability),

    /// Line number (1-based) does not exist on the order.
    #[error("Line {line} does not exist (order has {len} lines)")]
    LineOutOfRange { line: usize, len: usize },

    /// Width/length were set on an item priced per unit.
    #[error("'{name}' is not area-priced; width and length do not apply")]
    DimensionsNotApplicable { name: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid month).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Gate Error
// =============================================================================

/// Reasons an order cannot be shared (copied) or printed.
///
/// Line numbers are 1-based, as shown to the operator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GateError {
    /// A line computes to a zero or negative amount.
    #[error("Line {line} has a zero amount; fix it before sharing or printing")]
    ZeroAmountLine { line: usize },

    /// An area-priced line lacks width or length.
    #[error("Line {line} is area-priced but is missing width or length")]
    MissingDimensions { line: usize },

    /// Print requested while a line sells below cost, without confirmation.
    #[error("Line {line} sells below cost; printing needs explicit confirmation")]
    UnderpricedNotConfirmed { line: usize },
}

// =============================================================================
// Auth Error
// =============================================================================

/// Owner PIN failures. Never carries the stored reference.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// PIN is not 4-6 digits.
    #[error("PIN must be 4-6 digits")]
    InvalidPinFormat,

    /// PIN hash does not match the stored reference.
    #[error("Incorrect PIN")]
    PinMismatch,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::LineOutOfRange { line: 4, len: 2 };
        assert_eq!(err.to_string(), "Line 4 does not exist (order has 2 lines)");

        let err = CoreError::PermissionDenied(Capability::EditCost);
        assert_eq!(err.to_string(), "Owner role required to edit cost prices");
    }

    #[test]
    fn test_auth_error_does_not_leak_reference() {
        assert_eq!(AuthError::PinMismatch.to_string(), "Incorrect PIN");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
