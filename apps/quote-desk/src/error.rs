//! # App Error Type
//!
//! Unified error type for desk operations and CLI commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Quote Desk                         │
//! │                                                                         │
//! │  QuoteDesk / command                                                    │
//! │  Result<T, AppError>                                                    │
//! │         │                                                               │
//! │         ├── GateError      ─► GATE_BLOCKED      "Line 2 has a zero..."  │
//! │         ├── AuthError      ─► AUTH_FAILED       "Incorrect PIN"         │
//! │         ├── CoreError      ─► PERMISSION_DENIED / VALIDATION_ERROR      │
//! │         ├── StoreError     ─► STORE_ERROR       (details logged)        │
//! │         └── ConfigError    ─► CONFIG_ERROR                              │
//! │                                                                         │
//! │  CLI prints "error[CODE]: message" to stderr and exits non-zero;       │
//! │  the shell prints it and keeps going.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! A browser front end receives:
//! ```json
//! { "code": "GATE_BLOCKED", "message": "Line 1 has a zero amount; ..." }
//! ```

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use quote_core::{AuthError, CoreError, GateError, ValidationError};
use quote_store::StoreError;

/// Error returned by desk operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed
    ValidationError,

    /// Owner role required
    PermissionDenied,

    /// PIN malformed or wrong
    AuthFailed,

    /// Order cannot be shared or printed yet
    GateBlocked,

    /// No saved quote with that id
    NotFound,

    /// Persistence failed
    StoreError,

    /// Configuration could not be loaded
    ConfigError,

    /// Bad command-line usage
    Usage,

    /// Anything else
    Internal,
}

impl ErrorCode {
    /// The code as printed by the CLI (`GATE_BLOCKED`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::AuthFailed => "AUTH_FAILED",
            ErrorCode::GateBlocked => "GATE_BLOCKED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::StoreError => "STORE_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::Usage => "USAGE",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl AppError {
    /// Creates a new app error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ValidationError, message)
    }

    /// No saved quote with `id`.
    pub fn not_found(id: &str) -> Self {
        AppError::new(ErrorCode::NotFound, format!("No saved quote with id {}", id))
    }

    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Usage, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Internal, message)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error[{}]: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}

/// Converts core errors to app errors.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::PermissionDenied(_) => {
                AppError::new(ErrorCode::PermissionDenied, err.to_string())
            }
            CoreError::LineOutOfRange { .. } | CoreError::DimensionsNotApplicable { .. } => {
                AppError::validation(err.to_string())
            }
            CoreError::Validation(e) => AppError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        AppError::new(ErrorCode::GateBlocked, err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::new(ErrorCode::AuthFailed, err.to_string())
    }
}

/// Converts store errors to app errors.
///
/// The operator sees a short message; the details go to the log.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "Store operation failed");
        let message = match &err {
            StoreError::Io { path, .. } => format!("Could not write {}", path.display()),
            StoreError::Corrupt(_) => "Stored history is not valid JSON".to_string(),
            StoreError::ConnectionFailed(_) => "Database connection failed".to_string(),
            StoreError::MigrationFailed(_) => "Database migration failed".to_string(),
            StoreError::QueryFailed(_) => "Database operation failed".to_string(),
            StoreError::Unavailable(_) => "Storage is unavailable".to_string(),
        };
        AppError::new(ErrorCode::StoreError, message)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::validation(format!("Invalid order JSON: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

// =============================================================================
// Config Error
// =============================================================================

/// Errors while loading `quote-desk.toml` and the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// An environment override has an unusable value.
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    /// The merged configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for desk operations.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use quote_core::Capability;

    #[test]
    fn test_codes_follow_error_class() {
        let err: AppError = CoreError::PermissionDenied(Capability::ClearHistory).into();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err: AppError = GateError::ZeroAmountLine { line: 2 }.into();
        assert_eq!(err.code, ErrorCode::GateBlocked);

        let err: AppError = AuthError::PinMismatch.into();
        assert_eq!(err.code, ErrorCode::AuthFailed);
        assert_eq!(err.message, "Incorrect PIN");
    }

    #[test]
    fn test_store_error_hides_details() {
        let err: AppError = StoreError::QueryFailed("no such table: quote_orders".into()).into();
        assert_eq!(err.code, ErrorCode::StoreError);
        assert!(!err.message.contains("quote_orders"));
    }

    #[test]
    fn test_serialized_shape() {
        let err = AppError::usage("unknown command 'frobnicate'");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "USAGE");
        assert_eq!(json["message"], "unknown command 'frobnicate'");
        assert_eq!(err.to_string(), "error[USAGE]: unknown command 'frobnicate'");
    }

    #[test]
    fn test_code_strings_match_serde() {
        for code in [ErrorCode::GateBlocked, ErrorCode::NotFound, ErrorCode::StoreError] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
        }
    }
}
