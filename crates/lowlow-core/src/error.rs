//! # Error Types
//!
//! Domain-specific error types for lowlow-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lowlow-core errors (this file)                                        │
//! │  ├── CoreError        - Business-rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  lowlow-db errors (separate crate)                                     │
//! │  └── DbError          - Storage failures (+ CoreError raised in a tx)  │
//! │                                                                         │
//! │  marketplace errors (app)                                              │
//! │  └── ApiError         - What the UI sees: { code, message }            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → UI dialog    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, amounts)
//! 3. Errors are enum variants, never strings to be matched on
//! 4. Messages here are for logs; the UI text lives in `ApiError`

use std::fmt;

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business-rule errors.
///
/// Each rule has its own variant so callers match on the kind, never on the
/// message text.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Partnership request not found: {0}")]
    RequestNotFound(String),

    /// Registration or an email edit hit an existing account.
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// Unknown email, wrong password, or a deactivated account.
    ///
    /// The three cases are deliberately indistinguishable to the caller.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The operation needs a logged-in session.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The session user's role may not perform the action.
    #[error("Role {role} may not {action}")]
    PermissionDenied { action: String, role: String },

    /// Checkout needs a default card and the buyer has none.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart ──► Checkout
    ///            │
    ///            ▼
    ///      default card? ── no ──► NoDefaultCard ──► "Добавьте карту для оплаты"
    ///            │
    ///           yes ──► funds check ──► ...
    /// ```
    #[error("User {user_id} has no default card")]
    NoDefaultCard { user_id: String },

    /// The paying card or the account balance cannot cover the total.
    #[error("Insufficient funds on {funds}: available {available}, required {required}")]
    InsufficientFunds {
        funds: FundsSource,
        available: i64,
        required: i64,
    },

    /// Order status change that the lifecycle does not allow.
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        order_id: String,
        from: String,
        to: String,
    },

    #[error("Order has no items")]
    EmptyOrder,

    #[error("Order cannot have more than {max} items")]
    OrderTooLarge { max: usize },

    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// The declared total disagrees with the sum of the lines.
    #[error("Order total {declared} does not match items sum {computed}")]
    TotalMismatch { declared: i64, computed: i64 },

    /// A cart line prices a menu item differently from the catalog.
    #[error("Price of {product_id} is {catalog}, cart says {declared}")]
    PriceMismatch {
        product_id: String,
        declared: i64,
        catalog: i64,
    },

    /// Wrong, expired, or already consumed password-reset code.
    #[error("Invalid or expired reset code")]
    InvalidResetCode,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a PermissionDenied error.
    pub fn forbidden(action: impl Into<String>, role: impl fmt::Display) -> Self {
        CoreError::PermissionDenied {
            action: action.into(),
            role: role.to_string(),
        }
    }
}

/// Where money is drawn from at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundsSource {
    /// The buyer's default card.
    Card,
    /// The buyer's account balance.
    Account,
}

impl fmt::Display for FundsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FundsSource::Card => f.write_str("card"),
            FundsSource::Account => f.write_str("account"),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., email without '@', expiry not MM/YY).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A confirmation value does not match (password / confirm password).
    #[error("{field} does not match its confirmation")]
    Mismatch { field: String },

    /// A checkbox-style agreement was not given.
    #[error("{field} must be accepted")]
    NotAccepted { field: String },

    /// A date-bound value is in the past (card expiry).
    #[error("{field} has expired")]
    Expired { field: String },
}

impl ValidationError {
    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::Mismatch { field }
            | ValidationError::NotAccepted { field }
            | ValidationError::Expired { field } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientFunds {
            funds: FundsSource::Card,
            available: 1_000,
            required: 5_000,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds on card: available 1000, required 5000"
        );

        let err = CoreError::forbidden("update order status", "user");
        assert_eq!(err.to_string(), "Role user may not update order status");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Mismatch {
            field: "password".to_string(),
        };
        assert_eq!(err.to_string(), "password does not match its confirmation");
        assert_eq!(err.field(), "password");

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        };
        assert_eq!(err.to_string(), "password must be at least 6 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "email".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
