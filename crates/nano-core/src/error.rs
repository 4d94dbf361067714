//! # Error Types
//!
//! Domain-specific error types for nano-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  nano-core errors (this file)                                          │
//! │  ├── CoreError        - Till rule violations                           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  nano-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  nano-till errors                                                      │
//! │  ├── TillError        - Engine failures (core + persistence + drift)   │
//! │  └── ApiError         - What the front end sees (serialized)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → TillError → ApiError → Front end  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::LocationId;

// =============================================================================
// Core Error
// =============================================================================

/// Till rule violations.
///
/// Each variant maps to one user-facing message; none of them leave partial
/// state behind because they are raised before any write.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An operation that needs an OPEN shift was invoked without one.
    ///
    /// ## When This Occurs
    /// - Selling before the till was opened
    /// - Accruing, spending or closing on a shift that is already CLOSED
    #[error("No open till: {context}. Open the till before continuing")]
    NoActiveShift { context: String },

    /// A different shift is already OPEN where a fresh one was expected.
    #[error("Location {location_id} already has open shift {shift_id}")]
    ShiftAlreadyOpen {
        location_id: LocationId,
        shift_id: String,
    },

    /// A fresh open lost the race to another terminal.
    ///
    /// ## Recovery
    /// The engine re-fetches the winner and relays into it; the operator
    /// only sees this if the winner cannot be read back.
    #[error("Another terminal opened the till for location {location_id} at the same time")]
    ConcurrentOpenConflict { location_id: LocationId },

    /// Role or location mismatch.
    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },

    /// Shift identifier does not exist.
    #[error("Shift not found: {0}")]
    ShiftNotFound(String),

    /// Cart has exceeded maximum allowed items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NoActiveShift error with context.
    pub fn no_active_shift(context: impl Into<String>) -> Self {
        CoreError::NoActiveShift {
            context: context.into(),
        }
    }

    /// Creates a PermissionDenied error.
    pub fn denied(reason: impl Into<String>) -> Self {
        CoreError::PermissionDenied {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any state change; the operator keeps the typed value and
/// corrects it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} cannot be negative")]
    MustNotBeNegative { field: String },

    /// Value is not a readable amount.
    #[error("{field} is not a valid amount: {reason}")]
    InvalidAmount { field: String, reason: String },
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
        let err = CoreError::no_active_shift("cannot sell");
        assert_eq!(
            err.to_string(),
            "No open till: cannot sell. Open the till before continuing"
        );

        let err = CoreError::ConcurrentOpenConflict { location_id: 2 };
        assert!(err.to_string().contains("location 2"));
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "description".to_string(),
        };
        assert_eq!(err.to_string(), "description is required");

        let err = ValidationError::MustNotBeNegative {
            field: "opening balance".to_string(),
        };
        assert_eq!(err.to_string(), "opening balance cannot be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
