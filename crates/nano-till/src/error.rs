//! # Till Errors
//!
//! `TillError` is what engine operations return; `ApiError` is what a front
//! end receives.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ValidationError ──► CoreError ──┐                                      │
//! │                                  ├──► TillError ──► ApiError ──► UI     │
//! │  DbError ───────► Persistence ───┘        │                             │
//! │                                           └── AccrualDrift (sale kept,  │
//! │                                               till not updated)         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! ```json
//! {
//!   "code": "NO_ACTIVE_SHIFT",
//!   "message": "No open till: cannot sell without opening the till. Open the till before continuing",
//!   "retryable": false
//! }
//! ```

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use nano_core::{CoreError, Money, ValidationError};
use nano_db::DbError;

// =============================================================================
// Till Error
// =============================================================================

#[derive(Debug, Error)]
pub enum TillError {
    /// A till rule was violated (validation, no open shift, permissions...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store rejected or could not complete a read or write.
    ///
    /// ## When This Occurs
    /// - Database unavailable or busy past its timeout
    /// - A close kept losing its guard to concurrent activity
    ///
    /// Nothing is assumed committed; the operator may retry the same input.
    #[error("Could not save to the till database: {0}")]
    Persistence(String),

    /// A sale was recorded but its total could not be added to the shift.
    ///
    /// ## When This Occurs
    /// Checkout recorded the sale, then the accrual write failed (shift
    /// closed meanwhile, database fault). The sale ledger and the till now
    /// disagree by `total` until someone reconciles them by hand.
    #[error("Sale {sale_id} of {total} was recorded but not added to the till: {source}")]
    AccrualDrift {
        sale_id: String,
        total: Money,
        #[source]
        source: Box<TillError>,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TillError {
    pub fn persistence(message: impl Into<String>) -> Self {
        TillError::Persistence(message.into())
    }

    /// Returns the core error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            TillError::Core(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for TillError {
    fn from(err: ValidationError) -> Self {
        TillError::Core(CoreError::Validation(err))
    }
}

impl From<DbError> for TillError {
    fn from(err: DbError) -> Self {
        TillError::Persistence(err.to_string())
    }
}

impl From<toml::de::Error> for TillError {
    fn from(err: toml::de::Error) -> Self {
        TillError::Config(err.to_string())
    }
}

impl From<std::io::Error> for TillError {
    fn from(err: std::io::Error) -> Self {
        TillError::Config(err.to_string())
    }
}

/// Result type for engine operations.
pub type TillResult<T> = Result<T, TillError>;

// =============================================================================
// API Error
// =============================================================================

/// Error returned to the front end.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Whether offering "try again" with the same input makes sense.
    pub retryable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input rejected; correct it and resubmit.
    ValidationError,

    /// The till must be opened first.
    NoActiveShift,

    /// Another terminal opened the till at the same moment.
    ConcurrentOpen,

    /// Role or location mismatch.
    PermissionDenied,

    /// The database did not accept the write.
    PersistenceFailure,

    /// Sale recorded, till not updated.
    AccrualDrift,

    NotFound,

    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::Validation(_)
            | CoreError::CartTooLarge { .. }
            | CoreError::NotInCart(_) => ApiError::new(ErrorCode::ValidationError, message),
            CoreError::NoActiveShift { .. } => ApiError::new(ErrorCode::NoActiveShift, message),
            CoreError::ShiftAlreadyOpen { .. } | CoreError::ConcurrentOpenConflict { .. } => {
                ApiError::new(ErrorCode::ConcurrentOpen, message)
            }
            CoreError::PermissionDenied { .. } => {
                ApiError::new(ErrorCode::PermissionDenied, message)
            }
            CoreError::ShiftNotFound(_) => ApiError::new(ErrorCode::NotFound, message),
        }
    }
}

impl From<TillError> for ApiError {
    fn from(err: TillError) -> Self {
        match err {
            TillError::Core(core) => ApiError::from(core),
            TillError::Persistence(detail) => {
                // Log the actual error but return a generic message
                error!(%detail, "Till persistence failure");
                ApiError::new(
                    ErrorCode::PersistenceFailure,
                    "The till could not be saved. Check the connection and try again",
                )
                .retryable()
            }
            drift @ TillError::AccrualDrift { .. } => {
                ApiError::new(ErrorCode::AccrualDrift, drift.to_string())
            }
            TillError::Config(detail) => {
                error!(%detail, "Till configuration error");
                ApiError::new(ErrorCode::Internal, "The till is not configured correctly")
            }
        }
    }
}
