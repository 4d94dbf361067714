//! # nano-core: Pure Till Logic for Nano POS
//!
//! This crate is the **heart** of the Nano POS till. It holds the cash-shift
//! rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Nano POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web front end (external)                     │   │
//! │  │   Login ──► POS / Cart ──► Checkout ──► Close (Arqueo) ──► Admin│   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ intents                                │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    nano-till (engine)                           │   │
//! │  │   open_or_resume, accrue_sale, record_expense, close, relay     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ nano-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌────────────────┐ ┌──────────┐    │   │
//! │  │   │  money   │ │  types   │ │   lifecycle    │ │  access  │    │   │
//! │  │   │  Money   │ │  Shift   │ │   TillState    │ │ Session  │    │   │
//! │  │   │          │ │ Expense  │ │ reconciliation │ │   Role   │    │   │
//! │  │   └──────────┘ └──────────┘ └────────────────┘ └──────────┘    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    nano-db (Database Layer)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (Shift, ExpenseRecord, Sale, UserProfile)
//! - [`lifecycle`] - Till state machine (NOT_OPEN → OPEN → CLOSED)
//! - [`reconciliation`] - Expected cash and variance at close
//! - [`access`] - Role gate and explicit session context
//! - [`cart`] - Client-side cart aggregation
//! - [`dashboard`] - Per-location status for the owner's view
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use nano_core::money::Money;
//! use nano_core::reconciliation::{Reconciliation, VarianceKind};
//!
//! let rec = Reconciliation::compute(
//!     Money::from_major(5000),
//!     Money::from_major(1200),
//!     Money::from_major(300),
//!     Money::from_major(5800),
//! )
//! .unwrap();
//!
//! assert_eq!(rec.expected_total, Money::from_major(5900));
//! assert_eq!(rec.kind(), VarianceKind::Shortage(Money::from_major(100)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod cart;
pub mod dashboard;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod reconciliation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{Landing, Role, SessionContext};
pub use cart::{Cart, CartItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use lifecycle::{TillState, TillTransition};
pub use money::Money;
pub use reconciliation::{expected_cash, Reconciliation, VarianceKind};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct items allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in cart.
///
/// Catches a mistyped quantity (1000 instead of 10) before it reaches the till.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of an expense description.
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Largest amount accepted for any single operator-entered figure
/// (opening balance, sale, expense, declared cash, unit price).
///
/// Keeps every reconciliation well inside `i64` cents.
pub const MAX_AMOUNT: Money = Money::from_major(1_000_000_000);
