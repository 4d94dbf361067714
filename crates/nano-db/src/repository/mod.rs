//! # Repository Module
//!
//! Database repository implementations for the till.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SqliteTillStore (nano-till)                                           │
//! │       │                                                                 │
//! │       │  db.shifts().increment_accrual(id, delta)                      │
//! │       ▼                                                                 │
//! │  ShiftRepository ─── ExpenseRepository ─── SaleRepository              │
//! │       │                                         ProfileRepository      │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`shift::ShiftRepository`] - Open, accrue, guarded close, history
//! - [`expense::ExpenseRepository`] - Withdrawals against an OPEN shift
//! - [`sale::SaleRepository`] - Confirmed sales
//! - [`profile::ProfileRepository`] - User profiles and roles

pub mod expense;
pub mod profile;
pub mod sale;
pub mod shift;
