//! # nano-db: Database Layer for Nano POS
//!
//! SQLite persistence for the till, via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Nano POS Data Flow                               │
//! │                                                                         │
//! │  TillEngine (nano-till) ──► SqliteTillStore                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     nano-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ Shift Expense │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │ Sale Profile  │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (shared by the gallery's terminals)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nano_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("nano.db")).await?;
//! let open = db.shifts().find_open(2).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::expense::ExpenseRepository;
pub use repository::profile::ProfileRepository;
pub use repository::sale::SaleRepository;
pub use repository::shift::{CloseShift, ShiftRepository};
