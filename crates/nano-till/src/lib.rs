//! # nano-till: Till Engine for Nano POS
//!
//! Runs the cash drawer of each shop in the gallery: opening, sales accrual,
//! expenses, relay between operators, and the end-of-shift count.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till Engine Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 TillEngine<S> (Main Orchestrator)                │  │
//! │  │                                                                  │  │
//! │  │  Every call takes an explicit SessionContext                     │  │
//! │  │  Validates, runs the lifecycle transition, writes through S      │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │   Checkout     │  │   TillStore    │  │   LocalTill            │    │
//! │  │                │  │                │  │                        │    │
//! │  │ Records sale,  │  │ Async trait;   │  │ Display estimate,      │    │
//! │  │ accrues total, │  │ SQLite adapter │  │ replaced on each       │    │
//! │  │ surfaces drift │  │ over nano-db   │  │ authoritative read     │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`engine`] - `TillEngine` lifecycle operations and reports
//! - [`checkout`] - Cart to sale to accrual
//! - [`local`] - Terminal-side till view with drift detection
//! - [`store`] - Store boundary traits and the SQLite adapter
//! - [`config`] - TOML + environment configuration
//! - [`error`] - `TillError` and the front end's `ApiError`
//! - [`telemetry`] - Tracing subscriber setup
//!
//! ## Usage
//! ```rust,ignore
//! let config = TillConfig::load(None)?;
//! let engine = open_sqlite(&config).await?;
//!
//! engine.store().sign_in("seller-1").await?;
//! let session = engine.establish_session().await?;
//!
//! let shift = engine
//!     .open_or_resume(&session, session.active_location, Some(Money::from_major(5000)))
//!     .await?
//!     .into_shift();
//! ```

pub mod checkout;
pub mod config;
pub mod engine;
pub mod error;
pub mod local;
pub mod store;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use checkout::CheckoutReceipt;
pub use config::TillConfig;
pub use engine::{CloseOutcome, OpenOutcome, RelayReceipt, ShiftReport, TillEngine};
pub use error::{ApiError, ErrorCode, TillError, TillResult};
pub use local::{LocalTill, SyncOutcome};
pub use store::{SaleRecorder, ShiftClosing, SqliteTillStore, TillStore};

use nano_db::Database;
use tracing::info;

/// Connects to the configured database and builds an engine over it.
pub async fn open_sqlite(config: &TillConfig) -> TillResult<TillEngine<SqliteTillStore>> {
    let db = Database::new(config.db_config()).await?;
    info!(path = ?config.database.path, "Till database ready");
    Ok(TillEngine::from_config(SqliteTillStore::new(db), config))
}
