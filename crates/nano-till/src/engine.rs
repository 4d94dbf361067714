//! # Till Engine
//!
//! Lifecycle operations for the cash drawer, over any [`TillStore`].
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  intent ──► validate input ──► load TillState ──► authorize location   │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                               TillState::apply (pure)                   │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                               store write (atomic)                      │
//! │                                        │                                │
//! │                         ┌──────────────┴──────────────┐                 │
//! │                         ▼                             ▼                 │
//! │                 authoritative snapshot        None: shift moved          │
//! │                 returned to caller            → NoActiveShift / retry    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation takes the caller's [`SessionContext`]; nothing is read
//! from ambient state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use nano_core::dashboard::{self, LocationSummary};
use nano_core::validation::{validate_declared_cash, validate_expense, validate_opening_balance};
use nano_core::{
    CoreError, ExpenseRecord, Location, LocationId, Money, Reconciliation, SessionContext, Shift,
    TillState, TillTransition, VarianceKind,
};

use crate::config::TillConfig;
use crate::error::{TillError, TillResult};
use crate::store::{ShiftClosing, TillStore};

const DEFAULT_CLOSE_RETRY_LIMIT: u32 = 3;

// =============================================================================
// Outcomes
// =============================================================================

/// Result of [`TillEngine::open_or_resume`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "shift", rename_all = "snake_case")]
pub enum OpenOutcome {
    /// A fresh shift was created with the supplied balance.
    Opened(Shift),
    /// An OPEN shift already existed and was handed over unchanged.
    Resumed(Shift),
}

impl OpenOutcome {
    pub fn shift(&self) -> &Shift {
        match self {
            OpenOutcome::Opened(s) | OpenOutcome::Resumed(s) => s,
        }
    }

    pub fn into_shift(self) -> Shift {
        match self {
            OpenOutcome::Opened(s) | OpenOutcome::Resumed(s) => s,
        }
    }

    /// Whether the operator had to enter an opening balance.
    pub fn is_new(&self) -> bool {
        matches!(self, OpenOutcome::Opened(_))
    }
}

/// Result of [`TillEngine::reconcile_and_close`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseOutcome {
    pub shift: Shift,
    pub reconciliation: Reconciliation,
}

impl CloseOutcome {
    pub fn expected_total(&self) -> Money {
        self.reconciliation.expected_total
    }

    pub fn variance(&self) -> Money {
        self.reconciliation.variance
    }

    pub fn kind(&self) -> VarianceKind {
        self.reconciliation.kind()
    }
}

/// Proof of a handoff: the shift stays OPEN for the next operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayReceipt {
    pub shift_id: String,
    pub location_id: LocationId,
    pub relayed_by: String,
    pub relayed_at: DateTime<Utc>,
}

/// Close-screen breakdown of one shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftReport {
    pub shift: Shift,
    pub expenses: Vec<ExpenseRecord>,
    pub expense_total: Money,
    /// Gross sales accrual, as stored.
    pub accrual: Money,
    /// opening + accrual − expenses: what should be in the drawer now.
    pub expected_now: Money,
    /// Set once the shift is closed.
    pub variance_kind: Option<VarianceKind>,
}

// =============================================================================
// Engine
// =============================================================================

#[derive(Debug, Clone)]
pub struct TillEngine<S> {
    store: S,
    locations: Vec<Location>,
    close_retry_limit: u32,
}

impl<S: TillStore> TillEngine<S> {
    /// Engine over `store` with the default gallery and retry limit.
    pub fn new(store: S) -> Self {
        TillEngine {
            store,
            locations: crate::config::default_locations(),
            close_retry_limit: DEFAULT_CLOSE_RETRY_LIMIT,
        }
    }

    pub fn from_config(store: S, config: &TillConfig) -> Self {
        TillEngine {
            store,
            locations: config.locations.clone(),
            close_retry_limit: config.till.close_retry_limit.max(1),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    fn ensure_known_location(&self, location_id: LocationId) -> TillResult<()> {
        if self.locations.iter().any(|l| l.id == location_id) {
            Ok(())
        } else {
            Err(CoreError::denied(format!("unknown location {location_id}")).into())
        }
    }

    async fn load_state(&self, shift_id: &str) -> TillResult<TillState> {
        let shift = self
            .store
            .fetch_shift(shift_id)
            .await?
            .ok_or_else(|| CoreError::no_active_shift(format!("shift {shift_id} does not exist")))?;
        Ok(TillState::from_shift(Some(shift)))
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Resolves the signed-in user's session. Called once after login.
    pub async fn establish_session(&self) -> TillResult<SessionContext> {
        let profile = self
            .store
            .current_user()
            .await?
            .ok_or_else(|| CoreError::denied("nobody is signed in"))?;

        let default_location = self
            .locations
            .first()
            .map(|l| l.id)
            .ok_or_else(|| TillError::Config("no locations configured".into()))?;

        let session = SessionContext::establish(&profile, default_location)?;
        self.ensure_known_location(session.active_location)?;

        info!(
            user_id = %session.user_id,
            role = session.role.as_str(),
            location_id = session.active_location,
            "Session established"
        );
        Ok(session)
    }

    /// Moves an owner's session to another configured shop.
    pub fn switch_location(&self, session: &mut SessionContext, location_id: LocationId) -> TillResult<()> {
        self.ensure_known_location(location_id)?;
        session.switch_location(location_id)?;
        debug!(user_id = %session.user_id, location_id, "Switched location");
        Ok(())
    }

    /// Ends the session. Sellers must close or relay their shift first.
    pub async fn logout(&self, session: &SessionContext) -> TillResult<()> {
        let open = self.store.fetch_open_shift(session.active_location).await?;

        if let Err(err) = session.check_logout(open.as_ref()) {
            warn!(
                user_id = %session.user_id,
                location_id = session.active_location,
                "Logout blocked by open shift"
            );
            return Err(err.into());
        }

        self.store.end_session().await?;
        info!(user_id = %session.user_id, "Logged out");
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Opens the location's till, or hands over the one already OPEN.
    ///
    /// `opening_balance` is only read for a fresh open; a relay ignores it.
    ///
    /// ## Errors
    /// - `PermissionDenied` if the session may not act on `location_id`
    /// - `Validation` if a fresh open has no balance or a negative one
    /// - `ConcurrentOpenConflict` only if a lost race cannot be recovered
    pub async fn open_or_resume(
        &self,
        session: &SessionContext,
        location_id: LocationId,
        opening_balance: Option<Money>,
    ) -> TillResult<OpenOutcome> {
        session.authorize(location_id)?;

        if let Some(existing) = self.store.fetch_open_shift(location_id).await? {
            let state = TillState::NotOpen.apply(TillTransition::Opened(existing))?;
            let shift = state.require_open("resuming till")?.clone();
            info!(shift_id = %shift.id, location_id, user_id = %session.user_id, "Resuming open shift");
            return Ok(OpenOutcome::Resumed(shift));
        }

        let balance = validate_opening_balance(opening_balance)?;

        match self
            .store
            .create_shift(location_id, &session.user_id, balance)
            .await
        {
            Ok(shift) => {
                let state = TillState::NotOpen.apply(TillTransition::Opened(shift))?;
                let shift = state.require_open("opening till")?.clone();
                info!(
                    shift_id = %shift.id,
                    location_id,
                    opening_balance = %balance,
                    user_id = %session.user_id,
                    "Shift opened"
                );
                Ok(OpenOutcome::Opened(shift))
            }
            Err(TillError::Core(CoreError::ConcurrentOpenConflict { .. })) => {
                warn!(location_id, "Lost open race to another terminal, resuming its shift");
                match self.store.fetch_open_shift(location_id).await? {
                    Some(winner) => Ok(OpenOutcome::Resumed(winner)),
                    None => Err(CoreError::ConcurrentOpenConflict { location_id }.into()),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Adds a confirmed sale total to an OPEN shift.
    ///
    /// Returns the store's snapshot after the increment.
    pub async fn accrue_sale(
        &self,
        session: &SessionContext,
        shift_id: &str,
        total: Money,
    ) -> TillResult<Shift> {
        let state = self.load_state(shift_id).await?;
        if let Some(shift) = state.shift() {
            session.authorize(shift.location_id)?;
        }
        // Rejects CLOSED shifts and non-positive totals before touching the store
        state.apply(TillTransition::SaleAccrued(total))?;

        let updated = self
            .store
            .update_shift_accrual(shift_id, total)
            .await?
            .ok_or_else(|| CoreError::no_active_shift("the till was closed before the sale was added"))?;

        debug!(shift_id, total = %total, accrual = %updated.accrual(), "Sale accrued");
        Ok(updated)
    }

    /// Logs a cash withdrawal. Never changes the accrual.
    pub async fn record_expense(
        &self,
        session: &SessionContext,
        shift_id: &str,
        amount: Money,
        description: &str,
    ) -> TillResult<ExpenseRecord> {
        let (amount, description) = validate_expense(amount, description)?;

        let state = self.load_state(shift_id).await?;
        let shift = state.require_open("cannot record an expense without an open till")?;
        session.authorize(shift.location_id)?;

        let record = self
            .store
            .insert_expense(shift_id, amount, &description)
            .await?
            .ok_or_else(|| CoreError::no_active_shift("the till was closed before the expense was saved"))?;

        info!(shift_id, expense_id = %record.id, amount = %amount, "Expense recorded");
        Ok(record)
    }

    /// Counts the drawer and closes the shift.
    ///
    /// ## Retries
    /// The store only accepts the close if accrual and expenses are still
    /// what the computation read. Otherwise the figures are recomputed, up to
    /// the configured retry limit.
    pub async fn reconcile_and_close(
        &self,
        session: &SessionContext,
        shift_id: &str,
        declared_cash: Money,
    ) -> TillResult<CloseOutcome> {
        let declared = validate_declared_cash(declared_cash)?;

        for attempt in 1..=self.close_retry_limit {
            let state = self.load_state(shift_id).await?;
            let shift = state.require_open("there is no open till to close")?;
            session.authorize(shift.location_id)?;

            let expense_sum = self.store.sum_expenses(shift_id).await?;
            let reconciliation = Reconciliation::compute(
                shift.opening_balance(),
                shift.accrual(),
                expense_sum,
                declared,
            )?;

            let closing = ShiftClosing {
                shift_id: shift_id.to_string(),
                reconciliation,
                closed_at: Utc::now(),
            };

            match self.store.close_shift(&closing).await? {
                Some(closed) => {
                    let state = state.apply(TillTransition::Closed(closed))?;
                    let shift = state
                        .shift()
                        .cloned()
                        .ok_or_else(|| CoreError::ShiftNotFound(shift_id.to_string()))?;

                    info!(
                        shift_id,
                        expected_total = %reconciliation.expected_total,
                        declared = %declared,
                        result = %reconciliation.kind(),
                        "Shift closed"
                    );
                    return Ok(CloseOutcome {
                        shift,
                        reconciliation,
                    });
                }
                None => {
                    warn!(shift_id, attempt, "Shift changed while closing, recomputing");
                }
            }
        }

        Err(TillError::persistence(format!(
            "shift {shift_id} kept changing while closing; count again and retry"
        )))
    }

    /// Hands the OPEN shift to the next operator and ends this session.
    pub async fn relay(&self, session: &SessionContext, shift_id: &str) -> TillResult<RelayReceipt> {
        let state = self.load_state(shift_id).await?;
        let shift = state.require_open("only an open till can be relayed")?;
        session.authorize(shift.location_id)?;

        let receipt = RelayReceipt {
            shift_id: shift.id.clone(),
            location_id: shift.location_id,
            relayed_by: session.user_id.clone(),
            relayed_at: Utc::now(),
        };

        self.store.end_session().await?;
        info!(shift_id, user_id = %session.user_id, "Shift relayed");
        Ok(receipt)
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    /// Shift plus its expenses and live figures.
    ///
    /// Owners may look at any shop; sellers only at their own.
    pub async fn shift_report(&self, session: &SessionContext, shift_id: &str) -> TillResult<ShiftReport> {
        let shift = self
            .store
            .fetch_shift(shift_id)
            .await?
            .ok_or_else(|| CoreError::ShiftNotFound(shift_id.to_string()))?;

        if !session.is_owner() {
            session.authorize(shift.location_id)?;
        }

        let expenses = self.store.list_expenses(shift_id).await?;
        let expense_total = self.store.sum_expenses(shift_id).await?;

        Ok(ShiftReport {
            accrual: shift.accrual(),
            expected_now: shift.expected_now(expense_total)?,
            variance_kind: shift.variance_kind(),
            shift,
            expenses,
            expense_total,
        })
    }

    /// Latest shift per configured shop since `since` (default: today, UTC).
    pub async fn dashboard(
        &self,
        session: &SessionContext,
        since: Option<DateTime<Utc>>,
    ) -> TillResult<Vec<LocationSummary>> {
        session.require_owner()?;

        let since = since.unwrap_or_else(|| dashboard::start_of_day(Utc::now()));
        let shifts = self.store.list_shifts_since(since).await?;

        let mut expense_totals = HashMap::new();
        for location in &self.locations {
            if let Some(shift) = dashboard::latest_per_location(&shifts, location.id) {
                let total = self.store.sum_expenses(&shift.id).await?;
                expense_totals.insert(shift.id.clone(), total);
            }
        }

        debug!(since = %since, shifts = shifts.len(), "Dashboard built");
        Ok(dashboard::summarize(&self.locations, &shifts, |shift| {
            expense_totals.get(&shift.id).copied().unwrap_or_default()
        }))
    }
}

// =============================================================================
// Tests
// =============================================================================
