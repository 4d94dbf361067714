//! # Dashboard Summary
//!
//! The owner's one-glance view: for every shop, the most recent shift opened
//! since a cut-off, with what was spent from it and how it closed.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::reconciliation::VarianceKind;
use crate::types::{Location, LocationId, Shift, ShiftStatus};

/// Status of one location's drawer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LocationStatus {
    /// No shift opened since the cut-off.
    NoShift,
    Open {
        shift: Shift,
        expense_total: Money,
    },
    Closed {
        shift: Shift,
        expense_total: Money,
        variance_kind: VarianceKind,
    },
}

/// A dashboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSummary {
    pub location: Location,
    pub status: LocationStatus,
}

/// Start of the current UTC day, the default cut-off.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Picks the most recently opened shift per location.
///
/// `shifts` may arrive in any order and may include other locations.
pub fn latest_per_location<'a>(
    shifts: &'a [Shift],
    location_id: LocationId,
) -> Option<&'a Shift> {
    shifts
        .iter()
        .filter(|s| s.location_id == location_id)
        .max_by_key(|s| s.opened_at)
}

/// Builds the dashboard rows.
///
/// `expense_total` is looked up only for the shifts that are shown.
pub fn summarize<F>(locations: &[Location], shifts: &[Shift], mut expense_total: F) -> Vec<LocationSummary>
where
    F: FnMut(&Shift) -> Money,
{
    locations
        .iter()
        .map(|location| {
            let status = match latest_per_location(shifts, location.id) {
                None => LocationStatus::NoShift,
                Some(shift) => {
                    let expenses = expense_total(shift);
                    match (shift.status, shift.variance_kind()) {
                        (ShiftStatus::Closed, Some(variance_kind)) => LocationStatus::Closed {
                            shift: shift.clone(),
                            expense_total: expenses,
                            variance_kind,
                        },
                        _ => LocationStatus::Open {
                            shift: shift.clone(),
                            expense_total: expenses,
                        },
                    }
                }
            };
            LocationSummary {
                location: location.clone(),
                status,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn shift(id: &str, location_id: LocationId, opened_at: DateTime<Utc>, closed: Option<i64>) -> Shift {
        Shift {
            id: id.to_string(),
            location_id,
            opened_by: "u".to_string(),
            opening_balance_cents: 0,
            expected_cash_cents: 0,
            status: if closed.is_some() { ShiftStatus::Closed } else { ShiftStatus::Open },
            declared_cash_cents: closed.map(|_| 0),
            expected_total_cents: closed.map(|_| 0),
            variance_cents: closed,
            opened_at,
            closed_at: closed.map(|_| opened_at),
        }
    }

    #[test]
    fn test_start_of_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 17, 45, 3).unwrap();
        assert_eq!(
            start_of_day(now),
            Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_summarize_picks_latest_per_location() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        let locations = vec![
            Location::new(1, "Zapatería"),
            Location::new(2, "Ropa"),
            Location::new(3, "Librería"),
        ];
        let shifts = vec![
            shift("morning", 1, t0, Some(-10_000)),
            shift("afternoon", 1, t0 + Duration::hours(5), None),
            shift("ropa", 2, t0, Some(5_000)),
        ];

        let rows = summarize(&locations, &shifts, |s| {
            if s.id == "afternoon" {
                Money::from_major(300)
            } else {
                Money::zero()
            }
        });

        assert_eq!(rows.len(), 3);
        match &rows[0].status {
            LocationStatus::Open { shift, expense_total } => {
                assert_eq!(shift.id, "afternoon");
                assert_eq!(*expense_total, Money::from_major(300));
            }
            other => panic!("unexpected status {other:?}"),
        }
        match &rows[1].status {
            LocationStatus::Closed { variance_kind, .. } => {
                assert_eq!(*variance_kind, VarianceKind::Surplus(Money::from_major(50)));
            }
            other => panic!("unexpected status {other:?}"),
        }
        assert_eq!(rows[2].status, LocationStatus::NoShift);
    }
}
