//! Fiscal period rules: date ranges, overlap, and the single open period.

use chrono::NaiveDate;
use koperasi_shared::types::CooperativeId;
use tracing::warn;

use super::period::{CreatePeriodInput, FiscalPeriod};
use crate::ledger::error::LedgerError;

/// Validates that start_date is strictly before end_date.
///
/// # Errors
///
/// Returns `LedgerError::InvalidDateRange` otherwise.
pub fn validate_date_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), LedgerError> {
    if start_date >= end_date {
        return Err(LedgerError::InvalidDateRange {
            start_date,
            end_date,
        });
    }
    Ok(())
}

/// Checks if two inclusive date ranges overlap.
///
/// Two ranges [a_start, a_end] and [b_start, b_end] overlap if:
/// a_start <= b_end AND a_end >= b_start
#[must_use]
pub fn date_ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// Validates a new period against the cooperative's existing periods.
///
/// Order: date range, overlap, then the single-open-period invariant.
///
/// # Errors
///
/// - `InvalidDateRange` if start >= end
/// - `OverlappingPeriod` if the range intersects an existing period
/// - `OpenPeriodExists` if another period is still open
pub fn validate_new_period(
    cooperative_id: CooperativeId,
    input: &CreatePeriodInput,
    existing: &[FiscalPeriod],
) -> Result<(), LedgerError> {
    validate_date_range(input.start_date, input.end_date)?;

    let own: Vec<&FiscalPeriod> = existing
        .iter()
        .filter(|period| period.cooperative_id == cooperative_id)
        .collect();

    if let Some(clash) = own
        .iter()
        .filter(|period| {
            date_ranges_overlap(
                period.start_date,
                period.end_date,
                input.start_date,
                input.end_date,
            )
        })
        .min_by_key(|period| period.start_date)
    {
        return Err(LedgerError::OverlappingPeriod {
            existing: clash.id,
            start_date: clash.start_date,
            end_date: clash.end_date,
        });
    }

    if let Some(open) = own.iter().find(|period| period.is_open()) {
        return Err(LedgerError::OpenPeriodExists(open.id));
    }

    Ok(())
}

/// Selects the cooperative's active (open) period.
///
/// Writes keep at most one period open. If storage nevertheless holds
/// several, the most recently created one wins and a warning is logged.
#[must_use]
pub fn select_active(periods: &[FiscalPeriod]) -> Option<&FiscalPeriod> {
    let open: Vec<&FiscalPeriod> = periods.iter().filter(|period| period.is_open()).collect();

    if open.len() > 1 {
        warn!(
            open_periods = open.len(),
            cooperative_id = %open[0].cooperative_id,
            "multiple open fiscal periods found; using the most recently created"
        );
    }

    open.into_iter()
        .max_by_key(|period| (period.created_at, period.start_date))
}

/// Returns the active period if it ended before `today`.
#[must_use]
pub fn due_for_close(periods: &[FiscalPeriod], today: NaiveDate) -> Option<&FiscalPeriod> {
    select_active(periods).filter(|period| period.end_date < today)
}
