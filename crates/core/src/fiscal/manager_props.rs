//! Property-based tests for fiscal period creation rules.

use chrono::{Duration, NaiveDate, Utc};
use koperasi_shared::types::{CooperativeId, UserId};
use proptest::prelude::*;

use super::manager::{date_ranges_overlap, validate_new_period};
use super::period::{CreatePeriodInput, FiscalPeriod};
use crate::ledger::error::LedgerError;

/// Strategy for a valid range: a start within ~3 years and a length of 1..120 days.
fn range_strategy() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
    (0i64..1_000, 1i64..120).prop_map(|(offset, length)| {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let start = base + Duration::days(offset);
        (start, start + Duration::days(length))
    })
}

fn to_input((start_date, end_date): (NaiveDate, NaiveDate)) -> CreatePeriodInput {
    CreatePeriodInput {
        name: format!("{start_date}..{end_date}"),
        start_date,
        end_date,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* sequence of creation attempts, no two accepted periods of a
    /// cooperative overlap, and every rejected candidate overlapped one
    /// already accepted.
    #[test]
    fn prop_accepted_periods_never_overlap(
        ranges in prop::collection::vec(range_strategy(), 1..25),
    ) {
        let coop = CooperativeId::new();
        let mut accepted: Vec<FiscalPeriod> = Vec::new();

        for range in ranges {
            let input = to_input(range);
            match validate_new_period(coop, &input, &accepted) {
                Ok(()) => {
                    // Close immediately so the single-open rule stays out of the way.
                    let mut period = FiscalPeriod::open(coop, input);
                    period.close(UserId::new(), Utc::now()).unwrap();
                    accepted.push(period);
                }
                Err(LedgerError::OverlappingPeriod { .. }) => {
                    prop_assert!(accepted.iter().any(|p| date_ranges_overlap(
                        p.start_date, p.end_date, range.0, range.1
                    )));
                }
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
        }

        for (i, a) in accepted.iter().enumerate() {
            for b in accepted.iter().skip(i + 1) {
                prop_assert!(!date_ranges_overlap(a.start_date, a.end_date, b.start_date, b.end_date));
            }
        }
    }

    /// *For any* range with start >= end, creation is rejected as a
    /// validation error before any overlap check.
    #[test]
    fn prop_inverted_range_rejected(
        (start, end) in range_strategy(),
    ) {
        let input = to_input((end, start));
        let result = validate_new_period(CooperativeId::new(), &input, &[]);
        prop_assert!(
            matches!(result, Err(LedgerError::InvalidDateRange { .. })),
            "expected InvalidDateRange, got {:?}",
            result
        );
    }
}
