//! Property-based tests for journal entry acceptance.
//!
//! With at least 2 well-formed lines, valid accounts and an open period,
//! `|Σdebit − Σcredit| <= tolerance` is necessary and sufficient for
//! acceptance.

use chrono::NaiveDate;
use koperasi_shared::types::{AccountId, CooperativeId, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{JournalLineInput, PostEntryInput};
use super::validation::JournalValidator;
use crate::fiscal::{CreatePeriodInput, FiscalPeriod};

/// Strategy to generate a valid positive amount (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a list of positive amounts.
fn amounts(max_len: usize) -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(positive_amount(), 1..=max_len)
}

struct Ledger {
    coop: CooperativeId,
    accounts: Vec<AccountId>,
    period: FiscalPeriod,
}

impl Ledger {
    fn new() -> Self {
        let coop = CooperativeId::new();
        Self {
            coop,
            accounts: (0..4).map(|_| AccountId::new()).collect(),
            period: FiscalPeriod::open(
                coop,
                CreatePeriodInput {
                    name: "FY2024".to_string(),
                    start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
                },
            ),
        }
    }

    fn entry(&self, debits: &[Decimal], credits: &[Decimal]) -> PostEntryInput {
        let n = self.accounts.len();
        let lines = debits
            .iter()
            .enumerate()
            .map(|(i, amount)| JournalLineInput::debit(self.accounts[i % n], *amount))
            .chain(
                credits
                    .iter()
                    .enumerate()
                    .map(|(i, amount)| JournalLineInput::credit(self.accounts[(i + 1) % n], *amount)),
            )
            .collect();

        PostEntryInput {
            fiscal_period_id: self.period.id,
            entry_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            description: "Generated entry".to_string(),
            lines,
            created_by: UserId::new(),
        }
    }

    fn validate(&self, input: &PostEntryInput) -> Result<(), LedgerError> {
        let owner = |id: AccountId| self.accounts.contains(&id).then_some(self.coop);
        JournalValidator::new(Decimal::new(1, 2))
            .validate(self.coop, input, owner, Some(&self.period))
            .map(|_| ())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* set of debit amounts, crediting the same total (split
    /// arbitrarily) is always accepted.
    #[test]
    fn prop_balanced_entry_accepted(
        debits in amounts(5),
        split in 1usize..5,
    ) {
        let ledger = Ledger::new();
        let total: Decimal = debits.iter().copied().sum();

        // Split the total over `split` credit lines; the last takes the remainder.
        let share = (total / Decimal::from(split)).round_dp(2);
        let mut credits: Vec<Decimal> = (1..split).map(|_| share).filter(|s| *s > Decimal::ZERO).collect();
        let rest = total - credits.iter().copied().sum::<Decimal>();
        prop_assume!(rest > Decimal::ZERO);
        credits.push(rest);

        let input = ledger.entry(&debits, &credits);
        let result = ledger.validate(&input);
        prop_assert!(result.is_ok(), "balanced entry rejected: {:?}", result);
    }

    /// *For any* entry whose sides differ by more than 0.01, validation
    /// rejects it with both sums reported.
    #[test]
    fn prop_unbalanced_entry_rejected(
        amount in positive_amount(),
        excess_cents in 2i64..1_000_000,
    ) {
        let ledger = Ledger::new();
        let credit = amount + Decimal::new(excess_cents, 2);
        let input = ledger.entry(&[amount], &[credit]);

        match ledger.validate(&input) {
            Err(LedgerError::UnbalancedEntry { debit: d, credit: c }) => {
                prop_assert_eq!(d, amount);
                prop_assert_eq!(c, credit);
            }
            other => prop_assert!(false, "expected UnbalancedEntry, got {:?}", other),
        }
    }

    /// *For any* drift within the tolerance (in 0.0001 steps up to 0.01),
    /// the entry is accepted.
    #[test]
    fn prop_drift_within_tolerance_accepted(
        amount in positive_amount(),
        drift in 0i64..=100,
        debit_side_larger in any::<bool>(),
    ) {
        let ledger = Ledger::new();
        let drift = Decimal::new(drift, 4);
        let (debit, credit) = if debit_side_larger {
            (amount + drift, amount)
        } else {
            (amount, amount + drift)
        };

        let input = ledger.entry(&[debit], &[credit]);
        prop_assert!(ledger.validate(&input).is_ok());
    }

    /// *For any* entry with fewer than 2 lines, validation rejects it
    /// regardless of the amount.
    #[test]
    fn prop_single_line_rejected(amount in positive_amount()) {
        let ledger = Ledger::new();
        let input = ledger.entry(&[amount], &[]);
        let result = ledger.validate(&input);
        prop_assert!(
            matches!(result, Err(LedgerError::InsufficientLines { count: 1 })),
            "expected InsufficientLines, got {:?}",
            result
        );
    }
}
