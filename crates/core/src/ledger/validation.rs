//! Posting rules for journal entries.
//!
//! Rules run in a fixed order and stop at the first failure:
//! 1. At least 2 lines
//! 2. Per line: account exists in the cooperative, then exactly one positive side
//! 3. Debits equal credits within tolerance
//! 4. Fiscal period exists in the cooperative and is open

use koperasi_shared::types::{AccountId, CooperativeId};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{EntryTotals, PostEntryInput};
use crate::fiscal::FiscalPeriod;

/// Validates journal entries before they are stored.
///
/// Pure: the caller supplies account ownership and the referenced period,
/// read inside the same critical section as the subsequent insert.
#[derive(Debug, Clone, Copy)]
pub struct JournalValidator {
    tolerance: Decimal,
}

impl JournalValidator {
    /// Creates a validator with the given absolute balance tolerance.
    #[must_use]
    pub const fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }

    /// Validates an entry for `cooperative_id`.
    ///
    /// `account_owner` returns the cooperative owning an account, or `None`
    /// if the account does not exist. `period` is the referenced period as
    /// currently stored, if any.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate<A>(
        &self,
        cooperative_id: CooperativeId,
        input: &PostEntryInput,
        account_owner: A,
        period: Option<&FiscalPeriod>,
    ) -> Result<EntryTotals, LedgerError>
    where
        A: Fn(AccountId) -> Option<CooperativeId>,
    {
        // 1. Minimum lines
        if input.lines.len() < 2 {
            return Err(LedgerError::InsufficientLines {
                count: input.lines.len(),
            });
        }

        // 2. Accounts and line shape
        for (index, line) in input.lines.iter().enumerate() {
            if account_owner(line.account_id) != Some(cooperative_id) {
                return Err(LedgerError::InvalidAccount(line.account_id));
            }
            if !line.is_well_formed() {
                return Err(LedgerError::InvalidLine { line: index + 1 });
            }
        }

        // 3. Balance
        let totals = input.totals().ok_or(LedgerError::AmountOutOfRange)?;
        if !totals.is_balanced_within(self.tolerance) {
            return Err(LedgerError::UnbalancedEntry {
                debit: totals.debit,
                credit: totals.credit,
            });
        }

        // 4. Period
        match period {
            Some(period) if period.cooperative_id != cooperative_id => {
                Err(LedgerError::InvalidFiscalPeriod {
                    period_id: input.fiscal_period_id,
                    reason: "period does not exist",
                })
            }
            Some(period) if !period.is_open() => Err(LedgerError::InvalidFiscalPeriod {
                period_id: period.id,
                reason: "period is closed",
            }),
            Some(_) => Ok(totals),
            None => Err(LedgerError::InvalidFiscalPeriod {
                period_id: input.fiscal_period_id,
                reason: "period does not exist",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::CreatePeriodInput;
    use crate::ledger::types::JournalLineInput;
    use chrono::{NaiveDate, Utc};
    use koperasi_shared::types::{FiscalPeriodId, UserId};
    use rust_decimal_macros::dec;

    struct Fixture {
        coop: CooperativeId,
        cash: AccountId,
        capital: AccountId,
        period: FiscalPeriod,
    }

    impl Fixture {
        fn new() -> Self {
            let coop = CooperativeId::new();
            let period = FiscalPeriod::open(
                coop,
                CreatePeriodInput {
                    name: "FY2024".to_string(),
                    start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
                },
            );
            Self {
                coop,
                cash: AccountId::new(),
                capital: AccountId::new(),
                period,
            }
        }

        fn owner(&self) -> impl Fn(AccountId) -> Option<CooperativeId> + '_ {
            move |id| (id == self.cash || id == self.capital).then_some(self.coop)
        }

        fn entry(&self, lines: Vec<JournalLineInput>) -> PostEntryInput {
            PostEntryInput {
                fiscal_period_id: self.period.id,
                entry_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                description: "Capital contribution".to_string(),
                lines,
                created_by: UserId::new(),
            }
        }
    }

    fn validator() -> JournalValidator {
        JournalValidator::new(dec!(0.01))
    }

    #[test]
    fn test_balanced_entry_accepted() {
        let fx = Fixture::new();
        let input = fx.entry(vec![
            JournalLineInput::debit(fx.cash, dec!(500.00)),
            JournalLineInput::credit(fx.capital, dec!(500.00)),
        ]);

        let totals = validator()
            .validate(fx.coop, &input, fx.owner(), Some(&fx.period))
            .unwrap();

        assert_eq!(totals.debit, dec!(500.00));
        assert_eq!(totals.credit, dec!(500.00));
    }

    #[test]
    fn test_unbalanced_entry_reports_both_sums() {
        let fx = Fixture::new();
        let input = fx.entry(vec![
            JournalLineInput::debit(fx.cash, dec!(500.00)),
            JournalLineInput::credit(fx.capital, dec!(400.00)),
        ]);

        let err = validator()
            .validate(fx.coop, &input, fx.owner(), Some(&fx.period))
            .unwrap_err();

        match err {
            LedgerError::UnbalancedEntry { debit, credit } => {
                assert_eq!(debit, dec!(500.00));
                assert_eq!(credit, dec!(400.00));
            }
            other => panic!("expected UnbalancedEntry, got {other:?}"),
        }
    }

    #[test]
    fn test_difference_at_tolerance_accepted() {
        let fx = Fixture::new();
        let input = fx.entry(vec![
            JournalLineInput::debit(fx.cash, dec!(100.00)),
            JournalLineInput::credit(fx.capital, dec!(99.99)),
        ]);

        assert!(
            validator()
                .validate(fx.coop, &input, fx.owner(), Some(&fx.period))
                .is_ok()
        );
    }

    #[test]
    fn test_single_line_rejected_first() {
        let fx = Fixture::new();
        // Unknown account and closed period too, but line count wins.
        let input = fx.entry(vec![JournalLineInput::debit(AccountId::new(), dec!(1))]);

        assert!(matches!(
            validator().validate(fx.coop, &input, fx.owner(), None),
            Err(LedgerError::InsufficientLines { count: 1 })
        ));
    }

    #[test]
    fn test_overflowing_totals_rejected() {
        let fx = Fixture::new();
        let half = Decimal::MAX / dec!(2) + Decimal::ONE;
        let input = fx.entry(vec![
            JournalLineInput::debit(fx.cash, half),
            JournalLineInput::debit(fx.cash, half),
            JournalLineInput::credit(fx.capital, half),
        ]);

        let err = validator()
            .validate(fx.coop, &input, fx.owner(), Some(&fx.period))
            .unwrap_err();

        assert!(matches!(err, LedgerError::AmountOutOfRange));
        assert_eq!(err.kind(), crate::ledger::error::ErrorKind::Validation);
    }

    #[test]
    fn test_foreign_account_rejected() {
        let fx = Fixture::new();
        let foreign = AccountId::new();
        let other_coop = CooperativeId::new();
        let owner = |id: AccountId| {
            if id == foreign {
                Some(other_coop)
            } else {
                fx.owner()(id)
            }
        };
        let input = fx.entry(vec![
            JournalLineInput::debit(fx.cash, dec!(10)),
            JournalLineInput::credit(foreign, dec!(10)),
        ]);

        assert!(matches!(
            validator().validate(fx.coop, &input, owner, Some(&fx.period)),
            Err(LedgerError::InvalidAccount(id)) if id == foreign
        ));
    }

    #[test]
    fn test_line_with_both_sides_rejected() {
        let fx = Fixture::new();
        let input = fx.entry(vec![
            JournalLineInput::debit(fx.cash, dec!(10)),
            JournalLineInput {
                account_id: fx.capital,
                debit: dec!(5),
                credit: dec!(15),
                memo: None,
            },
        ]);

        assert!(matches!(
            validator().validate(fx.coop, &input, fx.owner(), Some(&fx.period)),
            Err(LedgerError::InvalidLine { line: 2 })
        ));
    }

    #[test]
    fn test_unbalanced_reported_before_closed_period() {
        let mut fx = Fixture::new();
        fx.period.close(UserId::new(), Utc::now()).unwrap();
        let input = fx.entry(vec![
            JournalLineInput::debit(fx.cash, dec!(10)),
            JournalLineInput::credit(fx.capital, dec!(9)),
        ]);

        assert!(matches!(
            validator().validate(fx.coop, &input, fx.owner(), Some(&fx.period)),
            Err(LedgerError::UnbalancedEntry { .. })
        ));
    }

    #[test]
    fn test_closed_period_rejected() {
        let mut fx = Fixture::new();
        fx.period.close(UserId::new(), Utc::now()).unwrap();
        let input = fx.entry(vec![
            JournalLineInput::debit(fx.cash, dec!(10)),
            JournalLineInput::credit(fx.capital, dec!(10)),
        ]);

        assert!(matches!(
            validator().validate(fx.coop, &input, fx.owner(), Some(&fx.period)),
            Err(LedgerError::InvalidFiscalPeriod { reason: "period is closed", .. })
        ));
    }

    #[test]
    fn test_missing_period_rejected() {
        let fx = Fixture::new();
        let mut input = fx.entry(vec![
            JournalLineInput::debit(fx.cash, dec!(10)),
            JournalLineInput::credit(fx.capital, dec!(10)),
        ]);
        input.fiscal_period_id = FiscalPeriodId::new();

        assert!(matches!(
            validator().validate(fx.coop, &input, fx.owner(), None),
            Err(LedgerError::InvalidFiscalPeriod { period_id, .. }) if period_id == input.fiscal_period_id
        ));
    }
}
