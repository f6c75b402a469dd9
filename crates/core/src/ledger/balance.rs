//! Account balance calculations.
//!
//! Balances are a pure function of stored postings:
//! - Debit-normal accounts (Asset, Expense): balance += debit - credit
//! - Credit-normal accounts (Liability, Equity, Revenue): balance += credit - debit

use chrono::NaiveDate;
use koperasi_shared::types::{AccountId, JournalEntryId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use crate::accounts::types::{Account, AccountType, NormalBalance};

/// One journal line as seen from a single account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPosting {
    /// The entry the line belongs to.
    pub entry_id: JournalEntryId,
    /// Accounting date of the entry.
    pub entry_date: NaiveDate,
    /// Start date of the period the entry was posted into.
    pub period_start: NaiveDate,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

impl AccountPosting {
    /// Returns true if this posting counts towards a balance as of `as_of`.
    ///
    /// The entry must be dated on or before `as_of`, and its period must
    /// already have started by then.
    #[must_use]
    pub fn counts_as_of(&self, as_of: NaiveDate) -> bool {
        self.entry_date <= as_of && self.period_start <= as_of
    }
}

/// Account balance at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// The date the balance is computed for (inclusive).
    pub as_of: NaiveDate,
    /// Side on which the balance is positive.
    pub normal_balance: NormalBalance,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// Net balance on the normal side.
    pub balance: Decimal,
}

impl AccountBalance {
    /// Creates a zero balance.
    #[must_use]
    pub const fn new(account_id: AccountId, normal_balance: NormalBalance, as_of: NaiveDate) -> Self {
        Self {
            account_id,
            as_of,
            normal_balance,
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    /// Adds a posting's amounts.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Internal` if a running total overflows; the
    /// balance is left unchanged.
    pub fn apply(&mut self, debit: Decimal, credit: Decimal) -> Result<(), LedgerError> {
        let overflow = || LedgerError::Internal(format!("balance of account {} overflowed", self.account_id));
        let debit_total = self.debit_total.checked_add(debit).ok_or_else(overflow)?;
        let credit_total = self.credit_total.checked_add(credit).ok_or_else(overflow)?;
        let balance = self
            .normal_balance
            .checked_balance_change(debit_total, credit_total)
            .ok_or_else(overflow)?;

        self.debit_total = debit_total;
        self.credit_total = credit_total;
        self.balance = balance;
        Ok(())
    }
}

/// Computes balances and trial balances from postings.
pub struct BalanceCalculator;

impl BalanceCalculator {
    /// Balance of one account as of a date.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Internal` if the totals overflow.
    pub fn balance(
        account_id: AccountId,
        normal_balance: NormalBalance,
        postings: &[AccountPosting],
        as_of: NaiveDate,
    ) -> Result<AccountBalance, LedgerError> {
        let mut balance = AccountBalance::new(account_id, normal_balance, as_of);
        for posting in postings.iter().filter(|p| p.counts_as_of(as_of)) {
            balance.apply(posting.debit, posting.credit)?;
        }
        Ok(balance)
    }

    /// Builds a trial balance from per-account balances.
    ///
    /// A positive balance lands in the account's normal column; a negative
    /// one in the opposite column.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Internal` if a column total overflows.
    pub fn trial_balance(
        as_of: NaiveDate,
        balances: Vec<(Account, AccountBalance)>,
    ) -> Result<TrialBalance, LedgerError> {
        let mut rows: Vec<TrialBalanceRow> = balances
            .into_iter()
            .map(|(account, balance)| {
                let (debit, credit) = match (balance.normal_balance, balance.balance.is_sign_negative()) {
                    (NormalBalance::Debit, false) => (balance.balance, Decimal::ZERO),
                    (NormalBalance::Debit, true) => (Decimal::ZERO, -balance.balance),
                    (NormalBalance::Credit, false) => (Decimal::ZERO, balance.balance),
                    (NormalBalance::Credit, true) => (-balance.balance, Decimal::ZERO),
                };
                TrialBalanceRow {
                    account_id: account.id,
                    code: account.code,
                    name: account.name,
                    account_type: account.account_type,
                    debit,
                    credit,
                }
            })
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));

        let column_total = |column: fn(&TrialBalanceRow) -> Decimal| {
            rows.iter()
                .try_fold(Decimal::ZERO, |total, row| total.checked_add(column(row)))
                .ok_or_else(|| LedgerError::Internal(format!("trial balance as of {as_of} overflowed")))
        };
        let total_debit = column_total(|row| row.debit)?;
        let total_credit = column_total(|row| row.credit)?;

        Ok(TrialBalance {
            as_of,
            rows,
            total_debit,
            total_credit,
        })
    }
}

/// One account line of a trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    /// The account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Debit column.
    pub debit: Decimal,
    /// Credit column.
    pub credit: Decimal,
}

/// Trial balance of a cooperative as of a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    /// The date (inclusive).
    pub as_of: NaiveDate,
    /// Rows sorted by account code.
    pub rows: Vec<TrialBalanceRow>,
    /// Sum of the debit column.
    pub total_debit: Decimal,
    /// Sum of the credit column.
    pub total_credit: Decimal,
}

impl TrialBalance {
    /// Returns true if both columns agree.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use koperasi_shared::types::CooperativeId;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn posting(entry_date: NaiveDate, debit: Decimal, credit: Decimal) -> AccountPosting {
        AccountPosting {
            entry_id: JournalEntryId::new(),
            entry_date,
            period_start: date(2024, 1, 1),
            debit,
            credit,
        }
    }

    fn account(code: &str, account_type: AccountType) -> Account {
        Account {
            id: AccountId::new(),
            cooperative_id: CooperativeId::nil(),
            code: code.to_string(),
            name: code.to_string(),
            account_type,
            subtype: None,
            parent_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_debit_normal_balance() {
        let postings = vec![
            posting(date(2024, 1, 10), dec!(500.00), dec!(0)),
            posting(date(2024, 2, 10), dec!(0), dec!(120.00)),
        ];

        let balance =
            BalanceCalculator::balance(AccountId::new(), NormalBalance::Debit, &postings, date(2024, 12, 31)).unwrap();

        assert_eq!(balance.debit_total, dec!(500.00));
        assert_eq!(balance.credit_total, dec!(120.00));
        assert_eq!(balance.balance, dec!(380.00));
    }

    #[test]
    fn test_credit_normal_balance() {
        let postings = vec![posting(date(2024, 1, 10), dec!(0), dec!(500.00))];

        let balance =
            BalanceCalculator::balance(AccountId::new(), NormalBalance::Credit, &postings, date(2024, 1, 10)).unwrap();

        assert_eq!(balance.balance, dec!(500.00));
    }

    #[test]
    fn test_postings_after_as_of_excluded() {
        let postings = vec![
            posting(date(2024, 1, 10), dec!(100), dec!(0)),
            posting(date(2024, 1, 11), dec!(50), dec!(0)),
        ];

        let balance =
            BalanceCalculator::balance(AccountId::new(), NormalBalance::Debit, &postings, date(2024, 1, 10)).unwrap();

        assert_eq!(balance.balance, dec!(100));
    }

    #[test]
    fn test_postings_in_period_not_yet_started_excluded() {
        // Entry dated before its period started (back-dated into a later period).
        let early = AccountPosting {
            entry_id: JournalEntryId::new(),
            entry_date: date(2023, 12, 30),
            period_start: date(2024, 1, 1),
            debit: dec!(75),
            credit: dec!(0),
        };

        let before =
            BalanceCalculator::balance(AccountId::new(), NormalBalance::Debit, &[early.clone()], date(2023, 12, 31)).unwrap();
        let after =
            BalanceCalculator::balance(AccountId::new(), NormalBalance::Debit, &[early], date(2024, 1, 1)).unwrap();

        assert_eq!(before.balance, dec!(0));
        assert_eq!(after.balance, dec!(75));
    }

    #[test]
    fn test_trial_balance_columns() {
        let cash = account("1000", AccountType::Asset);
        let capital = account("3000", AccountType::Equity);
        let overdrawn = account("1100", AccountType::Asset);
        let as_of = date(2024, 12, 31);

        let mut cash_balance = AccountBalance::new(cash.id, NormalBalance::Debit, as_of);
        cash_balance.apply(dec!(500), dec!(0)).unwrap();
        let mut capital_balance = AccountBalance::new(capital.id, NormalBalance::Credit, as_of);
        capital_balance.apply(dec!(0), dec!(450)).unwrap();
        let mut overdrawn_balance = AccountBalance::new(overdrawn.id, NormalBalance::Debit, as_of);
        overdrawn_balance.apply(dec!(0), dec!(50)).unwrap();

        let trial = BalanceCalculator::trial_balance(
            as_of,
            vec![
                (capital, capital_balance),
                (cash, cash_balance),
                (overdrawn, overdrawn_balance),
            ],
        )
        .unwrap();

        let codes: Vec<_> = trial.rows.iter().map(|row| row.code.as_str()).collect();
        assert_eq!(codes, vec!["1000", "1100", "3000"]);
        assert_eq!(trial.rows[1].credit, dec!(50));
        assert_eq!(trial.total_debit, dec!(500));
        assert_eq!(trial.total_credit, dec!(500));
        assert!(trial.is_balanced());
    }

    #[test]
    fn test_overflowing_balance_is_internal_error() {
        let postings = vec![
            posting(date(2024, 1, 10), Decimal::MAX, dec!(0)),
            posting(date(2024, 1, 11), Decimal::MAX, dec!(0)),
        ];

        let err = BalanceCalculator::balance(
            AccountId::new(),
            NormalBalance::Debit,
            &postings,
            date(2024, 12, 31),
        )
        .unwrap_err();

        assert!(matches!(err, LedgerError::Internal(_)));
    }

    #[test]
    fn test_failed_apply_leaves_balance_unchanged() {
        let mut balance = AccountBalance::new(AccountId::new(), NormalBalance::Debit, date(2024, 1, 1));
        balance.apply(Decimal::MAX, dec!(0)).unwrap();

        assert!(balance.apply(dec!(1), dec!(0)).is_err());
        assert_eq!(balance.debit_total, Decimal::MAX);
        assert_eq!(balance.balance, Decimal::MAX);
    }

    /// Strategy for generating signed amounts as (debit, credit) pairs.
    fn posting_amounts() -> impl Strategy<Value = (Decimal, Decimal)> {
        (1i64..1_000_000i64, any::<bool>()).prop_map(|(cents, is_debit)| {
            let amount = Decimal::new(cents, 2);
            if is_debit {
                (amount, Decimal::ZERO)
            } else {
                (Decimal::ZERO, amount)
            }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// *For any* postings, adding one dated after `as_of` leaves the
        /// balance unchanged, and adding one dated on `as_of` shifts it by
        /// exactly that posting's contribution.
        #[test]
        fn prop_balance_round_trip(
            existing in prop::collection::vec(posting_amounts(), 0..20),
            (debit, credit) in posting_amounts(),
            is_debit_normal in any::<bool>(),
        ) {
            let side = if is_debit_normal { NormalBalance::Debit } else { NormalBalance::Credit };
            let as_of = date(2024, 6, 30);
            let account_id = AccountId::new();
            let mut postings: Vec<AccountPosting> = existing
                .iter()
                .map(|(d, c)| posting(date(2024, 3, 1), *d, *c))
                .collect();

            let before = BalanceCalculator::balance(account_id, side, &postings, as_of).unwrap();

            postings.push(posting(date(2024, 7, 1), debit, credit));
            let after_later = BalanceCalculator::balance(account_id, side, &postings, as_of).unwrap();
            prop_assert_eq!(&after_later, &before);

            postings.push(posting(as_of, debit, credit));
            let after_same_day = BalanceCalculator::balance(account_id, side, &postings, as_of).unwrap();
            prop_assert_eq!(
                after_same_day.balance,
                before.balance + side.balance_change(debit, credit)
            );
        }
    }
}
