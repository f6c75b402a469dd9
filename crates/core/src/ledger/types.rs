//! Journal entry domain types.
//!
//! A journal entry is an append-only, balanced set of lines. Once stored it
//! is never edited; corrections are posted as reversing entries.

use chrono::{DateTime, NaiveDate, Utc};
use koperasi_shared::types::{
    AccountId, CooperativeId, FiscalPeriodId, JournalEntryId, UserId, to_storage,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Input for a single journal line.
///
/// Exactly one of `debit`/`credit` must be positive; the other must be zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalLineInput {
    /// The account to post to.
    pub account_id: AccountId,
    /// Debit amount (0 for a credit line).
    pub debit: Decimal,
    /// Credit amount (0 for a debit line).
    pub credit: Decimal,
    /// Optional memo for this line.
    pub memo: Option<String>,
}

impl JournalLineInput {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            memo: None,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            memo: None,
        }
    }

    /// Attaches a memo.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// Returns true if exactly one side is positive and the other is zero.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match (self.debit.is_zero(), self.credit.is_zero()) {
            (true, false) => self.credit > Decimal::ZERO,
            (false, true) => self.debit > Decimal::ZERO,
            _ => false,
        }
    }
}

/// Input for posting a journal entry.
#[derive(Debug, Clone)]
pub struct PostEntryInput {
    /// The period the entry is posted into.
    pub fiscal_period_id: FiscalPeriodId,
    /// Accounting date of the entry.
    pub entry_date: NaiveDate,
    /// Description of the entry.
    pub description: String,
    /// Lines, in order (at least 2).
    pub lines: Vec<JournalLineInput>,
    /// The user posting the entry (already authorized).
    pub created_by: UserId,
}

impl PostEntryInput {
    /// Rounds every amount to storage precision.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        for line in &mut self.lines {
            line.debit = to_storage(line.debit);
            line.credit = to_storage(line.credit);
        }
        self
    }

    /// Sums debits and credits across all lines.
    ///
    /// Returns `None` if either side overflows `Decimal`.
    #[must_use]
    pub fn totals(&self) -> Option<EntryTotals> {
        self.lines
            .iter()
            .try_fold(EntryTotals::default(), |totals, line| {
                Some(EntryTotals::new(
                    totals.debit.checked_add(line.debit)?,
                    totals.credit.checked_add(line.credit)?,
                ))
            })
    }
}

/// Input for reversing a posted entry.
#[derive(Debug, Clone)]
pub struct ReverseEntryInput {
    /// The entry to reverse.
    pub entry_id: JournalEntryId,
    /// Open period that receives the reversal.
    pub fiscal_period_id: FiscalPeriodId,
    /// Accounting date of the reversal.
    pub entry_date: NaiveDate,
    /// The user posting the reversal.
    pub created_by: UserId,
    /// Why the original is being reversed.
    pub reason: String,
}

/// A stored journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// 1-based position within the entry.
    pub line_number: u32,
    /// The account posted to.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Optional memo.
    pub memo: Option<String>,
}

/// A stored, immutable journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Owning cooperative.
    pub cooperative_id: CooperativeId,
    /// Period the entry was posted into.
    pub fiscal_period_id: FiscalPeriodId,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Description.
    pub description: String,
    /// Lines in posting order.
    pub lines: Vec<JournalLine>,
    /// The entry this one reverses, if it is a reversal.
    pub reverses: Option<JournalEntryId>,
    /// The user who posted it.
    pub created_by: UserId,
    /// When it was stored.
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    /// Builds an entry from validated input.
    #[must_use]
    pub fn from_input(
        cooperative_id: CooperativeId,
        input: PostEntryInput,
        reverses: Option<JournalEntryId>,
    ) -> Self {
        let lines = input
            .lines
            .into_iter()
            .zip(1u32..)
            .map(|(line, line_number)| JournalLine {
                line_number,
                account_id: line.account_id,
                debit: line.debit,
                credit: line.credit,
                memo: line.memo,
            })
            .collect();

        Self {
            id: JournalEntryId::new(),
            cooperative_id,
            fiscal_period_id: input.fiscal_period_id,
            entry_date: input.entry_date,
            description: input.description,
            lines,
            reverses,
            created_by: input.created_by,
            created_at: Utc::now(),
        }
    }

    /// Distinct accounts touched by this entry, in first-seen order.
    #[must_use]
    pub fn account_ids(&self) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !ids.contains(&line.account_id) {
                ids.push(line.account_id);
            }
        }
        ids
    }
}

/// Entry totals for validation and display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryTotals {
    /// Total debit amount.
    pub debit: Decimal,
    /// Total credit amount.
    pub credit: Decimal,
}

impl EntryTotals {
    /// Creates new totals from debit and credit sums.
    #[must_use]
    pub const fn new(debit: Decimal, credit: Decimal) -> Self {
        Self { debit, credit }
    }

    /// Returns the difference between debits and credits, if representable.
    #[must_use]
    pub fn difference(&self) -> Option<Decimal> {
        self.debit.checked_sub(self.credit)
    }

    /// Returns true if debits and credits agree within `tolerance`.
    #[must_use]
    pub fn is_balanced_within(&self, tolerance: Decimal) -> bool {
        self.difference()
            .is_some_and(|difference| difference.abs() <= tolerance)
    }
}
