//! Double-entry bookkeeping logic.
//!
//! This module implements the journal side of the ledger:
//! - Journal entry and line types
//! - Posting validation rules
//! - Balance and trial balance calculations
//! - Reversing entries
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod reversal;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use balance::{AccountBalance, AccountPosting, BalanceCalculator, TrialBalance, TrialBalanceRow};
pub use error::{ErrorKind, LedgerError};
pub use reversal::reversal_input;
pub use types::{
    EntryTotals, JournalEntry, JournalLine, JournalLineInput, PostEntryInput, ReverseEntryInput,
};
pub use validation::JournalValidator;
