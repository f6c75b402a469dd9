//! Reversing entries for posted journal entries.
//!
//! Posted entries are never edited. A correction is a new entry with every
//! debit and credit swapped, linked back to the original.

use super::types::{JournalEntry, JournalLineInput, PostEntryInput, ReverseEntryInput};

/// Builds the posting input that reverses `original`.
///
/// For each original line:
/// - Debits become credits and credits become debits
/// - Account and amount are preserved
/// - Memo is prefixed with "Reversal: "
#[must_use]
pub fn reversal_input(original: &JournalEntry, input: &ReverseEntryInput) -> PostEntryInput {
    let lines = original
        .lines
        .iter()
        .map(|line| JournalLineInput {
            account_id: line.account_id,
            debit: line.credit,
            credit: line.debit,
            memo: Some(format!(
                "Reversal: {}",
                line.memo.clone().unwrap_or_default()
            )),
        })
        .collect();

    PostEntryInput {
        fiscal_period_id: input.fiscal_period_id,
        entry_date: input.entry_date,
        description: format!(
            "Reversal of entry {}. Reason: {}",
            original.id, input.reason
        ),
        lines,
        created_by: input.created_by,
    }
}
