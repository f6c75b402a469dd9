//! Persistence boundary for the ledger.
//!
//! Every read is scoped by `CooperativeId`; a record belonging to another
//! cooperative is indistinguishable from a missing one.

pub mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use koperasi_shared::types::{AccountId, CooperativeId, FiscalPeriodId, JournalEntryId};
use thiserror::Error;

use crate::accounts::Account;
use crate::fiscal::FiscalPeriod;
use crate::ledger::{AccountPosting, JournalEntry};

/// Errors raised by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Serialization failure; the write can be retried.
    #[error("serialization conflict")]
    Conflict,

    /// Backend unreachable or failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true if the failed write may succeed when retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage of accounts, fiscal periods and journal entries.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Inserts a new account.
    async fn insert_account(&self, account: &Account) -> StoreResult<()>;

    /// Finds an account of the cooperative.
    async fn find_account(
        &self,
        cooperative_id: CooperativeId,
        account_id: AccountId,
    ) -> StoreResult<Option<Account>>;

    /// Lists all accounts of the cooperative.
    async fn list_accounts(&self, cooperative_id: CooperativeId) -> StoreResult<Vec<Account>>;

    /// Deletes an account. Returns false if it did not exist.
    async fn delete_account(
        &self,
        cooperative_id: CooperativeId,
        account_id: AccountId,
    ) -> StoreResult<bool>;

    /// Returns true if any journal line references the account.
    async fn account_has_postings(
        &self,
        cooperative_id: CooperativeId,
        account_id: AccountId,
    ) -> StoreResult<bool>;

    /// Inserts a new fiscal period.
    async fn insert_period(&self, period: &FiscalPeriod) -> StoreResult<()>;

    /// Finds a fiscal period of the cooperative.
    async fn find_period(
        &self,
        cooperative_id: CooperativeId,
        period_id: FiscalPeriodId,
    ) -> StoreResult<Option<FiscalPeriod>>;

    /// Lists all fiscal periods of the cooperative.
    async fn list_periods(&self, cooperative_id: CooperativeId) -> StoreResult<Vec<FiscalPeriod>>;

    /// Replaces a stored fiscal period.
    async fn update_period(&self, period: &FiscalPeriod) -> StoreResult<()>;

    /// Inserts an entry together with all of its lines, atomically.
    async fn insert_entry(&self, entry: &JournalEntry) -> StoreResult<()>;

    /// Finds a journal entry of the cooperative.
    async fn find_entry(
        &self,
        cooperative_id: CooperativeId,
        entry_id: JournalEntryId,
    ) -> StoreResult<Option<JournalEntry>>;

    /// Lists entries in insertion order, optionally restricted to one period.
    async fn list_entries(
        &self,
        cooperative_id: CooperativeId,
        period_id: Option<FiscalPeriodId>,
    ) -> StoreResult<Vec<JournalEntry>>;

    /// Finds the entry that reverses `entry_id`, if any.
    async fn find_reversal_of(
        &self,
        cooperative_id: CooperativeId,
        entry_id: JournalEntryId,
    ) -> StoreResult<Option<JournalEntry>>;

    /// Every line posted to the account, joined with its entry date and
    /// the start date of the entry's period.
    async fn postings_for_account(
        &self,
        cooperative_id: CooperativeId,
        account_id: AccountId,
    ) -> StoreResult<Vec<AccountPosting>>;
}
