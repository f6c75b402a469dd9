//! In-process `LedgerStore` backed by hash maps.
//!
//! Used by tests and the seeder. Writes can be made to fail with a
//! serialization conflict to exercise retry handling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use koperasi_shared::types::{AccountId, CooperativeId, FiscalPeriodId, JournalEntryId};
use tokio::sync::RwLock;

use super::{LedgerStore, StoreError, StoreResult};
use crate::accounts::Account;
use crate::fiscal::FiscalPeriod;
use crate::ledger::{AccountPosting, JournalEntry};

#[derive(Default)]
struct Tables {
    accounts: HashMap<AccountId, Account>,
    periods: HashMap<FiscalPeriodId, FiscalPeriod>,
    entries: Vec<JournalEntry>,
}

/// Hash-map backed store.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    failing_writes: AtomicU32,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` writes fail with `StoreError::Conflict`.
    pub fn fail_next_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    fn injected_failure(&self) -> StoreResult<()> {
        match self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        {
            Ok(_) => Err(StoreError::Conflict),
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn insert_account(&self, account: &Account) -> StoreResult<()> {
        self.injected_failure()?;
        let mut tables = self.tables.write().await;
        tables.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_account(
        &self,
        cooperative_id: CooperativeId,
        account_id: AccountId,
    ) -> StoreResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .get(&account_id)
            .filter(|account| account.cooperative_id == cooperative_id)
            .cloned())
    }

    async fn list_accounts(&self, cooperative_id: CooperativeId) -> StoreResult<Vec<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .filter(|account| account.cooperative_id == cooperative_id)
            .cloned()
            .collect())
    }

    async fn delete_account(
        &self,
        cooperative_id: CooperativeId,
        account_id: AccountId,
    ) -> StoreResult<bool> {
        self.injected_failure()?;
        let mut tables = self.tables.write().await;
        let owned = tables
            .accounts
            .get(&account_id)
            .is_some_and(|account| account.cooperative_id == cooperative_id);
        if owned {
            tables.accounts.remove(&account_id);
        }
        Ok(owned)
    }

    async fn account_has_postings(
        &self,
        cooperative_id: CooperativeId,
        account_id: AccountId,
    ) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .entries
            .iter()
            .filter(|entry| entry.cooperative_id == cooperative_id)
            .flat_map(|entry| &entry.lines)
            .any(|line| line.account_id == account_id))
    }

    async fn insert_period(&self, period: &FiscalPeriod) -> StoreResult<()> {
        self.injected_failure()?;
        let mut tables = self.tables.write().await;
        tables.periods.insert(period.id, period.clone());
        Ok(())
    }

    async fn find_period(
        &self,
        cooperative_id: CooperativeId,
        period_id: FiscalPeriodId,
    ) -> StoreResult<Option<FiscalPeriod>> {
        let tables = self.tables.read().await;
        Ok(tables
            .periods
            .get(&period_id)
            .filter(|period| period.cooperative_id == cooperative_id)
            .cloned())
    }

    async fn list_periods(&self, cooperative_id: CooperativeId) -> StoreResult<Vec<FiscalPeriod>> {
        let tables = self.tables.read().await;
        Ok(tables
            .periods
            .values()
            .filter(|period| period.cooperative_id == cooperative_id)
            .cloned()
            .collect())
    }

    async fn update_period(&self, period: &FiscalPeriod) -> StoreResult<()> {
        self.injected_failure()?;
        let mut tables = self.tables.write().await;
        match tables.periods.get_mut(&period.id) {
            Some(stored) if stored.cooperative_id == period.cooperative_id => {
                *stored = period.clone();
                Ok(())
            }
            _ => Err(StoreError::Unavailable(format!(
                "fiscal period {} vanished during update",
                period.id
            ))),
        }
    }

    async fn insert_entry(&self, entry: &JournalEntry) -> StoreResult<()> {
        self.injected_failure()?;
        let mut tables = self.tables.write().await;
        tables.entries.push(entry.clone());
        Ok(())
    }

    async fn find_entry(
        &self,
        cooperative_id: CooperativeId,
        entry_id: JournalEntryId,
    ) -> StoreResult<Option<JournalEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .entries
            .iter()
            .find(|entry| entry.id == entry_id && entry.cooperative_id == cooperative_id)
            .cloned())
    }

    async fn list_entries(
        &self,
        cooperative_id: CooperativeId,
        period_id: Option<FiscalPeriodId>,
    ) -> StoreResult<Vec<JournalEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .entries
            .iter()
            .filter(|entry| entry.cooperative_id == cooperative_id)
            .filter(|entry| period_id.is_none_or(|id| entry.fiscal_period_id == id))
            .cloned()
            .collect())
    }

    async fn find_reversal_of(
        &self,
        cooperative_id: CooperativeId,
        entry_id: JournalEntryId,
    ) -> StoreResult<Option<JournalEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .entries
            .iter()
            .find(|entry| entry.cooperative_id == cooperative_id && entry.reverses == Some(entry_id))
            .cloned())
    }

    async fn postings_for_account(
        &self,
        cooperative_id: CooperativeId,
        account_id: AccountId,
    ) -> StoreResult<Vec<AccountPosting>> {
        let tables = self.tables.read().await;
        let mut postings = Vec::new();

        for entry in tables
            .entries
            .iter()
            .filter(|entry| entry.cooperative_id == cooperative_id)
        {
            let Some(period) = tables.periods.get(&entry.fiscal_period_id) else {
                return Err(StoreError::Unavailable(format!(
                    "entry {} references missing fiscal period {}",
                    entry.id, entry.fiscal_period_id
                )));
            };

            postings.extend(
                entry
                    .lines
                    .iter()
                    .filter(|line| line.account_id == account_id)
                    .map(|line| AccountPosting {
                        entry_id: entry.id,
                        entry_date: entry.entry_date,
                        period_start: period.start_date,
                        debit: line.debit,
                        credit: line.credit,
                    }),
            );
        }

        Ok(postings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{AccountType, CreateAccountInput};

    fn account(coop: CooperativeId, code: &str) -> Account {
        Account::new(coop, CreateAccountInput::new(code, "Cash", AccountType::Asset))
    }

    #[tokio::test]
    async fn test_reads_are_tenant_scoped() {
        let store = InMemoryStore::new();
        let coop_a = CooperativeId::new();
        let coop_b = CooperativeId::new();
        let cash = account(coop_a, "1000");
        store.insert_account(&cash).await.unwrap();

        assert!(store.find_account(coop_a, cash.id).await.unwrap().is_some());
        assert!(store.find_account(coop_b, cash.id).await.unwrap().is_none());
        assert!(store.list_accounts(coop_b).await.unwrap().is_empty());
        assert!(!store.delete_account(coop_b, cash.id).await.unwrap());
        assert!(store.find_account(coop_a, cash.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let store = InMemoryStore::new();
        let coop = CooperativeId::new();
        store.fail_next_writes(2);

        assert_eq!(
            store.insert_account(&account(coop, "1000")).await,
            Err(StoreError::Conflict)
        );
        assert_eq!(
            store.insert_account(&account(coop, "1000")).await,
            Err(StoreError::Conflict)
        );
        assert!(store.insert_account(&account(coop, "1000")).await.is_ok());
        assert_eq!(store.list_accounts(coop).await.unwrap().len(), 1);
    }

    #[test]
    fn test_only_conflicts_are_retryable() {
        assert!(StoreError::Conflict.is_retryable());
        assert!(!StoreError::Unavailable("down".into()).is_retryable());
    }
}
