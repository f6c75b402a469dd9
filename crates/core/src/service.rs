//! Ledger service: the operations exposed to the rest of the application.
//!
//! Every write runs its read-validate-write sequence while holding the
//! cooperative's lock. Events are emitted only after the write is stored.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use koperasi_shared::LedgerConfig;
use koperasi_shared::types::{AccountId, CooperativeId, FiscalPeriodId, JournalEntryId, UserId};
use rust_decimal::Decimal;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use crate::accounts::{Account, AccountNode, CreateAccountInput, build_hierarchy, validate_new_account};
use crate::cache::BalanceCache;
use crate::events::{EventSink, LedgerEvent};
use crate::fiscal::{
    CreatePeriodInput, FiscalPeriod, due_for_close, select_active, validate_new_period,
};
use crate::ledger::{
    AccountBalance, BalanceCalculator, EntryTotals, JournalEntry, JournalValidator, LedgerError,
    PostEntryInput, ReverseEntryInput, TrialBalance, reversal_input,
};
use crate::locks::CooperativeLocks;
use crate::store::{LedgerStore, StoreError};

/// Entry point for all ledger operations of all cooperatives.
pub struct LedgerService<S> {
    store: Arc<S>,
    events: Arc<dyn EventSink>,
    validator: JournalValidator,
    locks: CooperativeLocks,
    cache: BalanceCache,
    max_attempts: u32,
}

impl<S: LedgerStore> LedgerService<S> {
    /// Creates a service over `store`, publishing to `events`.
    #[must_use]
    pub fn new(store: Arc<S>, events: Arc<dyn EventSink>, config: &LedgerConfig) -> Self {
        let tolerance = if config.balance_tolerance < Decimal::ZERO {
            warn!(
                balance_tolerance = %config.balance_tolerance,
                "negative balance tolerance; using zero"
            );
            Decimal::ZERO
        } else {
            config.balance_tolerance
        };

        Self {
            store,
            events,
            validator: JournalValidator::new(tolerance),
            locks: CooperativeLocks::new(),
            cache: BalanceCache::with_config(&config.balance_cache),
            max_attempts: config.retry.max_attempts.max(1),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // ========== Account Registry ==========

    /// Adds an account to the cooperative's chart of accounts.
    pub async fn create_account(
        &self,
        cooperative_id: CooperativeId,
        input: CreateAccountInput,
    ) -> Result<Account, LedgerError> {
        let guard = self.locks.acquire(cooperative_id).await;

        let existing = self.store.list_accounts(cooperative_id).await?;
        validate_new_account(cooperative_id, &input, &existing)?;

        let account = Account::new(cooperative_id, input);
        self.write_with_retry("insert_account", || self.store.insert_account(&account))
            .await?;
        drop(guard);

        info!(
            cooperative_id = %cooperative_id,
            account_id = %account.id,
            code = %account.code,
            account_type = %account.account_type,
            "account created"
        );
        self.events.emit(LedgerEvent::AccountCreated {
            cooperative_id,
            account_id: account.id,
            code: account.code.clone(),
        });

        Ok(account)
    }

    /// Returns one account of the cooperative.
    pub async fn get_account(
        &self,
        cooperative_id: CooperativeId,
        account_id: AccountId,
    ) -> Result<Account, LedgerError> {
        self.store
            .find_account(cooperative_id, account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    /// Lists the cooperative's accounts ordered by code.
    pub async fn list_accounts(&self, cooperative_id: CooperativeId) -> Result<Vec<Account>, LedgerError> {
        let mut accounts = self.store.list_accounts(cooperative_id).await?;
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    /// Returns the chart of accounts as a tree.
    pub async fn get_hierarchy(
        &self,
        cooperative_id: CooperativeId,
    ) -> Result<Vec<AccountNode>, LedgerError> {
        let accounts = self.store.list_accounts(cooperative_id).await?;
        Ok(build_hierarchy(accounts))
    }

    /// Deletes an account that has no postings and no children.
    pub async fn delete_account(
        &self,
        cooperative_id: CooperativeId,
        account_id: AccountId,
    ) -> Result<(), LedgerError> {
        let _guard = self.locks.acquire(cooperative_id).await;

        let accounts = self.store.list_accounts(cooperative_id).await?;
        if !accounts.iter().any(|account| account.id == account_id) {
            return Err(LedgerError::AccountNotFound(account_id));
        }
        if self
            .store
            .account_has_postings(cooperative_id, account_id)
            .await?
        {
            return Err(LedgerError::AccountInUse(account_id));
        }
        if accounts
            .iter()
            .any(|account| account.parent_id == Some(account_id))
        {
            return Err(LedgerError::AccountHasChildren(account_id));
        }

        let deleted = self
            .write_with_retry("delete_account", || {
                self.store.delete_account(cooperative_id, account_id)
            })
            .await?;
        if !deleted {
            return Err(LedgerError::AccountNotFound(account_id));
        }
        self.cache.invalidate_accounts(&[account_id]);

        info!(cooperative_id = %cooperative_id, account_id = %account_id, "account deleted");
        Ok(())
    }

    /// Balance of an account as of a date (inclusive).
    pub async fn get_balance(
        &self,
        cooperative_id: CooperativeId,
        account_id: AccountId,
        as_of: NaiveDate,
    ) -> Result<AccountBalance, LedgerError> {
        let account = self.get_account(cooperative_id, account_id).await?;

        if let Some(balance) = self.cache.get(account_id, as_of) {
            debug!(account_id = %account_id, %as_of, "balance cache hit");
            return Ok(balance);
        }

        // Fill under the lock so a concurrent posting cannot be missed.
        let _guard = self.locks.acquire(cooperative_id).await;
        if let Some(balance) = self.cache.get(account_id, as_of) {
            return Ok(balance);
        }

        let postings = self
            .store
            .postings_for_account(cooperative_id, account_id)
            .await?;
        let balance =
            BalanceCalculator::balance(account_id, account.normal_balance(), &postings, as_of)?;
        self.cache.insert(balance.clone());

        Ok(balance)
    }

    /// Trial balance of every account of the cooperative as of a date.
    pub async fn trial_balance(
        &self,
        cooperative_id: CooperativeId,
        as_of: NaiveDate,
    ) -> Result<TrialBalance, LedgerError> {
        let _guard = self.locks.acquire(cooperative_id).await;

        let accounts = self.store.list_accounts(cooperative_id).await?;
        let mut balances = Vec::with_capacity(accounts.len());
        for account in accounts {
            let postings = self
                .store
                .postings_for_account(cooperative_id, account.id)
                .await?;
            let balance =
                BalanceCalculator::balance(account.id, account.normal_balance(), &postings, as_of)?;
            balances.push((account, balance));
        }

        let trial = BalanceCalculator::trial_balance(as_of, balances)?;
        if !trial.is_balanced() {
            warn!(
                cooperative_id = %cooperative_id,
                %as_of,
                total_debit = %trial.total_debit,
                total_credit = %trial.total_credit,
                "trial balance does not balance"
            );
        }
        Ok(trial)
    }

    // ========== Fiscal Period Manager ==========

    /// Opens a new fiscal period.
    pub async fn create_period(
        &self,
        cooperative_id: CooperativeId,
        input: CreatePeriodInput,
    ) -> Result<FiscalPeriod, LedgerError> {
        let _guard = self.locks.acquire(cooperative_id).await;

        let existing = self.store.list_periods(cooperative_id).await?;
        validate_new_period(cooperative_id, &input, &existing)?;

        let period = FiscalPeriod::open(cooperative_id, input);
        self.write_with_retry("insert_period", || self.store.insert_period(&period))
            .await?;

        info!(
            cooperative_id = %cooperative_id,
            period_id = %period.id,
            start_date = %period.start_date,
            end_date = %period.end_date,
            "fiscal period created"
        );
        Ok(period)
    }

    /// Returns one period of the cooperative.
    pub async fn get_period(
        &self,
        cooperative_id: CooperativeId,
        period_id: FiscalPeriodId,
    ) -> Result<FiscalPeriod, LedgerError> {
        self.store
            .find_period(cooperative_id, period_id)
            .await?
            .ok_or(LedgerError::PeriodNotFound(period_id))
    }

    /// Returns the cooperative's open period, if any.
    pub async fn get_active_period(
        &self,
        cooperative_id: CooperativeId,
    ) -> Result<Option<FiscalPeriod>, LedgerError> {
        let periods = self.store.list_periods(cooperative_id).await?;
        Ok(select_active(&periods).cloned())
    }

    /// Lists the cooperative's periods ordered by start date.
    pub async fn list_periods(
        &self,
        cooperative_id: CooperativeId,
    ) -> Result<Vec<FiscalPeriod>, LedgerError> {
        let mut periods = self.store.list_periods(cooperative_id).await?;
        periods.sort_by_key(|period| period.start_date);
        Ok(periods)
    }

    /// Closes an open period. Closing is terminal.
    pub async fn close_period(
        &self,
        cooperative_id: CooperativeId,
        period_id: FiscalPeriodId,
        closed_by: UserId,
    ) -> Result<FiscalPeriod, LedgerError> {
        let guard = self.locks.acquire(cooperative_id).await;

        let period = self
            .store
            .find_period(cooperative_id, period_id)
            .await?
            .ok_or(LedgerError::PeriodNotFound(period_id))?;
        let period = self.close_locked(&guard, period, closed_by).await?;
        drop(guard);

        self.emit_closed(&period);
        Ok(period)
    }

    /// Closes the open period if it ended before `today`.
    ///
    /// Returns `None` when nothing is due, so repeated scheduler runs are
    /// harmless.
    pub async fn close_expired_period(
        &self,
        cooperative_id: CooperativeId,
        today: NaiveDate,
        closed_by: UserId,
    ) -> Result<Option<FiscalPeriod>, LedgerError> {
        let guard = self.locks.acquire(cooperative_id).await;

        let periods = self.store.list_periods(cooperative_id).await?;
        let Some(due) = due_for_close(&periods, today).cloned() else {
            debug!(cooperative_id = %cooperative_id, %today, "no fiscal period due for close");
            return Ok(None);
        };
        let period = self.close_locked(&guard, due, closed_by).await?;
        drop(guard);

        self.emit_closed(&period);
        Ok(Some(period))
    }

    async fn close_locked(
        &self,
        _guard: &OwnedMutexGuard<()>,
        mut period: FiscalPeriod,
        closed_by: UserId,
    ) -> Result<FiscalPeriod, LedgerError> {
        period.close(closed_by, Utc::now())?;
        self.write_with_retry("update_period", || self.store.update_period(&period))
            .await?;

        info!(
            cooperative_id = %period.cooperative_id,
            period_id = %period.id,
            closed_by = %closed_by,
            "fiscal period closed"
        );
        Ok(period)
    }

    fn emit_closed(&self, period: &FiscalPeriod) {
        if let (Some(closed_by), Some(closed_at)) = (period.closed_by, period.closed_at) {
            self.events.emit(LedgerEvent::FiscalPeriodClosed {
                cooperative_id: period.cooperative_id,
                period_id: period.id,
                closed_by,
                closed_at,
            });
        }
    }

    // ========== Journal Entries ==========

    /// Validates and stores a journal entry.
    pub async fn post_entry(
        &self,
        cooperative_id: CooperativeId,
        input: PostEntryInput,
    ) -> Result<JournalEntry, LedgerError> {
        let guard = self.locks.acquire(cooperative_id).await;
        let (entry, totals) = self
            .post_locked(&guard, cooperative_id, input.normalized(), None)
            .await?;
        drop(guard);

        self.emit_created(&entry, &totals);
        Ok(entry)
    }

    /// Posts an entry that mirrors `input.entry_id` with sides swapped.
    pub async fn reverse_entry(
        &self,
        cooperative_id: CooperativeId,
        input: ReverseEntryInput,
    ) -> Result<JournalEntry, LedgerError> {
        let guard = self.locks.acquire(cooperative_id).await;

        let original = self
            .store
            .find_entry(cooperative_id, input.entry_id)
            .await?
            .ok_or(LedgerError::EntryNotFound(input.entry_id))?;
        if self
            .store
            .find_reversal_of(cooperative_id, original.id)
            .await?
            .is_some()
        {
            return Err(LedgerError::AlreadyReversed(original.id));
        }

        let reversal = reversal_input(&original, &input);
        let (entry, totals) = self
            .post_locked(&guard, cooperative_id, reversal, Some(original.id))
            .await?;
        drop(guard);

        info!(
            cooperative_id = %cooperative_id,
            original_entry_id = %original.id,
            reversal_entry_id = %entry.id,
            reason = %input.reason,
            "journal entry reversed"
        );
        self.emit_created(&entry, &totals);
        self.events.emit(LedgerEvent::JournalEntryReversed {
            cooperative_id,
            original_entry_id: original.id,
            reversal_entry_id: entry.id,
        });

        Ok(entry)
    }

    /// Returns one entry of the cooperative.
    pub async fn get_entry(
        &self,
        cooperative_id: CooperativeId,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, LedgerError> {
        self.store
            .find_entry(cooperative_id, entry_id)
            .await?
            .ok_or(LedgerError::EntryNotFound(entry_id))
    }

    /// Lists entries in posting order, optionally for a single period.
    pub async fn list_entries(
        &self,
        cooperative_id: CooperativeId,
        period_id: Option<FiscalPeriodId>,
    ) -> Result<Vec<JournalEntry>, LedgerError> {
        Ok(self.store.list_entries(cooperative_id, period_id).await?)
    }

    async fn post_locked(
        &self,
        _guard: &OwnedMutexGuard<()>,
        cooperative_id: CooperativeId,
        input: PostEntryInput,
        reverses: Option<JournalEntryId>,
    ) -> Result<(JournalEntry, EntryTotals), LedgerError> {
        let owners: HashMap<AccountId, CooperativeId> = self
            .store
            .list_accounts(cooperative_id)
            .await?
            .into_iter()
            .map(|account| (account.id, account.cooperative_id))
            .collect();
        let period = self
            .store
            .find_period(cooperative_id, input.fiscal_period_id)
            .await?;

        let totals = self
            .validator
            .validate(
                cooperative_id,
                &input,
                |id| owners.get(&id).copied(),
                period.as_ref(),
            )
            .inspect_err(|err| {
                warn!(
                    cooperative_id = %cooperative_id,
                    fiscal_period_id = %input.fiscal_period_id,
                    code = err.error_code(),
                    error = %err,
                    "journal entry rejected"
                );
            })?;

        let entry = JournalEntry::from_input(cooperative_id, input, reverses);
        self.write_with_retry("insert_entry", || self.store.insert_entry(&entry))
            .await?;
        self.cache.invalidate_accounts(&entry.account_ids());

        info!(
            cooperative_id = %cooperative_id,
            entry_id = %entry.id,
            fiscal_period_id = %entry.fiscal_period_id,
            lines = entry.lines.len(),
            total = %totals.debit,
            "journal entry posted"
        );
        Ok((entry, totals))
    }

    fn emit_created(&self, entry: &JournalEntry, totals: &EntryTotals) {
        self.events.emit(LedgerEvent::JournalEntryCreated {
            cooperative_id: entry.cooperative_id,
            entry_id: entry.id,
            fiscal_period_id: entry.fiscal_period_id,
            entry_date: entry.entry_date,
            total: totals.debit,
            created_by: entry.created_by,
        });
    }

    /// Runs a store write, retrying serialization conflicts.
    async fn write_with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        mut write: F,
    ) -> Result<T, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 1;
        loop {
            match write().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    warn!(operation, attempt, "serialization conflict; retrying");
                    attempt += 1;
                }
                Err(err) if err.is_retryable() => {
                    return Err(LedgerError::Internal(format!(
                        "{operation} still conflicting after {attempt} attempts"
                    )));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
