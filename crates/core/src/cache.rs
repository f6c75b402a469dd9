//! Account balance caching using Moka.
//!
//! Balances are cached per `(account, as_of)`. A posting invalidates every
//! cached date of each account it touches.

use std::time::Duration;

use chrono::NaiveDate;
use koperasi_shared::config::BalanceCacheConfig;
use koperasi_shared::types::AccountId;
use moka::sync::Cache;
use tracing::warn;

use crate::ledger::AccountBalance;

/// Read-through cache for computed balances.
#[derive(Clone)]
pub struct BalanceCache {
    cache: Cache<(AccountId, NaiveDate), AccountBalance>,
}

impl BalanceCache {
    /// Creates a cache sized and timed by `config`.
    #[must_use]
    pub fn with_config(config: &BalanceCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .support_invalidation_closures()
            .build();

        Self { cache }
    }

    /// Returns the cached balance, if present.
    #[must_use]
    pub fn get(&self, account_id: AccountId, as_of: NaiveDate) -> Option<AccountBalance> {
        self.cache.get(&(account_id, as_of))
    }

    /// Stores a computed balance.
    pub fn insert(&self, balance: AccountBalance) {
        self.cache
            .insert((balance.account_id, balance.as_of), balance);
    }

    /// Drops every cached date of the given accounts.
    pub fn invalidate_accounts(&self, account_ids: &[AccountId]) {
        if account_ids.is_empty() {
            return;
        }
        let targets = account_ids.to_vec();
        if let Err(err) = self
            .cache
            .invalidate_entries_if(move |(account_id, _), _| targets.contains(account_id))
        {
            warn!(error = %err, "balance cache predicate rejected; clearing cache");
            self.cache.invalidate_all();
        }
    }
}

impl Default for BalanceCache {
    fn default() -> Self {
        Self::with_config(&BalanceCacheConfig::default())
    }
}
