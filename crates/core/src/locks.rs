//! Per-cooperative write serialization.

use std::sync::Arc;

use dashmap::DashMap;
use koperasi_shared::types::CooperativeId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per cooperative.
///
/// Every read-validate-write sequence on a cooperative's ledger runs while
/// holding its guard, so a period close and a posting into that period
/// cannot interleave. Different cooperatives never contend.
#[derive(Debug, Default)]
pub struct CooperativeLocks {
    locks: DashMap<CooperativeId, Arc<Mutex<()>>>,
}

impl CooperativeLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to the cooperative's ledger.
    pub async fn acquire(&self, cooperative_id: CooperativeId) -> OwnedMutexGuard<()> {
        // Clone out of the map so the shard lock is released before awaiting.
        let lock = self.locks.entry(cooperative_id).or_default().clone();
        lock.lock_owned().await
    }

    /// Number of cooperatives seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns true if no lock has been handed out yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
