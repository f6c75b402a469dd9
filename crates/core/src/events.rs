//! Ledger events emitted after a write commits.
//!
//! Delivery is fire-and-forget: a sink never fails the operation that
//! produced the event.

use chrono::{DateTime, NaiveDate, Utc};
use koperasi_shared::types::{AccountId, CooperativeId, FiscalPeriodId, JournalEntryId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Default capacity of the broadcast channel.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// A committed change to a cooperative's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// An account was added to the chart of accounts.
    AccountCreated {
        /// Owning cooperative.
        cooperative_id: CooperativeId,
        /// The new account.
        account_id: AccountId,
        /// Its code.
        code: String,
    },
    /// A journal entry was posted.
    JournalEntryCreated {
        /// Owning cooperative.
        cooperative_id: CooperativeId,
        /// The new entry.
        entry_id: JournalEntryId,
        /// Period it was posted into.
        fiscal_period_id: FiscalPeriodId,
        /// Accounting date.
        entry_date: NaiveDate,
        /// Total debits (equal to credits within tolerance).
        total: Decimal,
        /// Posting user.
        created_by: UserId,
    },
    /// A journal entry was reversed by a new entry.
    JournalEntryReversed {
        /// Owning cooperative.
        cooperative_id: CooperativeId,
        /// The entry being reversed.
        original_entry_id: JournalEntryId,
        /// The reversing entry.
        reversal_entry_id: JournalEntryId,
    },
    /// A fiscal period was closed.
    FiscalPeriodClosed {
        /// Owning cooperative.
        cooperative_id: CooperativeId,
        /// The closed period.
        period_id: FiscalPeriodId,
        /// Closing user.
        closed_by: UserId,
        /// When it was closed.
        closed_at: DateTime<Utc>,
    },
}

impl LedgerEvent {
    /// The cooperative the event belongs to.
    #[must_use]
    pub const fn cooperative_id(&self) -> CooperativeId {
        match self {
            Self::AccountCreated { cooperative_id, .. }
            | Self::JournalEntryCreated { cooperative_id, .. }
            | Self::JournalEntryReversed { cooperative_id, .. }
            | Self::FiscalPeriodClosed { cooperative_id, .. } => *cooperative_id,
        }
    }
}

/// Receives ledger events.
pub trait EventSink: Send + Sync {
    /// Delivers an event. Must not block or fail.
    fn emit(&self, event: LedgerEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: LedgerEvent) {}
}

/// Fans events out to any number of subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastEventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl BroadcastEventBus {
    /// Creates a bus with the default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus buffering up to `capacity` events per slow subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for BroadcastEventBus {
    fn emit(&self, event: LedgerEvent) {
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            trace!(cooperative_id = %event.cooperative_id(), "no event subscribers");
        }
    }
}
