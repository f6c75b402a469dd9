//! Ledger consistency core for Koperasi.
//!
//! This crate owns the accounting rules of every cooperative: its chart of
//! accounts, fiscal periods, journal entries and balances. It has no web or
//! database dependencies; persistence sits behind [`store::LedgerStore`].
//!
//! # Modules
//!
//! - `accounts` - Chart of accounts and hierarchy
//! - `fiscal` - Fiscal periods and their lifecycle
//! - `ledger` - Journal entries, posting rules and balances
//! - `service` - The operations callers use, with locking and caching
//! - `store` - Persistence trait and in-memory implementation
//! - `events` - Events emitted after commits

pub mod accounts;
pub mod cache;
pub mod events;
pub mod fiscal;
pub mod ledger;
pub mod locks;
pub mod service;
pub mod store;

pub use events::{BroadcastEventBus, EventSink, LedgerEvent, NoopEventSink};
pub use ledger::{ErrorKind, LedgerError};
pub use service::LedgerService;
pub use store::{InMemoryStore, LedgerStore, StoreError};
