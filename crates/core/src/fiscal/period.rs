//! Fiscal period types.

use chrono::{DateTime, NaiveDate, Utc};
use koperasi_shared::types::{CooperativeId, FiscalPeriodId, UserId};
use serde::{Deserialize, Serialize};

use crate::ledger::error::LedgerError;

/// Status of a fiscal period.
///
/// `Open → Closed` is the only transition, and it is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiscalPeriodStatus {
    /// Period accepts postings.
    Open,
    /// Period is closed, no new postings allowed.
    Closed,
}

/// An accounting window owned by one cooperative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalPeriod {
    /// Unique identifier.
    pub id: FiscalPeriodId,
    /// Owning cooperative.
    pub cooperative_id: CooperativeId,
    /// Period name (e.g., "FY2024").
    pub name: String,
    /// First day of the period (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the period (inclusive).
    pub end_date: NaiveDate,
    /// Current status.
    pub status: FiscalPeriodStatus,
    /// When the period was created.
    pub created_at: DateTime<Utc>,
    /// Who closed the period.
    pub closed_by: Option<UserId>,
    /// When the period was closed.
    pub closed_at: Option<DateTime<Utc>>,
}

impl FiscalPeriod {
    /// Creates a new open period.
    #[must_use]
    pub fn open(cooperative_id: CooperativeId, input: CreatePeriodInput) -> Self {
        Self {
            id: FiscalPeriodId::new(),
            cooperative_id,
            name: input.name,
            start_date: input.start_date,
            end_date: input.end_date,
            status: FiscalPeriodStatus::Open,
            created_at: Utc::now(),
            closed_by: None,
            closed_at: None,
        }
    }

    /// Returns true if postings are accepted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == FiscalPeriodStatus::Open
    }

    /// Transitions the period to `Closed`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AlreadyClosed` on every call after the first.
    pub fn close(&mut self, closed_by: UserId, closed_at: DateTime<Utc>) -> Result<(), LedgerError> {
        if !self.is_open() {
            return Err(LedgerError::AlreadyClosed(self.id));
        }
        self.status = FiscalPeriodStatus::Closed;
        self.closed_by = Some(closed_by);
        self.closed_at = Some(closed_at);
        Ok(())
    }
}

/// Input for creating a fiscal period.
#[derive(Debug, Clone)]
pub struct CreatePeriodInput {
    /// Period name.
    pub name: String,
    /// First day (inclusive).
    pub start_date: NaiveDate,
    /// Last day (inclusive).
    pub end_date: NaiveDate,
}
