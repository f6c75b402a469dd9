//! Ledger error types for validation and state errors.
//!
//! Every failure carries a stable machine-readable code and maps onto one of
//! the coarse `ErrorKind`s surfaced at the request boundary. Only storage
//! serialization conflicts are retryable.

use chrono::NaiveDate;
use koperasi_shared::AppError;
use koperasi_shared::types::{AccountId, FiscalPeriodId, JournalEntryId};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::accounts::types::{AccountSubtype, AccountType};
use crate::store::StoreError;

/// Coarse error classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    Validation,
    /// Referenced entity absent.
    NotFound,
    /// Duplicate, overlapping, or still-referenced entity.
    Conflict,
    /// Debits and credits differ beyond tolerance.
    UnbalancedEntry,
    /// Posting to a closed or unknown period.
    InvalidFiscalPeriod,
    /// Closing a period twice.
    AlreadyClosed,
    /// Infrastructure failure.
    Internal,
}

impl ErrorKind {
    /// Stable name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::UnbalancedEntry => "unbalanced_entry",
            Self::InvalidFiscalPeriod => "invalid_fiscal_period",
            Self::AlreadyClosed => "already_closed",
            Self::Internal => "internal",
        }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Journal entry must have at least 2 lines.
    #[error("Journal entry must have at least 2 lines, got {count}")]
    InsufficientLines {
        /// Number of lines supplied.
        count: usize,
    },

    /// A line must carry exactly one positive amount.
    #[error("Line {line} must have exactly one positive debit or credit amount")]
    InvalidLine {
        /// 1-based line number.
        line: usize,
    },

    /// Account does not exist in the entry's cooperative.
    #[error("Account {0} does not exist in this cooperative")]
    InvalidAccount(AccountId),

    /// Unrecognized account type name.
    #[error("Unknown account type: {0}")]
    UnknownAccountType(String),

    /// Unrecognized account subtype name.
    #[error("Unknown account subtype: {0}")]
    UnknownAccountSubtype(String),

    /// Subtype belongs to a different account type.
    #[error("Subtype {subtype} is not valid for {account_type} accounts")]
    SubtypeMismatch {
        /// Requested subtype.
        subtype: AccountSubtype,
        /// Requested account type.
        account_type: AccountType,
    },

    /// Required text field is blank.
    #[error("Field {0} must not be empty")]
    EmptyField(&'static str),

    /// Parent account does not exist in the cooperative.
    #[error("Parent account not found: {0}")]
    ParentNotFound(AccountId),

    /// Parent chain loops back on itself.
    #[error("Parent chain of account {0} contains a cycle")]
    ParentCycle(AccountId),

    /// Period start is not strictly before its end.
    #[error("Start date {start_date} must be before end date {end_date}")]
    InvalidDateRange {
        /// Requested start.
        start_date: NaiveDate,
        /// Requested end.
        end_date: NaiveDate,
    },

    /// Line amounts sum beyond the representable range.
    #[error("Journal entry amounts exceed the supported range")]
    AmountOutOfRange,

    // ========== Not Found Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Fiscal period not found.
    #[error("Fiscal period not found: {0}")]
    PeriodNotFound(FiscalPeriodId),

    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    // ========== Conflict Errors ==========
    /// Account code already used in the cooperative.
    #[error("Account code {0} already exists")]
    DuplicateAccountCode(String),

    /// Period range intersects an existing period.
    #[error("Period overlaps existing period {existing} ({start_date} to {end_date})")]
    OverlappingPeriod {
        /// The clashing period.
        existing: FiscalPeriodId,
        /// Its start date.
        start_date: NaiveDate,
        /// Its end date.
        end_date: NaiveDate,
    },

    /// Another period is still open.
    #[error("Fiscal period {0} is still open; close it before opening another")]
    OpenPeriodExists(FiscalPeriodId),

    /// Account is referenced by journal lines.
    #[error("Account {0} is referenced by journal entries and cannot be deleted")]
    AccountInUse(AccountId),

    /// Account still has child accounts.
    #[error("Account {0} has child accounts and cannot be deleted")]
    AccountHasChildren(AccountId),

    /// Entry already has a reversal.
    #[error("Journal entry {0} has already been reversed")]
    AlreadyReversed(JournalEntryId),

    // ========== Posting Errors ==========
    /// Debits and credits differ beyond tolerance.
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Period is unknown or closed.
    #[error("Cannot post to fiscal period {period_id}: {reason}")]
    InvalidFiscalPeriod {
        /// The referenced period.
        period_id: FiscalPeriodId,
        /// Why the period was rejected.
        reason: &'static str,
    },

    /// Period was already closed.
    #[error("Fiscal period {0} is already closed")]
    AlreadyClosed(FiscalPeriodId),

    // ========== Infrastructure Errors ==========
    /// Concurrent modification detected by storage.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientLines { .. }
            | Self::InvalidLine { .. }
            | Self::InvalidAccount(_)
            | Self::UnknownAccountType(_)
            | Self::UnknownAccountSubtype(_)
            | Self::SubtypeMismatch { .. }
            | Self::EmptyField(_)
            | Self::ParentNotFound(_)
            | Self::ParentCycle(_)
            | Self::InvalidDateRange { .. }
            | Self::AmountOutOfRange => ErrorKind::Validation,

            Self::AccountNotFound(_) | Self::PeriodNotFound(_) | Self::EntryNotFound(_) => {
                ErrorKind::NotFound
            }

            Self::DuplicateAccountCode(_)
            | Self::OverlappingPeriod { .. }
            | Self::OpenPeriodExists(_)
            | Self::AccountInUse(_)
            | Self::AccountHasChildren(_)
            | Self::AlreadyReversed(_) => ErrorKind::Conflict,

            Self::UnbalancedEntry { .. } => ErrorKind::UnbalancedEntry,
            Self::InvalidFiscalPeriod { .. } => ErrorKind::InvalidFiscalPeriod,
            Self::AlreadyClosed(_) => ErrorKind::AlreadyClosed,

            Self::ConcurrentModification | Self::Storage(_) | Self::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines { .. } => "INSUFFICIENT_LINES",
            Self::InvalidLine { .. } => "INVALID_LINE",
            Self::InvalidAccount(_) => "INVALID_ACCOUNT",
            Self::UnknownAccountType(_) => "UNKNOWN_ACCOUNT_TYPE",
            Self::UnknownAccountSubtype(_) => "UNKNOWN_ACCOUNT_SUBTYPE",
            Self::SubtypeMismatch { .. } => "SUBTYPE_MISMATCH",
            Self::EmptyField(_) => "EMPTY_FIELD",
            Self::ParentNotFound(_) => "PARENT_NOT_FOUND",
            Self::ParentCycle(_) => "PARENT_CYCLE",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::AmountOutOfRange => "AMOUNT_OUT_OF_RANGE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::DuplicateAccountCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::OverlappingPeriod { .. } => "OVERLAPPING_PERIOD",
            Self::OpenPeriodExists(_) => "OPEN_PERIOD_EXISTS",
            Self::AccountInUse(_) => "ACCOUNT_IN_USE",
            Self::AccountHasChildren(_) => "ACCOUNT_HAS_CHILDREN",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::InvalidFiscalPeriod { .. } => "INVALID_FISCAL_PERIOD",
            Self::AlreadyClosed(_) => "PERIOD_ALREADY_CLOSED",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::UnbalancedEntry
            | ErrorKind::InvalidFiscalPeriod
            | ErrorKind::AlreadyClosed => 422,
            ErrorKind::Internal => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::ConcurrentModification,
            StoreError::Unavailable(message) => Self::Storage(message),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::UnbalancedEntry
            | ErrorKind::InvalidFiscalPeriod
            | ErrorKind::AlreadyClosed => Self::BusinessRule {
                code: err.error_code(),
                message,
            },
            ErrorKind::Internal => Self::Internal(message),
        }
    }
}
