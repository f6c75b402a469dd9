//! Fiscal period management.
//!
//! - `period` - The period record and its `open → closed` transition
//! - `manager` - Creation rules and active-period selection

pub mod manager;
pub mod period;

#[cfg(test)]
mod manager_props;

pub use manager::{
    date_ranges_overlap, due_for_close, select_active, validate_date_range, validate_new_period,
};
pub use period::{CreatePeriodInput, FiscalPeriod, FiscalPeriodStatus};
