//! Monetary amount helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` everywhere. Storage keeps four decimal
//! places so interest and rate calculations do not lose precision; display
//! rounds to two.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for stored amounts.
pub const STORAGE_SCALE: u32 = 4;

/// Decimal places shown to users.
pub const DISPLAY_SCALE: u32 = 2;

/// Normalizes an amount to storage precision.
///
/// Uses banker's rounding (round half to even) to minimize cumulative errors.
#[must_use]
pub fn to_storage(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(STORAGE_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Formats an amount for display with exactly two decimal places.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded =
        amount.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(DISPLAY_SCALE);
    rounded.to_string()
}
