//! Common types used across the application.

pub mod amount;
pub mod id;

pub use amount::{DISPLAY_SCALE, STORAGE_SCALE, format_amount, to_storage};
pub use id::*;
