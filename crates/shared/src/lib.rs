//! Shared types, errors, and configuration for the Koperasi ledger.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for tenant-scoped entity references
//! - Amount helpers (storage scale vs display scale)
//! - Application-wide error types
//! - Configuration management
//! - Tracing bootstrap for binaries

pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

pub use config::{AppConfig, LedgerConfig, LoggingConfig};
pub use error::{AppError, AppResult, ErrorBody};
