//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Ledger rules and caching.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ledger configuration, passed explicitly into the ledger service.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Absolute tolerance when comparing total debits and credits.
    #[serde(default = "default_balance_tolerance")]
    pub balance_tolerance: Decimal,
    /// Balance read-through cache.
    #[serde(default)]
    pub balance_cache: BalanceCacheConfig,
    /// Retry policy for storage serialization conflicts.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_balance_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

impl LedgerConfig {
    /// Checks constraints the field types cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` for a negative balance tolerance.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.balance_tolerance < Decimal::ZERO {
            return Err(config::ConfigError::Message(format!(
                "ledger.balance_tolerance must not be negative, got {}",
                self.balance_tolerance
            )));
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: default_balance_tolerance(),
            balance_cache: BalanceCacheConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Balance cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceCacheConfig {
    /// Maximum number of cached balances.
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
    /// Time-to-live in seconds for each cached balance.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}

impl Default for BalanceCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

/// Retry configuration for infrastructure failures.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts for a write hitting a serialization conflict (1 = no retry).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    2
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "koperasi=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `KOPERASI__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or a value is
    /// out of range.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("KOPERASI").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.ledger.validate()?;
        Ok(config)
    }
}
