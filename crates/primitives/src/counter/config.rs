//! Counter configuration
//!
//! Bounds and ledger TTL are fixed when the counter is built. They can come
//! from defaults, a TOML document, and `TALLY_*` environment variables, in
//! that order of precedence (later wins).
//!
//! ```toml
//! min_value = 0
//! max_value = 1000
//! idempotency_ttl_secs = 300
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding [`CounterConfig::idempotency_ttl_secs`]
pub const ENV_TTL_SECONDS: &str = "TALLY_IDEMPOTENCY_TTL_SECONDS";
/// Environment variable overriding [`CounterConfig::min_value`]
pub const ENV_MIN_VALUE: &str = "TALLY_MIN_VALUE";
/// Environment variable overriding [`CounterConfig::max_value`]
pub const ENV_MAX_VALUE: &str = "TALLY_MAX_VALUE";

/// Default lower bound
pub const DEFAULT_MIN_VALUE: i64 = 0;
/// Default upper bound
pub const DEFAULT_MAX_VALUE: i64 = 1_000_000_000;
/// Default ledger record lifetime
pub const DEFAULT_IDEMPOTENCY_TTL_SECS: u64 = 60;

/// Invalid or unreadable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML document did not parse
    #[error("invalid config document: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment variable held a value of the wrong type
    #[error("invalid value {value:?} for {var}")]
    Env {
        /// Variable name
        var: &'static str,
        /// Raw value found
        value: String,
    },

    /// Bounds do not describe a range around zero
    #[error("invalid bounds: need min_value <= 0 <= max_value and min_value < max_value (got {min}..={max})")]
    InvalidBounds {
        /// Configured lower bound
        min: i64,
        /// Configured upper bound
        max: i64,
    },

    /// Ledger records would expire immediately
    #[error("idempotency_ttl_secs must be greater than zero")]
    ZeroTtl,
}

/// Bounds and ledger policy of the counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CounterConfig {
    /// Lowest value the counter may hold
    pub min_value: i64,
    /// Highest value the counter may hold
    pub max_value: i64,
    /// Seconds a ledger record stays live after its first submission
    pub idempotency_ttl_secs: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            min_value: DEFAULT_MIN_VALUE,
            max_value: DEFAULT_MAX_VALUE,
            idempotency_ttl_secs: DEFAULT_IDEMPOTENCY_TTL_SECS,
        }
    }
}

impl CounterConfig {
    /// Config with the given bounds and the default TTL
    pub fn with_bounds(min_value: i64, max_value: i64) -> Self {
        Self {
            min_value,
            max_value,
            ..Self::default()
        }
    }

    /// Replace the ledger TTL
    pub fn ttl_secs(mut self, secs: u64) -> Self {
        self.idempotency_ttl_secs = secs;
        self
    }

    /// Parse a TOML document; missing fields keep their defaults
    pub fn from_toml_str(doc: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(doc)?)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let doc = std::fs::read_to_string(path)?;
        Self::from_toml_str(&doc)
    }

    /// Apply `TALLY_*` environment variables on top of this config
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from any variable source
    ///
    /// `lookup` returns the raw value of a variable, `None` if unset.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, ENV_TTL_SECONDS)? {
            self.idempotency_ttl_secs = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_MIN_VALUE)? {
            self.min_value = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_MAX_VALUE)? {
            self.max_value = v;
        }
        Ok(self)
    }

    /// Check the bounds contain zero and the TTL is positive
    ///
    /// Zero must be in range because an absent counter reads as zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_value > 0 || self.max_value < 0 || self.min_value >= self.max_value {
            return Err(ConfigError::InvalidBounds {
                min: self.min_value,
                max: self.max_value,
            });
        }
        if self.idempotency_ttl_secs == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        Ok(())
    }

    /// Ledger record lifetime
    pub fn idempotency_ttl(&self) -> Duration {
        Duration::from_secs(self.idempotency_ttl_secs)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value: raw }),
    }
}
