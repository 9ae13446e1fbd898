//! Synchronizer configuration.
//!
//! Defaults suit a single-user dashboard; every field can be overridden in
//! code (`with_*`) or from the environment ([`DaybookConfig::from_env`]).
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DAYBOOK_TIMEZONE` | `Europe/London` |
//! | `DAYBOOK_SHUTDOWN_TIMEOUT_SECS` | `30` |
//! | `DAYBOOK_BROADCAST_CAPACITY` | `64` |

use chrono_tz::Tz;
use daybook_runtime::StoreConfig;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Timezone is not a known IANA name
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    /// Variable is set but cannot be parsed
    #[error("Invalid value for {var}: {value}")]
    InvalidValue {
        /// Environment variable name
        var: &'static str,
        /// Offending value
        value: String,
    },
}

/// Synchronizer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaybookConfig {
    /// Timezone whose calendar day counts as "today" in stats
    pub timezone: Tz,
    /// How long shutdown waits for in-flight remote calls
    pub shutdown_timeout: Duration,
    /// Outcomes buffered per observer before it lags
    pub broadcast_capacity: usize,
}

impl DaybookConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("DAYBOOK_TIMEZONE") {
            let parsed = value.trim().parse::<Tz>();
            config.timezone = parsed.map_err(|_| ConfigError::InvalidTimezone(value))?;
        }

        if let Some(value) = lookup("DAYBOOK_SHUTDOWN_TIMEOUT_SECS") {
            let secs = parse_number(&value, "DAYBOOK_SHUTDOWN_TIMEOUT_SECS")?;
            config.shutdown_timeout = Duration::from_secs(secs);
        }

        if let Some(value) = lookup("DAYBOOK_BROADCAST_CAPACITY") {
            let capacity = parse_number(&value, "DAYBOOK_BROADCAST_CAPACITY")?;
            if capacity == 0 {
                return Err(ConfigError::InvalidValue {
                    var: "DAYBOOK_BROADCAST_CAPACITY",
                    value,
                });
            }
            config.broadcast_capacity = usize::try_from(capacity).map_err(|_| {
                ConfigError::InvalidValue {
                    var: "DAYBOOK_BROADCAST_CAPACITY",
                    value: value.clone(),
                }
            })?;
        }

        Ok(config)
    }

    /// Set the stats timezone
    #[must_use]
    pub const fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Set the shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the outcome broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Store runtime configuration derived from this config
    #[must_use]
    pub const fn store_config(&self) -> StoreConfig {
        StoreConfig {
            broadcast_capacity: self.broadcast_capacity,
            default_shutdown_timeout: self.shutdown_timeout,
        }
    }
}

impl Default for DaybookConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::London,
            shutdown_timeout: Duration::from_secs(30),
            broadcast_capacity: 64,
        }
    }
}

fn parse_number(value: &str, var: &'static str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can use unwrap

    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = DaybookConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DaybookConfig::default());
        assert_eq!(config.timezone, chrono_tz::Europe::London);
    }

    #[test]
    fn reads_all_variables() {
        let config = DaybookConfig::from_lookup(lookup(&[
            ("DAYBOOK_TIMEZONE", "America/New_York"),
            ("DAYBOOK_SHUTDOWN_TIMEOUT_SECS", "5"),
            ("DAYBOOK_BROADCAST_CAPACITY", "128"),
        ]))
        .unwrap();

        assert_eq!(config.timezone, chrono_tz::America::New_York);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.store_config().broadcast_capacity, 128);
    }

    #[test]
    fn rejects_unknown_timezone() {
        let result = DaybookConfig::from_lookup(lookup(&[("DAYBOOK_TIMEZONE", "Mars/Olympus")]));
        assert_eq!(
            result,
            Err(ConfigError::InvalidTimezone("Mars/Olympus".to_string()))
        );
    }

    #[test]
    fn rejects_bad_numbers() {
        let result =
            DaybookConfig::from_lookup(lookup(&[("DAYBOOK_SHUTDOWN_TIMEOUT_SECS", "soon")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = DaybookConfig::from_lookup(lookup(&[("DAYBOOK_BROADCAST_CAPACITY", "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
