//! # Configuration Management
//!
//! Environment-driven configuration for the rotation engine. The surrounding
//! backend owns richer configuration concerns; this module only covers the
//! knobs the rotation core itself consumes.

use std::time::Duration;

use crate::errors::{KeywheelError, Result};

/// Top-level configuration for the keywheel engine
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub rotation: RotationConfig,
}

/// Tuning for the background rotation worker and pass driver
#[derive(Debug, Clone)]
pub struct RotationConfig {
    /// How often the worker runs a rotation pass
    pub tick_interval: Duration,

    /// How far into the future a failed attempt is rescheduled
    pub retry_backoff: Duration,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self { tick_interval: Duration::from_secs(5), retry_backoff: Duration::from_secs(10) }
    }
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self { rotation: RotationConfig::from_env()? })
    }
}

impl RotationConfig {
    /// Create rotation configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let tick_interval = read_secs("KEYWHEEL_ROTATION_TICK_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.tick_interval);

        let retry_backoff = read_secs("KEYWHEEL_ROTATION_RETRY_BACKOFF_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.retry_backoff);

        Ok(Self { tick_interval, retry_backoff })
    }
}

fn read_secs(var: &str) -> Result<Option<u64>> {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| KeywheelError::config(format!("Invalid {}: {}", var, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.rotation.tick_interval, Duration::from_secs(5));
        assert_eq!(config.rotation.retry_backoff, Duration::from_secs(10));
    }

    // Environment mutation is process-wide, so both env cases run in one test.
    #[test]
    fn test_config_from_env() {
        env::set_var("KEYWHEEL_ROTATION_TICK_SECS", "30");
        env::set_var("KEYWHEEL_ROTATION_RETRY_BACKOFF_SECS", "60");

        let config = Config::from_env().unwrap();
        assert_eq!(config.rotation.tick_interval, Duration::from_secs(30));
        assert_eq!(config.rotation.retry_backoff, Duration::from_secs(60));

        env::set_var("KEYWHEEL_ROTATION_TICK_SECS", "not-a-number");
        assert!(RotationConfig::from_env().is_err());

        env::remove_var("KEYWHEEL_ROTATION_TICK_SECS");
        env::remove_var("KEYWHEEL_ROTATION_RETRY_BACKOFF_SECS");
    }
}
