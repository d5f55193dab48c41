//! Distributed lock timing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default lease length in milliseconds.
const fn default_lock_timeout_ms() -> u64 {
    5_000
}

/// Default time to wait for a contended lock.
const fn default_wait_timeout_ms() -> u64 {
    10_000
}

/// Default pause between acquisition attempts.
const fn default_retry_delay_ms() -> u64 {
    25
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LockConfig {
    /// Lease granted to a holder. A critical section that outlives it fails.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// How long `acquire` keeps retrying before giving up.
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// Sleep between acquisition attempts.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            wait_timeout_ms: default_wait_timeout_ms(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl LockConfig {
    #[must_use]
    pub const fn lease(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    #[must_use]
    pub const fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Reject timings that cannot work.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero lease or a retry delay
    /// longer than the wait timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "lock.lock_timeout_ms".into(),
                reason: "lease must be greater than zero".into(),
            });
        }
        if self.retry_delay_ms > self.wait_timeout_ms {
            return Err(ConfigError::InvalidValue {
                field: "lock.retry_delay_ms".into(),
                reason: format!(
                    "retry delay {}ms exceeds wait timeout {}ms",
                    self.retry_delay_ms, self.wait_timeout_ms
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = LockConfig::default();
        assert_eq!(config.lease(), Duration::from_secs(5));
        assert_eq!(config.wait_timeout(), Duration::from_secs(10));
        assert_eq!(config.retry_delay(), Duration::from_millis(25));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_lease_is_rejected() {
        let config = LockConfig {
            lock_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "lock.lock_timeout_ms"
        ));
    }

    #[test]
    fn retry_longer_than_wait_is_rejected() {
        let config = LockConfig {
            wait_timeout_ms: 10,
            retry_delay_ms: 50,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
