//! Retry policy for connection attempts
//!
//! [`RetryPolicy`] bounds the number of consecutive failed attempts and
//! grows the delay between them linearly with the attempt count.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for connection retries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Consecutive failed attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay step in milliseconds; the wait after failure `n` is `n * step`
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,

    /// Time allowed for one attempt to print its success line
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Keep the failure count of an exhausted `connect` for the next call
    ///
    /// When false every `connect` call starts counting from zero.
    #[serde(default = "default_carry_over_attempts")]
    pub carry_over_attempts: bool,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_step_ms() -> u64 {
    2_000
}
fn default_connect_timeout_ms() -> u64 {
    30_000
}
fn default_carry_over_attempts() -> bool {
    true
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_step_ms: default_backoff_step_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            carry_over_attempts: default_carry_over_attempts(),
        }
    }
}

impl RetryPolicy {
    /// Validate the entire policy
    ///
    /// # Returns
    ///
    /// * `Ok(())` if all fields are valid
    /// * `Err(PolicyValidationError)` with the first validation error encountered
    pub fn validate(&self) -> Result<(), PolicyValidationError> {
        if self.max_attempts < 1 || self.max_attempts > 20 {
            return Err(PolicyValidationError::InvalidMaxAttempts(self.max_attempts));
        }

        if self.backoff_step_ms > 300_000 {
            return Err(PolicyValidationError::InvalidBackoffStep(
                self.backoff_step_ms,
            ));
        }

        if self.connect_timeout_ms == 0 {
            return Err(PolicyValidationError::InvalidConnectTimeout(
                self.connect_timeout_ms,
            ));
        }

        Ok(())
    }

    /// Delay before retrying after `failures` consecutive failed attempts
    pub fn backoff(&self, failures: u32) -> Duration {
        Duration::from_millis(self.backoff_step_ms.saturating_mul(u64::from(failures)))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Validation errors for RetryPolicy
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolicyValidationError {
    #[error("max_attempts must be between 1 and 20, got: {0}")]
    InvalidMaxAttempts(u32),

    #[error("backoff_step_ms must be at most 300000, got: {0}")]
    InvalidBackoffStep(u64),

    #[error("connect_timeout_ms must be greater than zero, got: {0}")]
    InvalidConnectTimeout(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.connect_timeout(), Duration::from_secs(30));
        assert!(policy.carry_over_attempts);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_backoff_grows_with_failures() {
        let policy = RetryPolicy::default();

        // Then: 2s after the first failure, 4s after the second
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert!(policy.backoff(3) > policy.backoff(2));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(
            policy.validate(),
            Err(PolicyValidationError::InvalidMaxAttempts(0))
        );

        policy.max_attempts = 3;
        policy.connect_timeout_ms = 0;
        assert_eq!(
            policy.validate(),
            Err(PolicyValidationError::InvalidConnectTimeout(0))
        );

        policy.connect_timeout_ms = 1_000;
        policy.backoff_step_ms = 600_000;
        assert_eq!(
            policy.validate(),
            Err(PolicyValidationError::InvalidBackoffStep(600_000))
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let policy: RetryPolicy = toml::from_str("max_attempts = 5").unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff_step_ms, 2_000);
        assert_eq!(policy.connect_timeout_ms, 30_000);
    }
}
