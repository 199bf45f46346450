//! Exponential backoff policy for transient transport failures.

use crate::client::utils::{exponential_backoff, with_jitter};
use crate::client::ClientConfig;
use std::time::Duration;

/// Retry parameters for the [`ResilientExecutor`](crate::client::ResilientExecutor).
///
/// The delay before retry `n` (0-based) is
/// `min(initial_delay * backoff_multiplier^n, max_delay)`, plus a random extra
/// of up to `jitter` times that delay.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use servicebus_http::client::RetryPolicy;
///
/// let policy = RetryPolicy {
///     max_attempts: 5,
///     initial_delay: Duration::from_millis(50),
///     max_delay: Duration::from_secs(2),
///     backoff_multiplier: 2.0,
///     jitter: 0.0,
/// };
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first try included (default: 4)
    pub max_attempts: u32,
    /// Delay before the first retry (default: 100ms)
    pub initial_delay: Duration,
    /// Cap on the backoff before jitter (default: 5s)
    pub max_delay: Duration,
    /// Growth factor between retries (default: 2.0)
    pub backoff_multiplier: f64,
    /// Random extra delay as a fraction of the backoff (default: 0.25)
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for RetryPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            initial_delay: Duration::from_millis(config.retry_delay_ms),
            max_delay: Duration::from_millis(config.max_retry_delay_ms),
            backoff_multiplier: 2.0,
            jitter: config.retry_jitter.max(0.0),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff before retry `attempt` (0-based), without jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        exponential_backoff(attempt, self.initial_delay, self.backoff_multiplier).min(self.max_delay)
    }

    /// Backoff before retry `attempt` (0-based), with jitter applied.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        with_jitter(self.delay_for_attempt(attempt), self.jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.initial_delay, Duration::from_millis(100));
        assert_eq!(policy.max_delay, Duration::from_secs(5));
        assert!((policy.backoff_multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(20), Duration::from_secs(5));
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_stays_within_ratio() {
        let policy = RetryPolicy::default();
        for attempt in 0..4 {
            let base = policy.delay_for_attempt(attempt);
            let jittered = policy.jittered_delay(attempt);
            assert!(jittered >= base);
            assert!(jittered <= base.mul_f64(1.25));
        }
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let config = ClientConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert_eq!(RetryPolicy::from(&config).max_attempts, 1);
    }
}
