//! Utility functions for the Service Bus client.
//!
//! This module provides helper functions for:
//! - Status code classification
//! - Exponential backoff and jitter

use crate::protocol::constants::status;
use std::time::Duration;

/// Check if status code indicates access denied
pub fn is_access_denied_status(status: u16) -> bool {
    matches!(status, 401 | 403)
}

/// Check if status code completes a send (200 or 201)
pub fn is_accepted_status(code: u16) -> bool {
    matches!(code, status::OK | status::CREATED)
}

/// Exponential backoff delay calculation
///
/// Returns `base * multiplier^attempt`, saturating instead of overflowing.
pub fn exponential_backoff(attempt: u32, base: Duration, multiplier: f64) -> Duration {
    let factor = multiplier.max(1.0).powi(attempt.min(32) as i32);
    Duration::try_from_secs_f64(base.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

/// Add up to `ratio * delay` of random extra delay
///
/// Spreads the retries of many clients that failed at the same moment.
pub fn with_jitter(delay: Duration, ratio: f64) -> Duration {
    if ratio <= 0.0 || delay.is_zero() {
        return delay;
    }
    let extra = delay.as_secs_f64() * ratio * rand::random::<f64>();
    delay.saturating_add(Duration::try_from_secs_f64(extra).unwrap_or_default())
}

/// Whole milliseconds in `delay`, saturating at `u64::MAX`
pub fn saturating_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}
