//! Client configuration.

use crate::client::PropertyStrategy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`ServiceBusClient`](crate::ServiceBusClient).
///
/// Every field has a default, so a partial JSON document is a valid config.
///
/// # Examples
///
/// ```
/// use servicebus_http::client::{ClientConfig, PropertyStrategy};
///
/// let config: ClientConfig = serde_json::from_str(
///     r#"{ "max_retries": 6, "property_strategy": { "allow_list": ["Order-Id"] } }"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.max_retries, 6);
/// assert_eq!(config.request_timeout_ms, 30_000);
/// assert_eq!(
///     config.property_strategy,
///     PropertyStrategy::AllowList(vec!["Order-Id".to_string()])
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Deadline for one attempt of a non-receive request.
    pub request_timeout_ms: u64,
    /// Added to the long-poll wait of receive requests to form their deadline.
    pub receive_grace_ms: u64,
    /// Total attempts per request, first try included.
    pub max_retries: u32,
    /// Backoff before the first retry.
    pub retry_delay_ms: u64,
    /// Upper bound of the backoff before jitter.
    pub max_retry_delay_ms: u64,
    /// Extra random delay, as a fraction of the backoff (0.0 disables jitter).
    pub retry_jitter: f64,
    /// How long an idle pooled connection is kept.
    pub pool_idle_timeout_secs: u64,
    /// Idle pooled connections kept per host.
    pub max_idle_connections_per_host: usize,
    /// Proxy for all traffic; empty for none.
    pub proxy_url: String,
    /// Emit retry warnings through `tracing`.
    pub enable_logging: bool,
    /// How custom properties are recovered from received messages.
    pub property_strategy: PropertyStrategy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            receive_grace_ms: 5_000,
            max_retries: 4,
            retry_delay_ms: 100,
            max_retry_delay_ms: 5_000,
            retry_jitter: 0.25,
            pool_idle_timeout_secs: 90,
            max_idle_connections_per_host: 32,
            proxy_url: String::new(),
            enable_logging: true,
            property_strategy: PropertyStrategy::default(),
        }
    }
}

impl ClientConfig {
    /// Per-attempt deadline for non-receive requests.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Per-attempt deadline for a receive that long-polls for `wait_secs`.
    pub fn receive_timeout(&self, wait_secs: u32) -> Duration {
        Duration::from_secs(u64::from(wait_secs)) + Duration::from_millis(self.receive_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.property_strategy, PropertyStrategy::CaptureAll);
        assert!(config.proxy_url.is_empty());
    }

    #[test]
    fn test_receive_timeout_adds_grace() {
        let config = ClientConfig::default();
        assert_eq!(config.receive_timeout(5), Duration::from_secs(10));
    }

    #[test]
    fn test_empty_json_is_default() {
        let config: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_capture_all_from_json() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"property_strategy":"capture_all","enable_logging":false}"#)
                .unwrap();
        assert_eq!(config.property_strategy, PropertyStrategy::CaptureAll);
        assert!(!config.enable_logging);
    }
}
