//! Request execution with per-attempt deadlines and exponential backoff.
//!
//! The [`ResilientExecutor`] sends an [`OutboundRequest`] through an
//! [`HttpTransport`] and retries transient failures:
//!
//! ```text
//! attempt 1 ──fail──▶ sleep(backoff(0) + jitter) ──▶ attempt 2 ──fail──▶ ... ──▶ Transport error
//!     │                                                  │
//!     └──response (any status)──▶ returned               └──response──▶ returned
//! ```
//!
//! A completed HTTP exchange ends the loop, whatever its status; status codes
//! are interpreted by the lifecycle operation that issued the request.

use crate::client::utils::saturating_millis;
use crate::client::{ClientConfig, RetryPolicy};
use crate::error::{Result, ServiceBusError};
use crate::types::{OutboundRequest, RawResponse};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Performs one HTTP exchange.
///
/// Implementations return [`ServiceBusError::Connection`] for failures that
/// may succeed on retry. They must read the whole body before returning so
/// that a broken stream surfaces here rather than in the decoder.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` and read the full response.
    async fn send(&self, request: &OutboundRequest) -> Result<RawResponse>;
}

/// [`HttpTransport`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport from the pooling and proxy settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceBusError::Config`] if the proxy URL is invalid or the
    /// TLS backend cannot be initialised.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .pool_max_idle_per_host(config.max_idle_connections_per_host);

        if !config.proxy_url.is_empty() {
            let proxy = reqwest::Proxy::all(&config.proxy_url)
                .map_err(|e| ServiceBusError::Config(format!("invalid proxy URL: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ServiceBusError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<RawResponse> {
        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(RawResponse { status, headers, body })
    }
}

/// Sends requests with a per-attempt timeout and backoff-with-jitter retries.
///
/// Holds no per-call state; clones share the transport.
#[derive(Clone)]
pub struct ResilientExecutor {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    default_timeout: Duration,
    enable_logging: bool,
}

impl ResilientExecutor {
    /// Create an executor over `transport`.
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy, default_timeout: Duration) -> Self {
        Self {
            transport,
            policy,
            default_timeout,
            enable_logging: true,
        }
    }

    /// Silence the per-retry warnings.
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// The retry policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute with the default per-attempt timeout.
    ///
    /// # Errors
    ///
    /// See [`execute_with_timeout`](Self::execute_with_timeout).
    pub async fn execute(&self, request: &OutboundRequest) -> Result<RawResponse> {
        self.execute_with_timeout(request, self.default_timeout).await
    }

    /// Execute, bounding each attempt by `per_attempt`.
    ///
    /// # Errors
    ///
    /// - [`ServiceBusError::Transport`] once `max_attempts` transient failures
    ///   have occurred.
    /// - Any non-transient error from the transport, unchanged.
    pub async fn execute_with_timeout(
        &self,
        request: &OutboundRequest,
        per_attempt: Duration,
    ) -> Result<RawResponse> {
        let mut attempt = 0;
        loop {
            let outcome = match timeout(per_attempt, self.transport.send(request)).await {
                Ok(result) => result,
                Err(_) => Err(ServiceBusError::Timeout(per_attempt)),
            };

            match outcome {
                Ok(response) => {
                    if attempt > 0 {
                        tracing::debug!(attempt = attempt + 1, "request succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && attempt + 1 < self.policy.max_attempts => {
                    let delay = self.policy.jittered_delay(attempt);
                    if self.enable_logging {
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_attempts = self.policy.max_attempts,
                            delay_ms = saturating_millis(delay),
                            method = %request.method,
                            path = request.url.path(),
                            error = %e,
                            "request failed, retrying"
                        );
                    }
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_retryable() => {
                    return Err(ServiceBusError::Transport {
                        attempts: attempt + 1,
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl std::fmt::Debug for ResilientExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientExecutor")
            .field("policy", &self.policy)
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}
