//! The Service Bus client and its six message lifecycle operations.
//!
//! # Lock Lifecycle
//!
//! ```text
//!                 peek_lock                       delete
//! Available ───────────────────▶ Locked ─────────────────────▶ (gone)
//!     ▲                            │  ▲
//!     │          unlock            │  │ renew_lock
//!     └────────────────────────────┘  └──┘
//!
//! Available ──── destructive_read ───▶ (gone)
//! ```
//!
//! | Operation | Method | Target | Success |
//! |-----------|--------|--------|---------|
//! | [`send`](ServiceBusClient::send) | POST | `/{entity}/messages/` | 200, 201 |
//! | [`peek_lock`](ServiceBusClient::peek_lock) | POST | `.../messages/head?timeout=T` | 200, 201; 204 = no message |
//! | [`unlock`](ServiceBusClient::unlock) | PUT | message location | 200 |
//! | [`renew_lock`](ServiceBusClient::renew_lock) | POST | message location | 200 |
//! | [`destructive_read`](ServiceBusClient::destructive_read) | DELETE | `.../messages/head?timeout=T` | 200, 201; 204 = no message |
//! | [`delete`](ServiceBusClient::delete) | DELETE | message location | 200 |
//!
//! Any other status is returned as [`ServiceBusError::Protocol`]. Status
//! codes are never retried; only transport failures are.
//!
//! # Examples
//!
//! ```no_run
//! use servicebus_http::{Message, ServiceBusClient};
//!
//! # tokio_test::block_on(async {
//! let client = ServiceBusClient::queue(
//!     "Endpoint=sb://contoso.servicebus.windows.net/;SharedAccessKeyName=app;SharedAccessKey=secret",
//!     "orders",
//! )?;
//!
//! client.send(&Message::new("hello").with_property("Order-Id", "42")).await?;
//!
//! if let Some(message) = client.peek_lock(30).await? {
//!     println!("received {:?}", message.body_str());
//!     client.delete(&message).await?;
//! }
//! # Ok::<(), servicebus_http::ServiceBusError>(())
//! # }).unwrap();
//! ```

use crate::auth::Credentials;
use crate::client::decode::decode_broker_properties;
use crate::client::utils::is_accepted_status;
use crate::client::{
    ClientConfig, EntityPath, HttpTransport, ReqwestTransport, RequestBuilder, ResilientExecutor,
    ResponseDecoder, RetryPolicy,
};
use crate::error::{Operation, Result, ServiceBusError};
use crate::protocol::constants::headers::BROKER_PROPERTIES;
use crate::protocol::constants::status;
use crate::types::{Message, RawResponse};
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use std::sync::Arc;
use url::Url;

/// The six message lifecycle verbs.
///
/// Implemented by [`ServiceBusClient`]. Code that only needs to exchange
/// messages can depend on this trait and substitute a test double.
#[async_trait]
pub trait MessageClient: Send + Sync {
    /// Enqueue `message`.
    async fn send(&self, message: &Message) -> Result<()>;
    /// Lock and return the head message, waiting up to `wait_secs`.
    async fn peek_lock(&self, wait_secs: u32) -> Result<Option<Message>>;
    /// Release the lock on `message`.
    async fn unlock(&self, message: &Message) -> Result<()>;
    /// Extend the lock on `message`.
    async fn renew_lock(&self, message: &mut Message) -> Result<()>;
    /// Remove and return the head message, waiting up to `wait_secs`.
    async fn destructive_read(&self, wait_secs: u32) -> Result<Option<Message>>;
    /// Complete a peek-locked `message`.
    async fn delete(&self, message: &Message) -> Result<()>;
}

/// Client for one queue or topic/subscription.
///
/// Cheap to clone; clones share credentials and the connection pool and may be
/// used concurrently.
#[derive(Debug, Clone)]
pub struct ServiceBusClient {
    entity: EntityPath,
    requests: RequestBuilder,
    executor: ResilientExecutor,
    decoder: ResponseDecoder,
    config: Arc<ClientConfig>,
}

impl ServiceBusClient {
    /// Client for a queue, with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceBusError::Config`] if the connection string is
    /// malformed.
    pub fn queue(connection_string: &str, queue: impl Into<String>) -> Result<Self> {
        let credentials = Credentials::from_connection_string(connection_string)?;
        Self::with_config(credentials, EntityPath::queue(queue), ClientConfig::default())
    }

    /// Client that sends to `topic` and receives from `subscription`, with
    /// default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceBusError::Config`] if the connection string is
    /// malformed.
    pub fn subscription(
        connection_string: &str,
        topic: impl Into<String>,
        subscription: impl Into<String>,
    ) -> Result<Self> {
        let credentials = Credentials::from_connection_string(connection_string)?;
        Self::with_config(
            credentials,
            EntityPath::subscription(topic, subscription),
            ClientConfig::default(),
        )
    }

    /// Client with explicit credentials and configuration, over HTTPS.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceBusError::Config`] if the HTTP client cannot be built
    /// from `config`.
    pub fn with_config(credentials: Credentials, entity: EntityPath, config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(credentials, entity, config, Arc::new(transport)))
    }

    /// Client over a caller-supplied transport.
    pub fn with_transport(
        credentials: Credentials,
        entity: EntityPath,
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let executor = ResilientExecutor::new(transport, RetryPolicy::from(&config), config.request_timeout())
            .with_logging(config.enable_logging);
        ServiceBusClient {
            entity,
            requests: RequestBuilder::new(Arc::new(credentials)),
            executor,
            decoder: ResponseDecoder::new(config.property_strategy.clone()),
            config: Arc::new(config),
        }
    }

    /// The addressed entity.
    pub fn entity(&self) -> &EntityPath {
        &self.entity
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Enqueue `message`, carrying its custom properties as headers.
    ///
    /// # Errors
    ///
    /// - [`ServiceBusError::InvalidHeader`] for a property that is not a
    ///   legal header.
    /// - [`ServiceBusError::Protocol`] unless the broker answers 200 or 201.
    /// - [`ServiceBusError::Transport`] if transient failures exhaust the
    ///   retry budget.
    pub async fn send(&self, message: &Message) -> Result<()> {
        let url = self.requests.build_url(&self.entity.send_path())?;
        let request = self
            .requests
            .build_request(url, Method::POST, message.body.clone())?
            .with_properties(&message.custom_properties)?;

        let response = self.executor.execute(&request).await?;
        self.expect(Operation::Send, &response, is_accepted_status)?;
        Ok(())
    }

    /// Lock the head message and return it, waiting up to `wait_secs` on the
    /// server for one to arrive.
    ///
    /// Returns `Ok(None)` if none arrived in time.
    ///
    /// # Errors
    ///
    /// [`ServiceBusError::Protocol`] for any status but 200, 201 and 204;
    /// [`ServiceBusError::Decode`] if the message metadata is invalid.
    pub async fn peek_lock(&self, wait_secs: u32) -> Result<Option<Message>> {
        self.receive(Operation::PeekLock, Method::POST, wait_secs).await
    }

    /// Remove the head message and return it, waiting up to `wait_secs` on
    /// the server for one to arrive.
    ///
    /// The returned message holds no lock: its `location` is always `None`.
    ///
    /// # Errors
    ///
    /// As for [`peek_lock`](Self::peek_lock).
    pub async fn destructive_read(&self, wait_secs: u32) -> Result<Option<Message>> {
        let message = self
            .receive(Operation::DestructiveRead, Method::DELETE, wait_secs)
            .await?;
        Ok(message.map(|mut m| {
            m.location = None;
            m
        }))
    }

    /// Release the lock so the message can be received again.
    ///
    /// # Errors
    ///
    /// [`ServiceBusError::MissingLock`] if `message` was not peek-locked;
    /// [`ServiceBusError::Protocol`] unless the broker answers 200.
    pub async fn unlock(&self, message: &Message) -> Result<()> {
        self.lock_operation(Operation::Unlock, Method::PUT, message).await?;
        Ok(())
    }

    /// Extend the lock on `message`.
    ///
    /// When the broker reports the new expiry, `message.locked_until()` is
    /// updated to match.
    ///
    /// # Errors
    ///
    /// [`ServiceBusError::MissingLock`] if `message` was not peek-locked;
    /// [`ServiceBusError::Protocol`] unless the broker answers 200.
    pub async fn renew_lock(&self, message: &mut Message) -> Result<()> {
        let response = self
            .lock_operation(Operation::RenewLock, Method::POST, message)
            .await?;

        if response.headers.contains_key(BROKER_PROPERTIES) {
            match decode_broker_properties(&response.headers) {
                Ok(renewed) => message.broker_properties.locked_until_utc = renewed.locked_until_utc,
                Err(e) => tracing::warn!(error = %e, "lock renewed but new expiry could not be read"),
            }
        }
        Ok(())
    }

    /// Complete a peek-locked message, removing it from the entity.
    ///
    /// # Errors
    ///
    /// [`ServiceBusError::MissingLock`] if `message` was not peek-locked;
    /// [`ServiceBusError::Protocol`] unless the broker answers 200, including
    /// when the message was already deleted or its lock has expired.
    pub async fn delete(&self, message: &Message) -> Result<()> {
        self.lock_operation(Operation::Delete, Method::DELETE, message).await?;
        Ok(())
    }

    async fn receive(&self, operation: Operation, method: Method, wait_secs: u32) -> Result<Option<Message>> {
        let url = self.requests.build_url(&self.entity.receive_path(wait_secs))?;
        let request = self.requests.build_request(url, method, Bytes::new())?;

        let response = self
            .executor
            .execute_with_timeout(&request, self.config.receive_timeout(wait_secs))
            .await?;

        if response.status == status::NO_CONTENT {
            tracing::debug!(%operation, entity = %self.entity, "no message available");
            return Ok(None);
        }
        self.expect(operation, &response, is_accepted_status)?;
        self.decoder.decode(response).map(Some)
    }

    async fn lock_operation(&self, operation: Operation, method: Method, message: &Message) -> Result<RawResponse> {
        let url = lock_url(message)?;
        let request = self.requests.build_request(url, method, Bytes::new())?;

        let response = self.executor.execute(&request).await?;
        self.expect(operation, &response, |code| code == status::OK)?;
        Ok(response)
    }

    fn expect(&self, operation: Operation, response: &RawResponse, accepted: impl Fn(u16) -> bool) -> Result<()> {
        if accepted(response.status) {
            tracing::debug!(%operation, entity = %self.entity, status = response.status, "operation succeeded");
            return Ok(());
        }
        tracing::debug!(%operation, entity = %self.entity, status = response.status, "unexpected status");
        Err(ServiceBusError::Protocol {
            operation,
            status: response.status,
        })
    }
}

#[async_trait]
impl MessageClient for ServiceBusClient {
    async fn send(&self, message: &Message) -> Result<()> {
        ServiceBusClient::send(self, message).await
    }

    async fn peek_lock(&self, wait_secs: u32) -> Result<Option<Message>> {
        ServiceBusClient::peek_lock(self, wait_secs).await
    }

    async fn unlock(&self, message: &Message) -> Result<()> {
        ServiceBusClient::unlock(self, message).await
    }

    async fn renew_lock(&self, message: &mut Message) -> Result<()> {
        ServiceBusClient::renew_lock(self, message).await
    }

    async fn destructive_read(&self, wait_secs: u32) -> Result<Option<Message>> {
        ServiceBusClient::destructive_read(self, wait_secs).await
    }

    async fn delete(&self, message: &Message) -> Result<()> {
        ServiceBusClient::delete(self, message).await
    }
}

fn lock_url(message: &Message) -> Result<Url> {
    let location = message.location.as_deref().ok_or(ServiceBusError::MissingLock)?;
    let url = Url::parse(location)
        .map_err(|e| ServiceBusError::InvalidUrl(format!("lock location '{location}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ServiceBusError::InvalidUrl(format!(
            "lock location '{location}' is not an absolute URL"
        )));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONNECTION: &str = "Endpoint=sb://test.servicebus.windows.net/;SharedAccessKeyName=TestSharedAccessKey;SharedAccessKey=TestSharedAccessKey";

    #[test]
    fn test_queue_client_creation() {
        let client = ServiceBusClient::queue(CONNECTION, "test-queue").unwrap();
        assert_eq!(client.entity(), &EntityPath::queue("test-queue"));
        assert_eq!(client.config().max_retries, 4);
    }

    #[test]
    fn test_subscription_client_creation() {
        let client = ServiceBusClient::subscription(CONNECTION, "test-topic", "test-subscription").unwrap();
        assert_eq!(
            client.entity(),
            &EntityPath::subscription("test-topic", "test-subscription")
        );
    }

    #[test]
    fn test_invalid_connection_string() {
        let err = ServiceBusClient::queue("Endpoint=sb://x/", "q").unwrap_err();
        assert!(matches!(err, ServiceBusError::Config(_)));
    }

    #[test]
    fn test_lock_url_requires_location() {
        let err = lock_url(&Message::new("x")).unwrap_err();
        assert!(matches!(err, ServiceBusError::MissingLock));
    }

    #[test]
    fn test_lock_url_rejects_relative_location() {
        let message = Message {
            location: Some("/q/messages/1/token".to_string()),
            ..Default::default()
        };
        assert!(matches!(lock_url(&message), Err(ServiceBusError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_lock_operations_without_lock() {
        let client = ServiceBusClient::queue(CONNECTION, "q").unwrap();
        let mut message = Message::new("unlocked");

        assert!(matches!(client.unlock(&message).await, Err(ServiceBusError::MissingLock)));
        assert!(matches!(client.renew_lock(&mut message).await, Err(ServiceBusError::MissingLock)));
        assert!(matches!(client.delete(&message).await, Err(ServiceBusError::MissingLock)));
    }
}
