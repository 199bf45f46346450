#![warn(missing_docs)]

//! # servicebus-http: Service Bus over REST
//!
//! An async client for the Service Bus REST API (version `2016-07`), talking
//! plain HTTPS with shared-access-signature authentication.
//!
//! ## Overview
//!
//! A client is bound to one entity, either a queue or a topic with one of its
//! subscriptions, and offers the message lifecycle:
//!
//! 1. **Send** - Enqueue a message with custom properties
//! 2. **Peek-lock** - Lock the head message, leaving it in the entity
//! 3. **Unlock / Renew** - Release or extend the lock
//! 4. **Delete** - Complete a locked message
//! 5. **Destructive read** - Remove and return the head message at once
//!
//! ## Key Features
//!
//! - **SAS Authentication**: A fresh HMAC-SHA256 token on every request
//! - **Long Polling**: Receives wait server-side for up to the requested time
//! - **Resilient Transport**: Per-attempt deadlines and exponential backoff with jitter
//! - **Property Round Trip**: Allow-list or capture-all recovery of custom properties
//! - **Typed Errors**: Unexpected statuses carry the operation and the status code
//!
//! ## Client Usage
//!
//! ```no_run
//! use servicebus_http::{Message, ServiceBusClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ServiceBusClient::queue(
//!         "Endpoint=sb://contoso.servicebus.windows.net/;SharedAccessKeyName=app;SharedAccessKey=secret",
//!         "orders",
//!     )?;
//!
//!     client.send(&Message::new("{\"id\":42}").with_property("Priority", "high")).await?;
//!
//!     while let Some(mut message) = client.peek_lock(30).await? {
//!         client.renew_lock(&mut message).await?;
//!         println!("{}: {:?}", message.message_id(), message.body_str());
//!         client.delete(&message).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - **[auth]** - Credentials and SAS token generation
//! - **[client]** - The client, request execution and response decoding
//! - **[error]** - Error types and result handling
//! - **[protocol]** - Protocol constants and header helpers
//! - **[types]** - Messages, broker properties and raw HTTP exchanges

pub mod auth;
pub mod client;
pub mod error;
pub mod protocol;
pub mod types;

pub use auth::Credentials;
pub use client::{ClientConfig, EntityPath, MessageClient, PropertyStrategy, ServiceBusClient};
pub use error::{Result, ServiceBusError};
pub use types::{BrokerProperties, Message};
