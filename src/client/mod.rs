//! Service Bus HTTP client implementation.
//!
//! This module provides a complete client for the Service Bus REST API,
//! enabling callers to:
//!
//! - **Send messages** with custom properties to a queue or topic
//! - **Peek-lock** messages and later unlock, renew or delete them
//! - **Destructively read** messages in a single round trip
//! - **Automatically retry** transport failures with exponential backoff
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── lifecycle - ServiceBusClient and the six lifecycle operations
//! ├── entity    - Queue and topic/subscription paths
//! ├── request   - Versioned URLs and signed requests
//! ├── executor  - Transport abstraction and retrying executor
//! ├── retry     - Backoff policy
//! ├── decode    - Response decoding and property strategies
//! ├── config    - Client configuration
//! └── utils     - Utility functions
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ServiceBusClient`] | Main client for one queue or subscription |
//! | [`MessageClient`] | The lifecycle operations as a trait |
//! | [`EntityPath`] | Queue or topic/subscription address |
//! | [`ResilientExecutor`] | Timeout and retry around an [`HttpTransport`] |
//! | [`PropertyStrategy`] | How custom properties are read back |
//! | [`ClientConfig`] | Client configuration options |
//!
//! # Examples
//!
//! ## Creating a Client
//!
//! ```
//! use servicebus_http::auth::Credentials;
//! use servicebus_http::client::{ClientConfig, EntityPath, PropertyStrategy, ServiceBusClient};
//!
//! let conn = "Endpoint=sb://contoso.servicebus.windows.net/;\
//!     SharedAccessKeyName=app;SharedAccessKey=secret";
//!
//! // Default configuration
//! let client = ServiceBusClient::queue(conn, "orders").unwrap();
//!
//! // Custom configuration
//! let config = ClientConfig {
//!     max_retries: 6,
//!     retry_delay_ms: 250,
//!     property_strategy: PropertyStrategy::AllowList(vec!["Order-Id".into()]),
//!     ..Default::default()
//! };
//! let credentials: Credentials = conn.parse().unwrap();
//! let client = ServiceBusClient::with_config(
//!     credentials,
//!     EntityPath::subscription("events", "audit"),
//!     config,
//! )
//! .unwrap();
//! ```
//!
//! ## Utility Functions
//!
//! ```
//! use servicebus_http::client::{exponential_backoff, is_access_denied_status};
//! use std::time::Duration;
//!
//! assert!(is_access_denied_status(401));
//! assert!(!is_access_denied_status(404));
//!
//! let delay = exponential_backoff(2, Duration::from_millis(100), 2.0);
//! assert_eq!(delay, Duration::from_millis(400));
//! ```

mod config;
mod decode;
mod entity;
mod executor;
mod lifecycle;
mod request;
mod retry;
mod utils;

pub use config::ClientConfig;
pub use decode::{decode_broker_properties, PropertyStrategy, ResponseDecoder};
pub use entity::EntityPath;
pub use executor::{HttpTransport, ReqwestTransport, ResilientExecutor};
pub use lifecycle::{MessageClient, ServiceBusClient};
pub use request::RequestBuilder;
pub use retry::RetryPolicy;
pub use utils::*;
