//! Queue and topic/subscription addressing.

use crate::protocol::constants::TIMEOUT_PARAM;
use std::fmt;

/// The entity a client sends to and receives from.
///
/// Both variants support the same operations and differ only in their paths:
///
/// | Variant | Send | Receive |
/// |---------|------|---------|
/// | `Queue` | `/{queue}/messages/` | `/{queue}/messages/head` |
/// | `Subscription` | `/{topic}/messages/` | `/{topic}/subscriptions/{subscription}/messages/head` |
///
/// # Examples
///
/// ```
/// use servicebus_http::client::EntityPath;
///
/// let queue = EntityPath::queue("orders");
/// assert_eq!(queue.send_path(), "/orders/messages/");
/// assert_eq!(queue.receive_path(30), "/orders/messages/head?timeout=30");
///
/// let sub = EntityPath::subscription("events", "audit");
/// assert_eq!(sub.send_path(), "/events/messages/");
/// assert_eq!(
///     sub.receive_path(5),
///     "/events/subscriptions/audit/messages/head?timeout=5"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityPath {
    /// A queue.
    Queue {
        /// Queue name.
        name: String,
    },
    /// A topic, sent to directly and received from through a subscription.
    Subscription {
        /// Topic name.
        topic: String,
        /// Subscription name.
        subscription: String,
    },
}

impl EntityPath {
    /// Address a queue.
    pub fn queue(name: impl Into<String>) -> Self {
        EntityPath::Queue { name: name.into() }
    }

    /// Address a topic and one of its subscriptions.
    pub fn subscription(topic: impl Into<String>, subscription: impl Into<String>) -> Self {
        EntityPath::Subscription {
            topic: topic.into(),
            subscription: subscription.into(),
        }
    }

    /// Path messages are posted to.
    pub fn send_path(&self) -> String {
        match self {
            EntityPath::Queue { name } => format!("/{name}/messages/"),
            EntityPath::Subscription { topic, .. } => format!("/{topic}/messages/"),
        }
    }

    /// Path of the head message, with the server-side long-poll wait.
    pub fn receive_path(&self, wait_secs: u32) -> String {
        let head = match self {
            EntityPath::Queue { name } => format!("/{name}/messages/head"),
            EntityPath::Subscription {
                topic,
                subscription,
            } => format!("/{topic}/subscriptions/{subscription}/messages/head"),
        };
        format!("{head}?{TIMEOUT_PARAM}={wait_secs}")
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityPath::Queue { name } => f.write_str(name),
            EntityPath::Subscription {
                topic,
                subscription,
            } => write!(f, "{topic}/subscriptions/{subscription}"),
        }
    }
}
