//! Error types for the Service Bus client.
//!
//! Every fallible operation in this crate returns [`Result<T>`], whose error
//! type is [`ServiceBusError`].
//!
//! # Error Categories
//!
//! | Variant | Raised by | Retried by the executor |
//! |---------|-----------|-------------------------|
//! | [`Config`](ServiceBusError::Config) | connection string / credentials | no |
//! | [`InvalidUrl`](ServiceBusError::InvalidUrl) | request builder, lock location | no |
//! | [`InvalidHeader`](ServiceBusError::InvalidHeader) | custom property headers | no |
//! | [`Signature`](ServiceBusError::Signature) | SAS token generation | no |
//! | [`Connection`](ServiceBusError::Connection) | a single transport attempt | yes |
//! | [`Timeout`](ServiceBusError::Timeout) | a single transport attempt | yes |
//! | [`Transport`](ServiceBusError::Transport) | executor, after the retry budget | no |
//! | [`Protocol`](ServiceBusError::Protocol) | lifecycle operations (bad status) | no |
//! | [`Decode`](ServiceBusError::Decode) | response decoder | no |
//! | [`MissingLock`](ServiceBusError::MissingLock) | unlock / renew / delete | no |

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ServiceBusError>;

/// The lifecycle verb that produced a [`ServiceBusError::Protocol`] error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Enqueue a message.
    Send,
    /// Non-destructive receive that locks the head message.
    PeekLock,
    /// Release a peek-lock without consuming the message.
    Unlock,
    /// Extend a peek-lock.
    RenewLock,
    /// Receive that removes the head message immediately.
    DestructiveRead,
    /// Complete a peek-locked message.
    Delete,
}

impl Operation {
    /// Stable lower-case name, used in log fields and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Send => "send",
            Operation::PeekLock => "peek-lock",
            Operation::Unlock => "unlock",
            Operation::RenewLock => "renew-lock",
            Operation::DestructiveRead => "destructive-read",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by the Service Bus client.
#[must_use = "errors should be handled or propagated"]
#[derive(Debug, Error)]
pub enum ServiceBusError {
    /// The connection string or credentials are malformed.
    #[error("invalid Service Bus configuration: {0}")]
    Config(String),

    /// A request URL could not be composed or parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A custom property cannot be carried as an HTTP header.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The shared access signature could not be generated.
    #[error("signature generation failed: {0}")]
    Signature(String),

    /// One transport attempt failed before a response was received.
    #[error("connection error: {0}")]
    Connection(String),

    /// One transport attempt exceeded its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Transient failures exhausted the retry budget.
    #[error("transport failed after {attempts} attempt(s): {message}")]
    Transport {
        /// Number of attempts made.
        attempts: u32,
        /// Description of the last failure.
        message: String,
    },

    /// The broker answered with a status code the operation does not accept.
    #[error("could not {operation} message: server returned status {status}")]
    Protocol {
        /// The operation that was attempted.
        operation: Operation,
        /// The observed HTTP status code.
        status: u16,
    },

    /// The broker properties of a received message are missing or invalid.
    #[error("failed to decode message: {0}")]
    Decode(String),

    /// A lock operation was attempted on a message that holds no lock.
    #[error("message has no lock location; it was not received with peek-lock")]
    MissingLock,
}

impl ServiceBusError {
    /// Whether a single failed attempt may succeed if repeated.
    ///
    /// Only connection failures and per-attempt timeouts are transient. A
    /// completed HTTP exchange is never retried, whatever its status.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceBusError::Connection(_) | ServiceBusError::Timeout(_))
    }

    /// HTTP status carried by a protocol error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceBusError::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the broker rejected the credentials (401 or 403).
    pub fn is_access_denied(&self) -> bool {
        self.status()
            .is_some_and(crate::client::is_access_denied_status)
    }
}

impl From<url::ParseError> for ServiceBusError {
    fn from(err: url::ParseError) -> Self {
        ServiceBusError::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceBusError {
    fn from(err: serde_json::Error) -> Self {
        ServiceBusError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for ServiceBusError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ServiceBusError::InvalidUrl(err.to_string())
        } else {
            ServiceBusError::Connection(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_variants() {
        assert!(ServiceBusError::Connection("reset".into()).is_retryable());
        assert!(ServiceBusError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!ServiceBusError::Decode("bad".into()).is_retryable());
        assert!(!ServiceBusError::Protocol {
            operation: Operation::Send,
            status: 503,
        }
        .is_retryable());
    }

    #[test]
    fn test_protocol_error_message() {
        let err = ServiceBusError::Protocol {
            operation: Operation::Delete,
            status: 404,
        };
        assert_eq!(err.to_string(), "could not delete message: server returned status 404");
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_access_denied());
    }

    #[test]
    fn test_access_denied() {
        let err = ServiceBusError::Protocol {
            operation: Operation::PeekLock,
            status: 401,
        };
        assert!(err.is_access_denied());
    }
}
