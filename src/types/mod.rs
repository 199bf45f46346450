//! Core data types: messages, outbound requests and raw responses.

mod message;

pub use message::{BrokerProperties, Message};

use bytes::Bytes;
use http::{HeaderMap, Method};
use url::Url;

/// A fully built, signed request, ready for the executor.
///
/// Cheap to clone: the body is reference-counted, so retries resend the same
/// bytes without copying.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute target URL.
    pub url: Url,
    /// Request headers, including `Authorization`.
    pub headers: HeaderMap,
    /// Request body; empty for everything but send.
    pub body: Bytes,
}

/// A completed HTTP exchange with the body fully read.
///
/// Any status code is a valid `RawResponse`; interpreting it is up to the
/// lifecycle operation that issued the request.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl RawResponse {
    /// Value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("location", HeaderValue::from_static("https://ns/q/messages/1/t"));
        headers.insert("x-binary", HeaderValue::from_bytes(b"\xff").unwrap());
        let response = RawResponse {
            status: 201,
            headers,
            body: Bytes::new(),
        };

        assert_eq!(response.header("Location"), Some("https://ns/q/messages/1/t"));
        assert_eq!(response.header("x-binary"), None);
        assert_eq!(response.header("missing"), None);
    }
}
