//! Versioned URL composition and signed request construction.
//!
//! # Examples
//!
//! ```
//! use servicebus_http::client::RequestBuilder;
//! use servicebus_http::auth::Credentials;
//! use std::sync::Arc;
//!
//! let creds: Credentials = "Endpoint=sb://test.servicebus.windows.net/;\
//!     SharedAccessKeyName=k;SharedAccessKey=s"
//!     .parse()
//!     .unwrap();
//! let builder = RequestBuilder::new(Arc::new(creds));
//!
//! let url = builder.build_url("/orders/messages/head?timeout=5").unwrap();
//! assert_eq!(
//!     url.as_str(),
//!     "https://test.servicebus.windows.net/orders/messages/head?timeout=5&api-version=2016-07"
//! );
//! ```

use crate::auth::{sign, Credentials};
use crate::error::{Result, ServiceBusError};
use crate::protocol::constants::{headers, API_VERSION, API_VERSION_PARAM};
use crate::types::OutboundRequest;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Builds signed requests against one namespace.
///
/// Performs no I/O. A fresh token is generated for every request.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    credentials: Arc<Credentials>,
}

impl RequestBuilder {
    /// Create a builder for the namespace in `credentials`.
    pub fn new(credentials: Arc<Credentials>) -> Self {
        Self { credentials }
    }

    /// The credentials requests are signed with.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Append `path` to the namespace endpoint and add the API version.
    ///
    /// Query parameters already present in `path` are kept.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceBusError::InvalidUrl`] if the result is not a valid
    /// absolute URL.
    pub fn build_url(&self, path: &str) -> Result<Url> {
        let base = self.credentials.endpoint().as_str().trim_end_matches('/');
        let separator = if path.starts_with('/') { "" } else { "/" };
        let target = format!("{base}{separator}{path}");

        let mut url = Url::parse(&target)
            .map_err(|e| ServiceBusError::InvalidUrl(format!("'{target}': {e}")))?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(ServiceBusError::InvalidUrl(format!("'{target}' is not an absolute URL")));
        }
        url.query_pairs_mut().append_pair(API_VERSION_PARAM, API_VERSION);
        Ok(url)
    }

    /// Build a request carrying `Accept: application/json` and a fresh
    /// `Authorization` token.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceBusError::Signature`] if the token cannot be
    /// generated.
    pub fn build_request(&self, url: Url, method: Method, body: impl Into<Bytes>) -> Result<OutboundRequest> {
        let token = sign(&self.credentials, self.credentials.endpoint().as_str())?;

        let mut header_map = HeaderMap::new();
        header_map.insert(headers::ACCEPT, HeaderValue::from_static("application/json"));
        let mut authorization = HeaderValue::from_str(&token.to_string())
            .map_err(|e| ServiceBusError::Signature(e.to_string()))?;
        authorization.set_sensitive(true);
        header_map.insert(headers::AUTHORIZATION, authorization);

        Ok(OutboundRequest {
            method,
            url,
            headers: header_map,
            body: body.into(),
        })
    }
}

impl OutboundRequest {
    /// Attach one header per custom property.
    ///
    /// Keys are used verbatim as header names. `Authorization` and `Accept`
    /// are owned by the request and cannot be set this way.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceBusError::InvalidHeader`] if a key is not a legal
    /// header name, names `Authorization` or `Accept` in any case, or a value
    /// is not a legal header value.
    pub fn with_properties(mut self, properties: &HashMap<String, String>) -> Result<Self> {
        for (key, value) in properties {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| ServiceBusError::InvalidHeader(format!("'{key}' is not a valid header name")))?;
            if name == headers::AUTHORIZATION || name == headers::ACCEPT {
                return Err(ServiceBusError::InvalidHeader(format!(
                    "'{key}' is set by the client and cannot be a custom property"
                )));
            }
            let value = HeaderValue::from_str(value)
                .map_err(|_| ServiceBusError::InvalidHeader(format!("value of '{key}' is not a valid header value")))?;
            self.headers.insert(name, value);
        }
        Ok(self)
    }
}
