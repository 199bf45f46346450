//! Namespace credentials and connection-string parsing.
//!
//! A connection string is the form the portal hands out:
//!
//! ```text
//! Endpoint=sb://<namespace>.servicebus.windows.net/;SharedAccessKeyName=<name>;SharedAccessKey=<secret>
//! ```
//!
//! Parsing produces [`Credentials`] whose endpoint is always the HTTPS form of
//! the namespace host.
//!
//! # Examples
//!
//! ```
//! use servicebus_http::auth::Credentials;
//!
//! let creds: Credentials = "Endpoint=sb://contoso.servicebus.windows.net/;\
//!     SharedAccessKeyName=RootManageSharedAccessKey;SharedAccessKey=c2VjcmV0"
//!     .parse()
//!     .unwrap();
//!
//! assert_eq!(creds.namespace(), "contoso");
//! assert_eq!(creds.endpoint().as_str(), "https://contoso.servicebus.windows.net/");
//! assert_eq!(creds.key_name(), "RootManageSharedAccessKey");
//! ```

use crate::error::{Result, ServiceBusError};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::str::FromStr;
use url::Url;

const ENDPOINT_KEY: &str = "Endpoint";
const KEY_NAME_KEY: &str = "SharedAccessKeyName";
const KEY_KEY: &str = "SharedAccessKey";
const ENTITY_PATH_KEY: &str = "EntityPath";

/// Credentials for one broker namespace.
///
/// Immutable once built. The access key is held in a [`SecretString`] and is
/// redacted from `Debug` output.
pub struct Credentials {
    endpoint: Url,
    namespace: String,
    key_name: String,
    access_key: SecretString,
    entity_path: Option<String>,
}

impl Credentials {
    /// Build credentials from an explicit endpoint.
    ///
    /// The endpoint must be an absolute `https` URL with a host. Plain `http`
    /// is accepted as well, for local emulators and stub brokers.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceBusError::Config`] for any other scheme, a missing
    /// host, or an empty key name or key.
    pub fn new(
        endpoint: Url,
        key_name: impl Into<String>,
        access_key: impl Into<String>,
    ) -> Result<Self> {
        let key_name = key_name.into();
        let access_key = access_key.into();

        if !matches!(endpoint.scheme(), "https" | "http") {
            return Err(ServiceBusError::Config(format!(
                "endpoint scheme must be https, got '{}'",
                endpoint.scheme()
            )));
        }
        let namespace = namespace_from_url(&endpoint)?;
        if key_name.is_empty() {
            return Err(ServiceBusError::Config(format!("{KEY_NAME_KEY} is empty")));
        }
        if access_key.is_empty() {
            return Err(ServiceBusError::Config(format!("{KEY_KEY} is empty")));
        }

        Ok(Self {
            endpoint,
            namespace,
            key_name,
            access_key: SecretString::from(access_key),
            entity_path: None,
        })
    }

    /// Parse a connection string.
    ///
    /// Pairs are separated by `;` and split on the first `=`. Keys match
    /// case-insensitively, empty segments are ignored and unknown keys are
    /// skipped. `Endpoint`, `SharedAccessKeyName` and `SharedAccessKey` are
    /// required; `EntityPath` is optional.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceBusError::Config`] if a required field is missing or
    /// the endpoint is not an absolute URL with a host.
    pub fn from_connection_string(connection_string: &str) -> Result<Self> {
        let mut endpoint = None;
        let mut key_name = None;
        let mut key = None;
        let mut entity_path = None;

        for segment in connection_string.split(';').map(str::trim) {
            if segment.is_empty() {
                continue;
            }
            let Some((name, value)) = segment.split_once('=') else {
                return Err(ServiceBusError::Config(
                    "connection string segment is not a key=value pair".to_string(),
                ));
            };
            let name = name.trim();
            if name.eq_ignore_ascii_case(ENDPOINT_KEY) {
                endpoint = Some(value);
            } else if name.eq_ignore_ascii_case(KEY_NAME_KEY) {
                key_name = Some(value);
            } else if name.eq_ignore_ascii_case(KEY_KEY) {
                key = Some(value);
            } else if name.eq_ignore_ascii_case(ENTITY_PATH_KEY) {
                entity_path = Some(value);
            }
        }

        let endpoint = endpoint.ok_or_else(|| missing(ENDPOINT_KEY))?;
        let key_name = key_name.ok_or_else(|| missing(KEY_NAME_KEY))?;
        let key = key.ok_or_else(|| missing(KEY_KEY))?;

        let source = Url::parse(endpoint).map_err(|e| {
            ServiceBusError::Config(format!("{ENDPOINT_KEY} '{endpoint}' is not a valid URL: {e}"))
        })?;
        let host = source.host_str().filter(|h| !h.is_empty()).ok_or_else(|| {
            ServiceBusError::Config(format!("{ENDPOINT_KEY} '{endpoint}' has no host"))
        })?;
        let https = Url::parse(&format!("https://{host}/"))
            .map_err(|e| ServiceBusError::Config(e.to_string()))?;

        let mut credentials = Self::new(https, key_name, key)?;
        credentials.entity_path = entity_path
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        Ok(credentials)
    }

    /// Namespace endpoint, e.g. `https://contoso.servicebus.windows.net/`.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// First DNS label of the endpoint host.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name of the shared access policy.
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// `EntityPath` from the connection string, if one was present.
    pub fn entity_path(&self) -> Option<&str> {
        self.entity_path.as_deref()
    }

    pub(crate) fn access_key(&self) -> &[u8] {
        self.access_key.expose_secret().as_bytes()
    }
}

impl FromStr for Credentials {
    type Err = ServiceBusError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_connection_string(s)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint", &self.endpoint.as_str())
            .field("namespace", &self.namespace)
            .field("key_name", &self.key_name)
            .field("access_key", &"[REDACTED]")
            .field("entity_path", &self.entity_path)
            .finish()
    }
}

fn missing(field: &str) -> ServiceBusError {
    ServiceBusError::Config(format!("connection string is missing {field}"))
}

fn namespace_from_url(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ServiceBusError::Config(format!("endpoint '{url}' has no host")))?;
    Ok(host.split('.').next().unwrap_or(host).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "Endpoint=sb://test.servicebus.windows.net/;SharedAccessKeyName=TestSharedAccessKey;SharedAccessKey=TestSharedAccessKey";

    #[test]
    fn test_parse_valid_connection_string() {
        let creds = Credentials::from_connection_string(VALID).unwrap();
        assert_eq!(creds.namespace(), "test");
        assert_eq!(creds.key_name(), "TestSharedAccessKey");
        assert_eq!(creds.access_key(), b"TestSharedAccessKey");
        assert_eq!(creds.endpoint().scheme(), "https");
        assert_eq!(creds.endpoint().host_str(), Some("test.servicebus.windows.net"));
        assert!(creds.entity_path().is_none());
    }

    #[test]
    fn test_namespace_is_first_host_label() {
        for ns in ["a", "orders-prod", "x1"] {
            let cs = format!(
                "Endpoint=sb://{ns}.servicebus.chinacloudapi.cn/;SharedAccessKeyName=k;SharedAccessKey=s"
            );
            let creds: Credentials = cs.parse().unwrap();
            assert_eq!(creds.namespace(), ns);
            assert_eq!(
                creds.endpoint().host_str(),
                Some(format!("{ns}.servicebus.chinacloudapi.cn").as_str())
            );
        }
    }

    #[test]
    fn test_parse_missing_endpoint() {
        let err = Credentials::from_connection_string(
            "SharedAccessKeyName=TestSharedAccessKey;SharedAccessKey=TestSharedAccessKey",
        )
        .unwrap_err();
        assert!(matches!(err, ServiceBusError::Config(_)));
    }

    #[test]
    fn test_parse_missing_key_name() {
        let err = Credentials::from_connection_string(
            "Endpoint=sb://test.servicebus.windows.net/;SharedAccessKey=TestSharedAccessKey",
        )
        .unwrap_err();
        assert!(matches!(err, ServiceBusError::Config(_)));
    }

    #[test]
    fn test_parse_missing_key() {
        let err = Credentials::from_connection_string(
            "Endpoint=sb://test.servicebus.windows.net/;SharedAccessKeyName=TestSharedAccessKey",
        )
        .unwrap_err();
        assert!(matches!(err, ServiceBusError::Config(_)));
    }

    #[test]
    fn test_parse_invalid_endpoint() {
        let err = Credentials::from_connection_string(
            "Endpoint=no-valid-uri;SharedAccessKeyName=TestSharedAccessKey;SharedAccessKey=TestSharedAccessKey",
        )
        .unwrap_err();
        assert!(matches!(err, ServiceBusError::Config(_)));
    }

    #[test]
    fn test_parse_empty_string() {
        assert!(Credentials::from_connection_string("").is_err());
    }

    #[test]
    fn test_parse_key_with_padding() {
        let creds = Credentials::from_connection_string(
            "Endpoint=sb://test.servicebus.windows.net/;SharedAccessKeyName=k;SharedAccessKey=abc==;",
        )
        .unwrap();
        assert_eq!(creds.access_key(), b"abc==");
    }

    #[test]
    fn test_parse_order_and_case_insensitive() {
        let creds = Credentials::from_connection_string(
            "sharedaccesskey=s;ENDPOINT=sb://ns.servicebus.windows.net/;SharedAccessKeyName=k;EntityPath=orders",
        )
        .unwrap();
        assert_eq!(creds.namespace(), "ns");
        assert_eq!(creds.entity_path(), Some("orders"));
    }

    #[test]
    fn test_new_rejects_other_schemes() {
        let url = Url::parse("ftp://ns.example.com/").unwrap();
        assert!(Credentials::new(url, "k", "s").is_err());
    }

    #[test]
    fn test_new_accepts_local_http() {
        let url = Url::parse("http://127.0.0.1:8080").unwrap();
        let creds = Credentials::new(url, "k", "s").unwrap();
        assert_eq!(creds.namespace(), "127");
    }

    #[test]
    fn test_debug_redacts_key() {
        let creds = Credentials::from_connection_string(VALID).unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("SharedAccessKey=TestSharedAccessKey"));
        assert_eq!(debug.matches("TestSharedAccessKey").count(), 1);
    }
}
