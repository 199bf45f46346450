//! Decoding raw broker responses into [`Message`]s.
//!
//! A received message arrives as:
//!
//! | Part | Carries |
//! |------|---------|
//! | body | the payload, verbatim |
//! | `BrokerProperties` header | JSON metadata ([`BrokerProperties`]) |
//! | `Location` header | lock-resource URL (peek-lock only) |
//! | remaining headers | custom properties, names mangled by the broker |
//!
//! How custom properties are recovered is a [`PropertyStrategy`] chosen when
//! the client is built.

use crate::error::{Result, ServiceBusError};
use crate::protocol::constants::headers::{BROKER_PROPERTIES, LOCATION};
use crate::protocol::{is_reserved_header, normalize_property_name, trim_property_value};
use crate::types::{BrokerProperties, Message, RawResponse};
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How custom properties are recovered from response headers.
///
/// | Strategy | Keys in the result | Headers considered |
/// |----------|--------------------|--------------------|
/// | `AllowList` | the caller's names, unchanged | only the listed names |
/// | `CaptureAll` | lower-cased header names | everything not reserved |
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStrategy {
    /// Look up each listed property under its broker-mangled header name
    /// (lower-cased, non-alphanumerics stripped). Empty values are dropped.
    AllowList(Vec<String>),
    /// Keep every header outside the reserved set.
    #[default]
    CaptureAll,
}

impl PropertyStrategy {
    /// Recover custom properties from `headers`.
    pub fn extract(&self, headers: &HeaderMap) -> HashMap<String, String> {
        match self {
            PropertyStrategy::AllowList(names) => names
                .iter()
                .filter_map(|name| {
                    let mangled = normalize_property_name(name);
                    if mangled.is_empty() {
                        return None;
                    }
                    let value = headers.get(mangled.as_str())?.to_str().ok()?;
                    let value = trim_property_value(value);
                    (!value.is_empty()).then(|| (name.clone(), value.to_string()))
                })
                .collect(),
            PropertyStrategy::CaptureAll => headers
                .iter()
                .filter(|(name, _)| !is_reserved_header(name.as_str()))
                .filter_map(|(name, value)| {
                    let value = trim_property_value(value.to_str().ok()?);
                    Some((name.as_str().to_lowercase(), value.to_string()))
                })
                .collect(),
        }
    }
}

/// Parse the `BrokerProperties` header of `headers`.
///
/// # Errors
///
/// Returns [`ServiceBusError::Decode`] if the header is missing, not UTF-8 or
/// not valid JSON.
pub fn decode_broker_properties(headers: &HeaderMap) -> Result<BrokerProperties> {
    let raw = headers
        .get(BROKER_PROPERTIES)
        .ok_or_else(|| ServiceBusError::Decode("BrokerProperties header is missing".to_string()))?
        .to_str()
        .map_err(|e| ServiceBusError::Decode(format!("BrokerProperties header is not text: {e}")))?;
    Ok(serde_json::from_str(raw)?)
}

/// Turns raw responses into messages.
#[derive(Debug, Clone, Default)]
pub struct ResponseDecoder {
    strategy: PropertyStrategy,
}

impl ResponseDecoder {
    /// Create a decoder that recovers properties with `strategy`.
    pub fn new(strategy: PropertyStrategy) -> Self {
        Self { strategy }
    }

    /// The active property strategy.
    pub fn strategy(&self) -> &PropertyStrategy {
        &self.strategy
    }

    /// Decode a received message.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceBusError::Decode`] if the broker properties are
    /// missing or invalid.
    pub fn decode(&self, response: RawResponse) -> Result<Message> {
        let broker_properties = decode_broker_properties(&response.headers)?;
        let location = response.header(LOCATION.as_str()).map(str::to_string);
        let custom_properties = self.strategy.extract(&response.headers);

        Ok(Message {
            broker_properties,
            location,
            custom_properties,
            body: response.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::HeaderValue;

    fn response(pairs: &[(&'static str, &'static str)], body: &'static str) -> RawResponse {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        RawResponse {
            status: 201,
            headers,
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_decode_minimal_message() {
        let decoded = ResponseDecoder::default()
            .decode(response(
                &[("brokerproperties", r#"{"MessageId":"abc","SequenceNumber":1}"#)],
                "payload",
            ))
            .unwrap();

        assert_eq!(decoded.message_id(), "abc");
        assert_eq!(decoded.sequence_number(), 1);
        assert_eq!(decoded.body, Bytes::from_static(b"payload"));
        assert!(decoded.location.is_none());
    }

    #[test]
    fn test_decode_copies_location() {
        let location = "https://test.servicebus.windows.net/q/messages/31/7b5a4b2c-aaaa";
        let decoded = ResponseDecoder::default()
            .decode(response(
                &[
                    ("brokerproperties", r#"{"MessageId":"abc","LockToken":"7b5a4b2c-aaaa"}"#),
                    ("location", location),
                ],
                "",
            ))
            .unwrap();

        assert_eq!(decoded.location.as_deref(), Some(location));
        assert_eq!(decoded.lock_token(), "7b5a4b2c-aaaa");
        assert!(decoded.is_locked());
    }

    #[test]
    fn test_missing_broker_properties() {
        let err = ResponseDecoder::default()
            .decode(response(&[], "payload"))
            .unwrap_err();
        assert!(matches!(err, ServiceBusError::Decode(_)));
    }

    #[test]
    fn test_invalid_broker_properties() {
        let err = ResponseDecoder::default()
            .decode(response(&[("brokerproperties", "{not json")], ""))
            .unwrap_err();
        assert!(matches!(err, ServiceBusError::Decode(_)));
    }

    #[test]
    fn test_allow_list_round_trip() {
        let decoder = ResponseDecoder::new(PropertyStrategy::AllowList(vec![
            "Order-Id".to_string(),
            "tenant_name".to_string(),
            "absent".to_string(),
        ]));
        let decoded = decoder
            .decode(response(
                &[
                    ("brokerproperties", "{}"),
                    ("orderid", "\"42\""),
                    ("tenantname", "\t\"acme\" "),
                    ("other", "ignored"),
                ],
                "",
            ))
            .unwrap();

        assert_eq!(
            decoded.custom_properties,
            HashMap::from([
                ("Order-Id".to_string(), "42".to_string()),
                ("tenant_name".to_string(), "acme".to_string()),
            ])
        );
    }

    #[test]
    fn test_allow_list_drops_empty_values() {
        let strategy = PropertyStrategy::AllowList(vec!["Empty".to_string()]);
        let mut headers = HeaderMap::new();
        headers.insert("empty", HeaderValue::from_static("\"\""));
        assert!(strategy.extract(&headers).is_empty());
    }

    #[test]
    fn test_capture_all_skips_reserved_headers() {
        let decoded = ResponseDecoder::new(PropertyStrategy::CaptureAll)
            .decode(response(
                &[
                    ("brokerproperties", "{}"),
                    ("content-type", "application/atom+xml"),
                    ("location", "https://x/y"),
                    ("server", "Microsoft-HTTPAPI/2.0"),
                    ("date", "Wed, 09 Oct 2024 12:00:00 GMT"),
                    ("strict-transport-security", "max-age=31536000"),
                    ("transfer-encoding", "chunked"),
                    ("priority", "\"high\""),
                    ("x-trace", "t-1"),
                ],
                "",
            ))
            .unwrap();

        assert_eq!(
            decoded.custom_properties,
            HashMap::from([
                ("priority".to_string(), "high".to_string()),
                ("x-trace".to_string(), "t-1".to_string()),
            ])
        );
    }

    #[test]
    fn test_decode_broker_properties_alone() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "brokerproperties",
            HeaderValue::from_static(r#"{"LockedUntilUtc":"Wed, 09 Oct 2024 12:01:00 GMT"}"#),
        );
        let props = decode_broker_properties(&headers).unwrap();
        assert_eq!(props.locked_until_utc.to_rfc3339(), "2024-10-09T12:01:00+00:00");
    }
}
