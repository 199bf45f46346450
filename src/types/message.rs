//! Broker message and its server-assigned metadata.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Server-assigned metadata, carried as JSON in the `BrokerProperties`
/// response header.
///
/// Fields the broker omits or sends as `null` take their zero value.
/// Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BrokerProperties {
    /// Broker or sender assigned id.
    #[serde(deserialize_with = "nullable")]
    pub message_id: String,
    /// Number of times the message was handed out.
    #[serde(deserialize_with = "nullable")]
    pub delivery_count: u32,
    /// Sequence number assigned at enqueue time.
    #[serde(deserialize_with = "nullable")]
    pub enqueued_sequence_number: i64,
    /// When the broker accepted the message.
    #[serde(with = "rfc1123")]
    pub enqueued_time_utc: DateTime<Utc>,
    /// Token of the current peek-lock.
    #[serde(deserialize_with = "nullable")]
    pub lock_token: String,
    /// When the current peek-lock lapses.
    #[serde(with = "rfc1123")]
    pub locked_until_utc: DateTime<Utc>,
    /// Partition the message was routed to.
    #[serde(deserialize_with = "nullable")]
    pub partition_key: String,
    /// Unique, increasing number within the entity.
    #[serde(deserialize_with = "nullable")]
    pub sequence_number: i64,
    /// `Active`, `Deferred` or `Scheduled`.
    #[serde(deserialize_with = "nullable")]
    pub state: String,
    /// Time to live, in seconds.
    #[serde(deserialize_with = "nullable")]
    pub time_to_live: f64,
    /// Application label.
    #[serde(deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub label: String,
    /// Correlation id set by the sender.
    #[serde(deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub correlation_id: String,
    /// Session the message belongs to.
    #[serde(deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    /// Reply address set by the sender.
    #[serde(deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub reply_to: String,
    /// Destination address set by the sender.
    #[serde(deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub to: String,
    /// Content type set by the sender.
    #[serde(deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub content_type: String,
}

/// One message in transit.
///
/// Built by the caller for [`send`](crate::MessageClient::send), or by the
/// response decoder for receives. `location` is set only for messages
/// obtained with peek-lock; it addresses the locked instance for unlock,
/// renew and delete.
///
/// # Examples
///
/// ```
/// use servicebus_http::Message;
///
/// let message = Message::new("hello")
///     .with_property("Order-Id", "42")
///     .with_property("tenant", "acme");
///
/// assert_eq!(message.body_str(), Some("hello"));
/// assert_eq!(message.custom_properties.len(), 2);
/// assert!(!message.is_locked());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    /// Broker metadata; zero-valued on messages built for sending.
    pub broker_properties: BrokerProperties,
    /// Lock-resource URL, exactly as the broker returned it.
    pub location: Option<String>,
    /// Caller-defined properties.
    pub custom_properties: HashMap<String, String>,
    /// Application payload.
    pub body: Bytes,
}

impl Message {
    /// A message carrying `body` and no properties.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Message {
            body: body.into(),
            ..Default::default()
        }
    }

    /// Add a custom property, sent as a request header.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_properties.insert(key.into(), value.into());
        self
    }

    /// Whether the message holds a peek-lock.
    pub fn is_locked(&self) -> bool {
        self.location.is_some()
    }

    /// Broker-assigned message id.
    pub fn message_id(&self) -> &str {
        &self.broker_properties.message_id
    }

    /// Broker-assigned sequence number.
    pub fn sequence_number(&self) -> i64 {
        self.broker_properties.sequence_number
    }

    /// Lock token of a peek-locked message; empty otherwise.
    pub fn lock_token(&self) -> &str {
        &self.broker_properties.lock_token
    }

    /// When the current lock lapses.
    pub fn locked_until(&self) -> DateTime<Utc> {
        self.broker_properties.locked_until_utc
    }

    /// The payload as UTF-8, if it is valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// RFC 1123 timestamps such as `Wed, 09 Oct 2024 12:00:00 GMT`.
///
/// `null`, absent and empty values read as the zero timestamp.
mod rfc1123 {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        let trimmed = raw.as_deref().map(str::trim).unwrap_or_default();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(DateTime::default());
        }
        DateTime::parse_from_rfc2822(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| de::Error::custom(format!("invalid timestamp '{trimmed}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_minimal_broker_properties() {
        let props: BrokerProperties =
            serde_json::from_str(r#"{"MessageId":"abc","SequenceNumber":1}"#).unwrap();
        assert_eq!(props.message_id, "abc");
        assert_eq!(props.sequence_number, 1);
        assert_eq!(props.enqueued_time_utc, DateTime::<Utc>::default());
        assert_eq!(props.delivery_count, 0);
    }

    #[test]
    fn test_full_broker_properties() {
        let json = r#"{
            "DeliveryCount": 2,
            "EnqueuedSequenceNumber": 17,
            "EnqueuedTimeUtc": "Wed, 09 Oct 2024 12:00:00 GMT",
            "LockToken": "7b5a4b2c-0000-4000-8000-000000000001",
            "LockedUntilUtc": "Wed, 09 Oct 2024 12:01:00 GMT",
            "MessageId": "m-1",
            "PartitionKey": "p",
            "SequenceNumber": 17,
            "State": "Active",
            "TimeToLive": 922337203685.47754,
            "Label": "orders"
        }"#;
        let props: BrokerProperties = serde_json::from_str(json).unwrap();
        assert_eq!(props.delivery_count, 2);
        assert_eq!(
            props.enqueued_time_utc,
            Utc.with_ymd_and_hms(2024, 10, 9, 12, 0, 0).unwrap()
        );
        assert_eq!(
            props.locked_until_utc,
            Utc.with_ymd_and_hms(2024, 10, 9, 12, 1, 0).unwrap()
        );
        assert_eq!(props.state, "Active");
        assert_eq!(props.label, "orders");
    }

    #[test]
    fn test_null_fields_take_zero_value() {
        let props: BrokerProperties = serde_json::from_str(
            r#"{"MessageId":null,"EnqueuedTimeUtc":null,"LockedUntilUtc":"","DeliveryCount":null}"#,
        )
        .unwrap();
        assert_eq!(props, BrokerProperties::default());
    }

    #[test]
    fn test_malformed_timestamp_is_an_error() {
        let result =
            serde_json::from_str::<BrokerProperties>(r#"{"EnqueuedTimeUtc":"yesterday"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let props: BrokerProperties =
            serde_json::from_str(r#"{"MessageId":"x","ScheduledEnqueueTimeUtc":"later"}"#).unwrap();
        assert_eq!(props.message_id, "x");
    }

    #[test]
    fn test_timestamp_serializes_as_rfc1123() {
        let props = BrokerProperties {
            locked_until_utc: Utc.with_ymd_and_hms(2024, 10, 9, 12, 1, 0).unwrap(),
            ..Default::default()
        };
        let json = serde_json::to_value(&props).unwrap();
        assert_eq!(json["LockedUntilUtc"], "Wed, 09 Oct 2024 12:01:00 GMT");
    }

    #[test]
    fn test_message_builder() {
        let message = Message::new(b"\xff\xfe".to_vec()).with_property("k", "v");
        assert_eq!(message.body_str(), None);
        assert_eq!(message.custom_properties["k"], "v");
        assert_eq!(message.message_id(), "");
    }
}
