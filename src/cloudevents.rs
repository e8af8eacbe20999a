//! CloudEvents envelope and Kafka protocol binding.
//!
//! This module decodes Kafka records into CloudEvents 1.0 envelopes. Both
//! content modes of the Kafka binding are supported:
//!
//! - **Structured**: the `content-type` header starts with
//!   `application/cloudevents` and the record value is a JSON envelope.
//! - **Binary**: attributes travel in `ce_`-prefixed headers, the
//!   `content-type` header (or `ce_datacontenttype` when it is absent) is
//!   the `datacontenttype` and the record value is the event data.
//!
//! # Example
//!
//! ```rust
//! use kafka_tail::cloudevents::CloudEvent;
//! use kafka_tail::message::TransportMessage;
//!
//! let message = TransportMessage::new("orders", br#"{"total": 12}"#.to_vec())
//!     .with_header("ce_specversion", Some(b"1.0".to_vec()))
//!     .with_header("ce_id", Some(b"42".to_vec()))
//!     .with_header("ce_source", Some(b"/checkout".to_vec()))
//!     .with_header("ce_type", Some(b"order.created".to_vec()))
//!     .with_header("content-type", Some(b"application/json".to_vec()));
//!
//! let event = CloudEvent::from_message(&message).unwrap();
//! assert_eq!(event.event_type, "order.created");
//! assert_eq!(event.data.unwrap()["total"], 12);
//! ```

use crate::error::EnvelopeError;
use crate::message::TransportMessage;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tracing::debug;

/// Prefix of attribute headers in binary content mode.
pub const HEADER_PREFIX: &str = "ce_";

/// Content type prefix of structured content mode.
pub const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents";

/// Extension carrying the record key in binary content mode.
pub const PARTITION_KEY_EXTENSION: &str = "partitionkey";

/// CloudEvents 1.0 envelope.
///
/// Serializes to the CloudEvents JSON format: context attributes,
/// extensions at top level, then `data` or `data_base64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudEvent {
    /// CloudEvents specification version.
    #[serde(default)]
    pub specversion: String,

    /// Event identifier, unique per source.
    #[serde(default)]
    pub id: String,

    /// Event source URI reference.
    #[serde(default)]
    pub source: String,

    /// Event type (e.g., "order.created").
    #[serde(rename = "type", default)]
    pub event_type: String,

    /// Media type of `data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,

    /// Schema that `data` adheres to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataschema: Option<String>,

    /// Subject of the event in the context of the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Time the occurrence happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,

    /// Extension attributes.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, JsonValue>,

    /// Event payload, for JSON or textual data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,

    /// Event payload, base64 encoded, for binary data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
}

impl CloudEvent {
    /// Decodes a Kafka record using the CloudEvents Kafka protocol binding.
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeError::NotACloudEvent` when neither content mode
    /// applies, and other `EnvelopeError` variants for malformed envelopes.
    pub fn from_message(message: &TransportMessage) -> Result<Self, EnvelopeError> {
        let content_type = message
            .header("content-type")
            .map(|v| header_text("content-type", v))
            .transpose()?;

        let event = match content_type.as_deref() {
            Some(ct) if ct.starts_with(STRUCTURED_CONTENT_TYPE) => Self::from_structured(message)?,
            _ if message.header("ce_specversion").is_some() => {
                Self::from_binary(message, content_type)?
            }
            _ => return Err(EnvelopeError::NotACloudEvent),
        };

        event.validate()?;
        Ok(event)
    }

    fn from_structured(message: &TransportMessage) -> Result<Self, EnvelopeError> {
        let payload = message.payload.as_deref().unwrap_or_default();
        Ok(serde_json::from_slice(payload)?)
    }

    fn from_binary(
        message: &TransportMessage,
        content_type: Option<String>,
    ) -> Result<Self, EnvelopeError> {
        let mut event = Self {
            specversion: String::new(),
            id: String::new(),
            source: String::new(),
            event_type: String::new(),
            datacontenttype: content_type,
            dataschema: None,
            subject: None,
            time: None,
            extensions: BTreeMap::new(),
            data: None,
            data_base64: None,
        };

        for header in &message.headers {
            let Some(name) = strip_prefix_ignore_case(&header.key, HEADER_PREFIX) else {
                continue;
            };
            let Some(raw) = header.value.as_deref() else {
                continue;
            };
            let value = header_text(&header.key, raw)?;

            match name.to_ascii_lowercase().as_str() {
                "specversion" => event.specversion = value,
                "id" => event.id = value,
                "source" => event.source = value,
                "type" => event.event_type = value,
                "dataschema" => event.dataschema = Some(value),
                "subject" => event.subject = Some(value),
                "time" => event.time = Some(parse_time(&value)?),
                "datacontenttype" => {
                    event.datacontenttype.get_or_insert(value);
                }
                "data" | "data_base64" => {
                    debug!(header = %header.key, "Ignoring data header in binary mode");
                }
                other => {
                    event
                        .extensions
                        .insert(other.to_string(), JsonValue::String(value));
                }
            }
        }

        if message.key.is_some() {
            event
                .extensions
                .entry(PARTITION_KEY_EXTENSION.to_string())
                .or_insert_with(|| JsonValue::String(message.key_str()));
        }

        if let Some(payload) = message.payload.as_deref().filter(|p| !p.is_empty()) {
            event.set_data(payload)?;
        }

        Ok(event)
    }

    /// Stores binary-mode data according to `datacontenttype`.
    fn set_data(&mut self, payload: &[u8]) -> Result<(), EnvelopeError> {
        let content_type = self.datacontenttype.as_deref().unwrap_or("application/json");

        if is_json_content_type(content_type) {
            self.data = Some(serde_json::from_slice(payload)?);
        } else if content_type.starts_with("text/") {
            match std::str::from_utf8(payload) {
                Ok(text) => self.data = Some(JsonValue::String(text.to_string())),
                Err(_) => self.data_base64 = Some(BASE64.encode(payload)),
            }
        } else {
            self.data_base64 = Some(BASE64.encode(payload));
        }

        Ok(())
    }

    /// Checks required attributes and the specification version.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.specversion.is_empty() {
            return Err(EnvelopeError::MissingAttribute("specversion"));
        }
        if !is_supported_spec_version(&self.specversion) {
            return Err(EnvelopeError::UnsupportedSpecVersion(
                self.specversion.clone(),
            ));
        }
        if self.id.is_empty() {
            return Err(EnvelopeError::MissingAttribute("id"));
        }
        if self.source.is_empty() {
            return Err(EnvelopeError::MissingAttribute("source"));
        }
        if self.event_type.is_empty() {
            return Err(EnvelopeError::MissingAttribute("type"));
        }
        Ok(())
    }
}

fn is_supported_spec_version(version: &str) -> bool {
    version == "1" || version.starts_with("1.")
}

fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence == "text/json" || essence.ends_with("+json")
}

fn strip_prefix_ignore_case<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    if key.len() > prefix.len()
        && key.is_char_boundary(prefix.len())
        && key[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&key[prefix.len()..])
    } else {
        None
    }
}

fn header_text(name: &str, value: &[u8]) -> Result<String, EnvelopeError> {
    std::str::from_utf8(value)
        .map(str::to_string)
        .map_err(|_| EnvelopeError::InvalidHeader(name.to_string()))
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, EnvelopeError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| EnvelopeError::InvalidTime {
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn binary_message(event_type: &str, payload: &[u8]) -> TransportMessage {
        TransportMessage::new("orders", payload.to_vec())
            .with_header("ce_specversion", Some(b"1.0".to_vec()))
            .with_header("ce_id", Some(b"evt-1".to_vec()))
            .with_header("ce_source", Some(b"/checkout".to_vec()))
            .with_header("ce_type", Some(event_type.as_bytes().to_vec()))
    }

    #[test]
    fn test_structured_mode() {
        let payload = br#"{
            "specversion": "1.0",
            "id": "01JTEST1234567890123456",
            "source": "/checkout",
            "type": "order.created",
            "subject": "order-7",
            "time": "2025-01-15T10:30:00Z",
            "tenant": "acme",
            "datacontenttype": "application/json",
            "data": {"total": 12}
        }"#;
        let message = TransportMessage::new("orders", payload.to_vec()).with_header(
            "content-type",
            Some(b"application/cloudevents+json; charset=UTF-8".to_vec()),
        );

        let event = CloudEvent::from_message(&message).unwrap();

        assert_eq!(event.id, "01JTEST1234567890123456");
        assert_eq!(event.event_type, "order.created");
        assert_eq!(event.subject.as_deref(), Some("order-7"));
        assert!(event.time.is_some());
        assert_eq!(event.extensions.get("tenant"), Some(&json!("acme")));
        assert_eq!(event.data, Some(json!({"total": 12})));
    }

    #[test]
    fn test_binary_mode_json_data() {
        let message = binary_message("order.created", br#"[1, 2]"#)
            .with_header("content-type", Some(b"application/json".to_vec()))
            .with_header("ce_time", Some(b"2025-01-15T10:30:00+02:00".to_vec()))
            .with_header("ce_traceparent", Some(b"00-abc-01".to_vec()));

        let event = CloudEvent::from_message(&message).unwrap();

        assert_eq!(event.specversion, "1.0");
        assert_eq!(event.source, "/checkout");
        assert_eq!(event.datacontenttype.as_deref(), Some("application/json"));
        assert_eq!(event.data, Some(json!([1, 2])));
        assert_eq!(
            event.extensions.get("traceparent"),
            Some(&json!("00-abc-01"))
        );
        assert_eq!(
            event.time.unwrap().to_rfc3339(),
            "2025-01-15T08:30:00+00:00"
        );
    }

    #[test]
    fn test_binary_mode_text_and_bytes() {
        let text = binary_message("log.line", b"hello")
            .with_header("content-type", Some(b"text/plain".to_vec()));
        let event = CloudEvent::from_message(&text).unwrap();
        assert_eq!(event.data, Some(json!("hello")));

        let bytes = binary_message("blob", &[0xde, 0xad, 0xbe, 0xef])
            .with_header("content-type", Some(b"application/octet-stream".to_vec()));
        let event = CloudEvent::from_message(&bytes).unwrap();
        assert!(event.data.is_none());
        assert_eq!(event.data_base64.as_deref(), Some("3q2+7w=="));
    }

    #[test]
    fn test_binary_mode_datacontenttype_header() {
        let message = binary_message("log.line", b"hello")
            .with_header("ce_datacontenttype", Some(b"text/plain".to_vec()));
        let event = CloudEvent::from_message(&message).unwrap();

        assert_eq!(event.datacontenttype.as_deref(), Some("text/plain"));
        assert_eq!(event.data, Some(json!("hello")));
        assert!(event.extensions.is_empty());
    }

    #[test]
    fn test_binary_mode_members_are_serialized_once() {
        let message = binary_message("order.created", br#"{"total": 12}"#)
            .with_header("ce_datacontenttype", Some(b"text/plain".to_vec()))
            .with_header("ce_data", Some(b"shadow".to_vec()))
            .with_header("ce_data_base64", Some(b"c2hhZG93".to_vec()))
            .with_header("content-type", Some(b"application/json".to_vec()));
        let event = CloudEvent::from_message(&message).unwrap();

        assert_eq!(event.datacontenttype.as_deref(), Some("application/json"));
        assert_eq!(event.data, Some(json!({"total": 12})));
        assert!(event.extensions.is_empty());

        let rendered = serde_json::to_string(&event).unwrap();
        for key in ["\"datacontenttype\"", "\"data\""] {
            assert_eq!(rendered.matches(key).count(), 1, "{} in {}", key, rendered);
        }
        assert!(!rendered.contains("data_base64"));
        assert!(!rendered.contains("shadow"));
    }

    #[test]
    fn test_binary_mode_key_becomes_partitionkey() {
        let message = binary_message("order.created", b"{}").with_key(b"tenant-a".to_vec());
        let event = CloudEvent::from_message(&message).unwrap();
        assert_eq!(
            event.extensions.get(PARTITION_KEY_EXTENSION),
            Some(&json!("tenant-a"))
        );
    }

    #[test]
    fn test_plain_record_is_not_a_cloud_event() {
        let message = TransportMessage::new("orders", br#"[1]"#.to_vec());
        let result = CloudEvent::from_message(&message);
        assert!(matches!(result, Err(EnvelopeError::NotACloudEvent)));
    }

    #[test]
    fn test_missing_type_is_rejected() {
        let message = TransportMessage::new("orders", b"{}".to_vec())
            .with_header("ce_specversion", Some(b"1.0".to_vec()))
            .with_header("ce_id", Some(b"1".to_vec()))
            .with_header("ce_source", Some(b"/s".to_vec()));
        let result = CloudEvent::from_message(&message);
        assert!(matches!(result, Err(EnvelopeError::MissingAttribute("type"))));
    }

    #[test]
    fn test_unsupported_spec_version() {
        let payload = br#"{"specversion":"0.3","id":"1","source":"/s","type":"t"}"#;
        let message = TransportMessage::new("orders", payload.to_vec())
            .with_header("content-type", Some(b"application/cloudevents+json".to_vec()));
        let result = CloudEvent::from_message(&message);
        assert!(matches!(result, Err(EnvelopeError::UnsupportedSpecVersion(_))));
    }

    #[test]
    fn test_invalid_time_is_rejected() {
        let message =
            binary_message("t", b"{}").with_header("ce_time", Some(b"yesterday".to_vec()));
        let result = CloudEvent::from_message(&message);
        assert!(matches!(result, Err(EnvelopeError::InvalidTime { .. })));
    }

    #[test]
    fn test_malformed_structured_payload() {
        let message = TransportMessage::new("orders", b"not-json".to_vec())
            .with_header("content-type", Some(b"application/cloudevents+json".to_vec()));
        let result = CloudEvent::from_message(&message);
        assert!(matches!(result, Err(EnvelopeError::Json(_))));
    }

    #[test]
    fn test_serialization_uses_cloudevents_json_format() {
        let message = binary_message("order.created", br#"{"total": 12}"#)
            .with_header("ce_tenant", Some(b"acme".to_vec()));
        let event = CloudEvent::from_message(&message).unwrap();

        let rendered: JsonValue = serde_json::to_value(&event).unwrap();
        assert_eq!(rendered["type"], "order.created");
        assert_eq!(rendered["tenant"], "acme");
        assert_eq!(rendered["data"]["total"], 12);
        assert!(rendered.get("subject").is_none());
        assert!(rendered.get("data_base64").is_none());
    }

    #[test]
    fn test_is_json_content_type() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("application/vnd.order+json"));
        assert!(!is_json_content_type("text/plain"));
    }
}
