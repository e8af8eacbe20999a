//! Message types shared by the transport and the decoders.
//!
//! [`TransportMessage`] is an owned copy of a Kafka record, detached from the
//! client so it can outlive the poll call. [`DecodedMessage`] is the raw-mode
//! rendering of a record whose payload is JSON.
//!
//! # Example
//!
//! ```rust
//! use kafka_tail::message::{DecodedMessage, TransportMessage};
//!
//! let message = TransportMessage::new("orders", br#"[1, 2, 3]"#.to_vec())
//!     .with_key(b"tenant-a".to_vec())
//!     .with_header("trace-id", Some(b"abc".to_vec()));
//!
//! let decoded = DecodedMessage::decode(&message).unwrap();
//! assert_eq!(decoded.key, "tenant-a");
//! assert_eq!(decoded.value, serde_json::json!([1, 2, 3]));
//! ```

use crate::error::DecodeError;
use rdkafka::message::Headers;
use rdkafka::Message;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// A single Kafka record header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportHeader {
    /// Header name.
    pub key: String,
    /// Header value bytes, `None` for a null header.
    pub value: Option<Vec<u8>>,
}

/// Owned Kafka record as returned by a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportMessage {
    /// Topic the record was read from.
    pub topic: String,
    /// Partition the record was read from.
    pub partition: i32,
    /// Offset within the partition.
    pub offset: i64,
    /// Broker or producer timestamp in milliseconds since epoch.
    pub timestamp: Option<i64>,
    /// Record key bytes.
    pub key: Option<Vec<u8>>,
    /// Record headers, in wire order.
    pub headers: Vec<TransportHeader>,
    /// Record value bytes.
    pub payload: Option<Vec<u8>>,
}

impl TransportMessage {
    /// Creates a record with a payload and no key, headers or timestamp.
    pub fn new(topic: &str, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.to_string(),
            partition: 0,
            offset: 0,
            timestamp: None,
            key: None,
            headers: Vec::new(),
            payload: Some(payload),
        }
    }

    /// Sets the record key.
    pub fn with_key(mut self, key: Vec<u8>) -> Self {
        self.key = Some(key);
        self
    }

    /// Appends a header.
    pub fn with_header(mut self, key: &str, value: Option<Vec<u8>>) -> Self {
        self.headers.push(TransportHeader {
            key: key.to_string(),
            value,
        });
        self
    }

    /// Sets partition and offset.
    pub fn with_position(mut self, partition: i32, offset: i64) -> Self {
        self.partition = partition;
        self.offset = offset;
        self
    }

    /// Copies an rdkafka message into an owned record.
    pub fn from_kafka<M: Message>(message: &M) -> Self {
        let headers = message
            .headers()
            .map(|headers| {
                headers
                    .iter()
                    .map(|header| TransportHeader {
                        key: header.key.to_string(),
                        value: header.value.map(<[u8]>::to_vec),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            timestamp: message.timestamp().to_millis(),
            key: message.key().map(<[u8]>::to_vec),
            headers,
            payload: message.payload().map(<[u8]>::to_vec),
        }
    }

    /// Key as text, empty when absent.
    pub fn key_str(&self) -> String {
        self.key
            .as_deref()
            .map(|k| String::from_utf8_lossy(k).into_owned())
            .unwrap_or_default()
    }

    /// Value of the first header named `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|h| h.key.eq_ignore_ascii_case(name))
            .and_then(|h| h.value.as_deref())
    }
}

/// Result of one bounded-wait poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A record arrived.
    Message(TransportMessage),
    /// Nothing arrived within the wait.
    Timeout,
    /// The transport failed; the text describes the failure.
    Error(String),
}

/// A header rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageHeader {
    /// Header name.
    pub key: String,
    /// Header value as UTF-8 text.
    pub value: Option<String>,
}

/// Raw-mode view of a record with a JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedMessage {
    /// Topic the record was read from.
    pub topic: String,
    /// Partition the record was read from.
    pub partition: i32,
    /// Offset within the partition.
    pub offset: i64,
    /// Record timestamp in milliseconds since epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Record key, empty when absent.
    pub key: String,
    /// Record headers in wire order.
    pub headers: Vec<MessageHeader>,
    /// Parsed payload. Usually a JSON array, any JSON value is accepted.
    pub value: JsonValue,
}

impl DecodedMessage {
    /// Parses the record payload as JSON and pairs it with key and headers.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::EmptyPayload` for records without a value and
    /// `DecodeError::InvalidJson` when the value is not JSON.
    pub fn decode(message: &TransportMessage) -> Result<Self, DecodeError> {
        let payload = message.payload.as_deref().ok_or(DecodeError::EmptyPayload)?;
        let value: JsonValue = serde_json::from_slice(payload)?;

        let headers = message
            .headers
            .iter()
            .map(|h| MessageHeader {
                key: h.key.clone(),
                value: h
                    .value
                    .as_deref()
                    .map(|v| String::from_utf8_lossy(v).into_owned()),
            })
            .collect();

        Ok(Self {
            topic: message.topic.clone(),
            partition: message.partition,
            offset: message.offset,
            timestamp: message.timestamp,
            key: message.key_str(),
            headers,
            value,
        })
    }
}
