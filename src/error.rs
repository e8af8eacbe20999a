//! Error types for kafka-tail
//!
//! This module defines the error taxonomy used throughout the consumer,
//! using `thiserror` for ergonomic error handling. Configuration problems
//! are aggregated so the operator sees all of them in one run; everything
//! else maps to a single boundary (filter, decode, envelope, consumer).

use thiserror::Error;

/// Aggregated configuration errors detected before any connection attempt.
///
/// Every missing flag and every filter compile failure is collected here
/// rather than reported one at a time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", render_bullets(.problems))]
pub struct ConfigError {
    /// One human-readable message per problem, in detection order.
    pub problems: Vec<String>,
}

impl ConfigError {
    /// Create an aggregated error from a list of problems.
    pub fn new(problems: Vec<String>) -> Self {
        Self { problems }
    }

    /// Number of collected problems.
    pub fn len(&self) -> usize {
        self.problems.len()
    }

    /// Returns true if no problem was collected.
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

fn render_bullets(problems: &[String]) -> String {
    problems
        .iter()
        .map(|p| format!("  - {}", p))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Filter pattern compilation failure.
#[derive(Error, Debug)]
pub enum FilterError {
    /// A comma-separated segment is not a valid regular expression.
    #[error("failed to compile regex filter {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern, exactly as supplied.
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Raw-mode payload decoding failure. Always per-message and recoverable.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The message carried no payload at all.
    #[error("message has no payload")]
    EmptyPayload,

    /// The payload bytes are not a JSON document.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// CloudEvents envelope decoding failure.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// Neither structured nor binary content mode could be detected.
    #[error("message is not a CloudEvent (no cloudevents content-type and no ce_specversion header)")]
    NotACloudEvent,

    /// A required context attribute is missing or empty.
    #[error("missing required CloudEvents attribute: {0}")]
    MissingAttribute(&'static str),

    /// The `specversion` attribute names an unsupported version.
    #[error("unsupported CloudEvents specversion: {0}")]
    UnsupportedSpecVersion(String),

    /// The `time` attribute is not an RFC 3339 timestamp.
    #[error("invalid CloudEvents time attribute {value:?}: {source}")]
    InvalidTime {
        /// The raw attribute value.
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A header value is not valid UTF-8.
    #[error("header {0} is not valid UTF-8")]
    InvalidHeader(String),

    /// The envelope or its JSON data could not be parsed.
    #[error("malformed CloudEvents JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the consumer at startup or while running.
///
/// Every variant the sources return is fatal to the run.
#[derive(Error, Debug)]
pub enum ConsumerError {
    /// The Kafka client could not be created.
    #[error("failed to create kafka consumer: {0}")]
    Connect(String),

    /// Subscribing to the topic failed.
    #[error("failed to subscribe to kafka topic {topic:?}: {message}")]
    Subscribe {
        /// Topic that was requested.
        topic: String,
        /// Client error text.
        message: String,
    },

    /// A non-timeout poll error from the transport.
    #[error("failed to poll kafka queue: {0}")]
    Transport(String),

    /// Failed to marshal an already-decoded record for display.
    ///
    /// Only logged by the printer, which then skips the record.
    #[error("failed to marshal message: {0}")]
    Serialization(serde_json::Error),

    /// Writing to the output stream failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Result type alias for kafka-tail operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_renders_bulleted_list() {
        let error = ConfigError::new(vec![
            "flag --topic was not set".to_string(),
            "flag --ssl-key-file was not set".to_string(),
        ]);
        assert_eq!(
            error.to_string(),
            "  - flag --topic was not set\n  - flag --ssl-key-file was not set"
        );
        assert_eq!(error.len(), 2);
        assert!(!error.is_empty());
    }

    #[test]
    fn test_filter_error_names_pattern() {
        let source = regex::Regex::new("(").unwrap_err();
        let error = FilterError::InvalidPattern {
            pattern: "(".to_string(),
            source,
        };
        assert!(error.to_string().contains("\"(\""));
    }

    #[test]
    fn test_decode_error_display() {
        assert_eq!(DecodeError::EmptyPayload.to_string(), "message has no payload");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let error: DecodeError = json_error.into();
        assert!(matches!(error, DecodeError::InvalidJson(_)));
    }

    #[test]
    fn test_subscribe_error_display() {
        let error = ConsumerError::Subscribe {
            topic: "orders".to_string(),
            message: "unknown topic".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "failed to subscribe to kafka topic \"orders\": unknown topic"
        );
    }

    #[test]
    fn test_transport_error_display() {
        let error = ConsumerError::Transport("all brokers down".to_string());
        assert_eq!(error.to_string(), "failed to poll kafka queue: all brokers down");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConsumerError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<EnvelopeError>();
    }
}
