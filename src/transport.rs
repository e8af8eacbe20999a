//! Kafka transport for kafka-tail.
//!
//! The [`Transport`] trait is the seam between the consumer logic and the
//! Kafka client: one bounded-wait poll that yields a [`PollOutcome`].
//! [`KafkaTransport`] implements it over an rdkafka `StreamConsumer`
//! subscribed to a single topic.

use crate::config::ConnectionConfig;
use crate::error::ConsumerError;
use crate::message::{PollOutcome, TransportMessage};
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use std::time::Duration;
use tracing::{debug, info};

/// Bounded wait of a single poll.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Source of Kafka records, polled one at a time.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Wait up to `timeout` for the next record.
    async fn poll(&mut self, timeout: Duration) -> PollOutcome;
}

/// Transport backed by an rdkafka consumer.
pub struct KafkaTransport {
    consumer: StreamConsumer,
}

impl KafkaTransport {
    /// Creates the consumer and subscribes it to the configured topic.
    ///
    /// # Errors
    ///
    /// Returns `ConsumerError::Connect` if the client cannot be created and
    /// `ConsumerError::Subscribe` if the subscription is rejected.
    pub fn connect(config: &ConnectionConfig) -> Result<Self, ConsumerError> {
        debug!(
            server = %config.server(),
            client_id = %config.client_id,
            offset_reset = config.offset_reset.as_str(),
            "Creating kafka consumer"
        );

        let consumer: StreamConsumer = config
            .client_config()
            .create()
            .map_err(|e| ConsumerError::Connect(e.to_string()))?;

        consumer
            .subscribe(&[config.topic.as_str()])
            .map_err(|e| ConsumerError::Subscribe {
                topic: config.topic.clone(),
                message: e.to_string(),
            })?;

        info!(topic = %config.topic, "Subscribed to kafka topic");

        Ok(Self { consumer })
    }
}

#[async_trait::async_trait]
impl Transport for KafkaTransport {
    async fn poll(&mut self, timeout: Duration) -> PollOutcome {
        match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_) => PollOutcome::Timeout,
            Ok(Ok(message)) => PollOutcome::Message(TransportMessage::from_kafka(&message)),
            Ok(Err(e)) if is_timeout(&e) => PollOutcome::Timeout,
            Ok(Err(e)) => PollOutcome::Error(e.to_string()),
        }
    }
}

/// Returns true for client errors that only mean "nothing arrived in time".
pub fn is_timeout(error: &KafkaError) -> bool {
    matches!(
        error.rdkafka_error_code(),
        Some(RDKafkaErrorCode::OperationTimedOut) | Some(RDKafkaErrorCode::RequestTimedOut)
    )
}
