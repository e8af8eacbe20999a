//! Message sources for the two consumer modes.
//!
//! Both sources implement [`MessageSource`]: they drive a [`Transport`] and
//! hand decoded records to an [`EventHandler`] until the transport fails.
//!
//! - [`RawMessageSource`] is pull based. [`RawMessageSource::next`] performs
//!   exactly one poll and reports what happened; `run` loops over it.
//! - [`CloudEventReceiver`] is push based. It owns the poll loop and the
//!   envelope decoding, and invokes the handler for every valid event.
//!
//! Handlers are invoked inline by the single task that polls, so at most
//! one callback is in flight and output is never interleaved.

use crate::cloudevents::CloudEvent;
use crate::error::{ConsumerError, DecodeError};
use crate::message::{DecodedMessage, PollOutcome, TransportMessage};
use crate::transport::{Transport, POLL_TIMEOUT};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, warn};

/// A decoded record that can be filtered and printed.
pub trait Record: Serialize + Send {
    /// Attribute matched against the filter patterns.
    fn filter_candidate(&self) -> &str;
}

impl Record for DecodedMessage {
    fn filter_candidate(&self) -> &str {
        &self.key
    }
}

impl Record for CloudEvent {
    fn filter_candidate(&self) -> &str {
        &self.event_type
    }
}

/// Callback invoked for every decoded record.
///
/// Returning `Err` stops the source; per-record problems should be handled
/// inside the callback.
pub trait EventHandler<R>: Send {
    /// Process one record.
    fn handle(&mut self, record: R) -> Result<(), ConsumerError>;
}

impl<R, F> EventHandler<R> for F
where
    F: FnMut(R) -> Result<(), ConsumerError> + Send,
{
    fn handle(&mut self, record: R) -> Result<(), ConsumerError> {
        self(record)
    }
}

/// Something that delivers decoded records until the transport fails.
#[async_trait::async_trait]
pub trait MessageSource: Send {
    /// Record type produced by this source.
    type Item: Record;

    /// Deliver records to `handler`.
    ///
    /// Only returns on a fatal transport or handler error.
    async fn run<H>(&mut self, handler: &mut H) -> Result<(), ConsumerError>
    where
        H: EventHandler<Self::Item>;
}

/// Outcome of one raw-mode poll.
#[derive(Debug)]
pub enum RawPoll {
    /// A record with a JSON payload arrived.
    Message(DecodedMessage),
    /// A record arrived but its payload could not be decoded.
    Rejected {
        /// Position of the rejected record.
        position: String,
        /// Why decoding failed.
        error: DecodeError,
    },
    /// Nothing arrived within the poll timeout.
    Idle,
}

/// Pull-based source of raw JSON records.
pub struct RawMessageSource<T> {
    transport: T,
    timeout: Duration,
}

impl<T: Transport> RawMessageSource<T> {
    /// Creates a source polling with [`POLL_TIMEOUT`].
    pub fn new(transport: T) -> Self {
        Self::with_timeout(transport, POLL_TIMEOUT)
    }

    /// Creates a source with a custom poll timeout.
    pub fn with_timeout(transport: T, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Polls once and decodes the result.
    ///
    /// # Errors
    ///
    /// Returns `ConsumerError::Transport` when the poll fails.
    pub async fn next(&mut self) -> Result<RawPoll, ConsumerError> {
        match self.transport.poll(self.timeout).await {
            PollOutcome::Timeout => Ok(RawPoll::Idle),
            PollOutcome::Error(e) => Err(ConsumerError::Transport(e)),
            PollOutcome::Message(message) => Ok(match DecodedMessage::decode(&message) {
                Ok(decoded) => RawPoll::Message(decoded),
                Err(error) => RawPoll::Rejected {
                    position: position(&message),
                    error,
                },
            }),
        }
    }
}

#[async_trait::async_trait]
impl<T: Transport> MessageSource for RawMessageSource<T> {
    type Item = DecodedMessage;

    async fn run<H>(&mut self, handler: &mut H) -> Result<(), ConsumerError>
    where
        H: EventHandler<Self::Item>,
    {
        loop {
            match self.next().await? {
                RawPoll::Idle => continue,
                RawPoll::Rejected { position, error } => {
                    error!(%position, "failed to decode kafka message: {}", error);
                }
                RawPoll::Message(decoded) => handler.handle(decoded)?,
            }
        }
    }
}

/// Push-based receiver of CloudEvents.
///
/// Malformed envelopes are logged and skipped; the handler only ever sees
/// valid events.
pub struct CloudEventReceiver<T> {
    transport: T,
    timeout: Duration,
}

impl<T: Transport> CloudEventReceiver<T> {
    /// Creates a receiver polling with [`POLL_TIMEOUT`].
    pub fn new(transport: T) -> Self {
        Self::with_timeout(transport, POLL_TIMEOUT)
    }

    /// Creates a receiver with a custom poll timeout.
    pub fn with_timeout(transport: T, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Polls the transport and invokes `handler` for every valid event.
    ///
    /// # Errors
    ///
    /// Returns `ConsumerError::Transport` when a poll fails, or the
    /// handler's error if it returns one.
    pub async fn start_receiver<H>(&mut self, handler: &mut H) -> Result<(), ConsumerError>
    where
        H: EventHandler<CloudEvent>,
    {
        loop {
            let message = match self.transport.poll(self.timeout).await {
                PollOutcome::Timeout => continue,
                PollOutcome::Error(e) => return Err(ConsumerError::Transport(e)),
                PollOutcome::Message(message) => message,
            };

            match CloudEvent::from_message(&message) {
                Ok(event) => {
                    debug!(
                        event_id = %event.id,
                        event_type = %event.event_type,
                        "Received CloudEvent"
                    );
                    handler.handle(event)?;
                }
                Err(e) => {
                    warn!(position = %position(&message), "Skipping malformed CloudEvent: {}", e);
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl<T: Transport> MessageSource for CloudEventReceiver<T> {
    type Item = CloudEvent;

    async fn run<H>(&mut self, handler: &mut H) -> Result<(), ConsumerError>
    where
        H: EventHandler<Self::Item>,
    {
        self.start_receiver(handler).await
    }
}

fn position(message: &TransportMessage) -> String {
    format!("{}[{}]@{}", message.topic, message.partition, message.offset)
}
