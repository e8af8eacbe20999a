//! kafka-tail - diagnostic Kafka consumer library
//!
//! This library provides the building blocks of the `kafka-tail` binary:
//! connection configuration, regex filtering, raw and CloudEvents decoding,
//! the Kafka transport and the dispatcher that prints accepted messages.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `cli`: Command-line interface definition
//! - `config`: Connection settings, consumer mode and validation
//! - `filter`: Regex filter compilation and evaluation
//! - `message`: Transport records and the raw-mode JSON view
//! - `cloudevents`: CloudEvents envelope and Kafka protocol binding
//! - `transport`: Poll abstraction and the rdkafka implementation
//! - `source`: Raw (pull) and CloudEvents (push) message sources
//! - `dispatcher`: Filter-and-print handler and mode selection
//! - `logging`: tracing subscriber setup
//! - `error`: Error types and result aliases
//!
//! # Example
//!
//! ```no_run
//! use kafka_tail::{dispatcher, ConsumerSettings, KafkaTransport};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cli = kafka_tail::cli::Cli::parse();
//!     let settings = ConsumerSettings::from_cli(&cli)?;
//!     let transport = KafkaTransport::connect(&settings.connection)?;
//!     dispatcher::run(settings.mode, transport, &settings.filter, std::io::stdout()).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod cloudevents;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod logging;
pub mod message;
pub mod source;
pub mod transport;

// Re-export commonly used types
pub use cloudevents::CloudEvent;
pub use config::{ConnectionConfig, ConsumerMode, ConsumerSettings, OffsetReset};
pub use error::{ConfigError, ConsumerError, Result};
pub use filter::FilterSpec;
pub use message::{DecodedMessage, PollOutcome, TransportMessage};
pub use transport::{KafkaTransport, Transport};
