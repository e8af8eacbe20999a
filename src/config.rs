//! Kafka consumer configuration for kafka-tail.
//!
//! This module turns the validated command line into an immutable
//! [`ConsumerSettings`] bundle: the connection parameters handed to the
//! Kafka client, the selected [`ConsumerMode`] and the compiled filter.
//!
//! # Example
//!
//! ```rust
//! use clap::Parser;
//! use kafka_tail::cli::Cli;
//! use kafka_tail::config::{ConsumerMode, ConsumerSettings, OffsetReset};
//!
//! let cli = Cli::parse_from([
//!     "kafka-tail",
//!     "--bootstrap-server", "broker.local",
//!     "--topic", "orders",
//!     "--ssl-key-file", "client.key",
//!     "--ca-crt-file", "ca.crt",
//!     "--client-crt-file", "client.crt",
//!     "--ce-mode",
//! ]);
//!
//! let settings = ConsumerSettings::from_cli_at(&cli, 1_700_000_000_000).unwrap();
//! assert_eq!(settings.mode, ConsumerMode::CloudEvents);
//! assert_eq!(settings.connection.offset_reset, OffsetReset::Latest);
//! assert_eq!(settings.connection.client_id, "kafka-consumer-1700000000000");
//! ```

use crate::cli::{Cli, OffsetResetArg};
use crate::error::ConfigError;
use crate::filter::FilterSpec;
use chrono::Utc;
use rdkafka::config::ClientConfig;
use tracing::warn;

/// Prefix of the per-run client and consumer group identity.
pub const CLIENT_ID_PREFIX: &str = "kafka-consumer-";

/// Security protocol used for every connection.
pub const SECURITY_PROTOCOL: &str = "SSL";

/// How consumed messages are interpreted.
///
/// Selected once at startup and never switched while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerMode {
    /// Payloads are parsed as plain JSON and printed with key and headers.
    Raw,
    /// Messages are decoded as CloudEvents.
    CloudEvents,
}

impl ConsumerMode {
    /// Offset reset policy used when none is given on the command line.
    ///
    /// CloudEvents mode tails live traffic, raw mode replays the topic.
    pub fn default_offset_reset(&self) -> OffsetReset {
        match self {
            Self::Raw => OffsetReset::Earliest,
            Self::CloudEvents => OffsetReset::Latest,
        }
    }

    /// Flag holding the filter patterns for this mode.
    pub fn filter_flag(&self) -> &'static str {
        match self {
            Self::Raw => "--key-filters",
            Self::CloudEvents => "--ce-type-filters",
        }
    }

    /// Short name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::CloudEvents => "cloudevents",
        }
    }
}

/// Behaviour when no committed offset exists for the consumer group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetReset {
    /// Start from the beginning of the topic.
    Earliest,
    /// Only consume messages produced after subscribing.
    Latest,
}

impl OffsetReset {
    /// Returns the Kafka configuration string for this policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earliest => "earliest",
            Self::Latest => "latest",
        }
    }
}

impl From<OffsetResetArg> for OffsetReset {
    fn from(arg: OffsetResetArg) -> Self {
        match arg {
            OffsetResetArg::Earliest => Self::Earliest,
            OffsetResetArg::Latest => Self::Latest,
        }
    }
}

/// SSL/TLS configuration.
///
/// Contains paths to certificates for mutual TLS connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SslConfig {
    /// Path to CA certificate file.
    pub ca_location: String,
    /// Path to client certificate file.
    pub certificate_location: String,
    /// Path to client key file.
    pub key_location: String,
}

/// Connection parameters for the Kafka client.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Broker host name or IP.
    pub bootstrap_server: String,

    /// Broker port.
    pub port: u16,

    /// Client id and consumer group id, unique per run.
    pub client_id: String,

    /// Topic to consume from.
    pub topic: String,

    /// Client certificate material.
    pub ssl: SslConfig,

    /// Auto offset reset policy.
    pub offset_reset: OffsetReset,

    /// Whether broker certificates are verified. Always false.
    pub verify_certificates: bool,
}

impl ConnectionConfig {
    /// Broker address in `host:port` form.
    pub fn server(&self) -> String {
        format!("{}:{}", self.bootstrap_server, self.port)
    }

    /// Returns the Kafka configuration as an ordered key-value list.
    pub fn client_settings(&self) -> Vec<(String, String)> {
        vec![
            ("bootstrap.servers".to_string(), self.server()),
            ("group.id".to_string(), self.client_id.clone()),
            ("client.id".to_string(), self.client_id.clone()),
            (
                "security.protocol".to_string(),
                SECURITY_PROTOCOL.to_string(),
            ),
            ("ssl.key.location".to_string(), self.ssl.key_location.clone()),
            (
                "ssl.certificate.location".to_string(),
                self.ssl.certificate_location.clone(),
            ),
            ("ssl.ca.location".to_string(), self.ssl.ca_location.clone()),
            (
                "auto.offset.reset".to_string(),
                self.offset_reset.as_str().to_string(),
            ),
            (
                "enable.ssl.certificate.verification".to_string(),
                self.verify_certificates.to_string(),
            ),
        ]
    }

    /// Builds the rdkafka client configuration.
    pub fn client_config(&self) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        for (key, value) in self.client_settings() {
            client_config.set(key, value);
        }
        client_config
    }
}

/// Everything the consumer needs for one run.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    /// Kafka connection parameters.
    pub connection: ConnectionConfig,
    /// Message interpretation strategy.
    pub mode: ConsumerMode,
    /// Compiled filter for the active mode.
    pub filter: FilterSpec,
}

impl ConsumerSettings {
    /// Validates the command line and builds settings for this run.
    ///
    /// The client identity is derived from the current time in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` listing every missing flag and filter
    /// compile failure.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        Self::from_cli_at(cli, Utc::now().timestamp_millis())
    }

    /// Same as [`ConsumerSettings::from_cli`] with an explicit startup
    /// timestamp in milliseconds.
    pub fn from_cli_at(cli: &Cli, started_at_ms: i64) -> Result<Self, ConfigError> {
        let mut problems = Vec::new();

        let bootstrap_server = required(&cli.bootstrap_server, "--bootstrap-server", &mut problems);
        let key_location = required(&cli.ssl_key_file, "--ssl-key-file", &mut problems);
        let ca_location = required(&cli.ca_crt_file, "--ca-crt-file", &mut problems);
        let certificate_location =
            required(&cli.client_crt_file, "--client-crt-file", &mut problems);
        let topic = required(&cli.topic, "--topic", &mut problems);

        let mode = if cli.ce_mode {
            ConsumerMode::CloudEvents
        } else {
            ConsumerMode::Raw
        };

        let type_filter = compile_flag("--ce-type-filters", &cli.ce_type_filters, &mut problems);
        let key_filter = compile_flag("--key-filters", &cli.key_filters, &mut problems);

        let (filter, ignored) = match mode {
            ConsumerMode::Raw => (key_filter, type_filter),
            ConsumerMode::CloudEvents => (type_filter, key_filter),
        };

        if ignored.is_active() {
            warn!(
                mode = mode.as_str(),
                "Ignoring filter flag that does not apply to this mode (use {})",
                mode.filter_flag()
            );
        }

        if !problems.is_empty() {
            return Err(ConfigError::new(problems));
        }

        let offset_reset = cli
            .offset_reset
            .map(OffsetReset::from)
            .unwrap_or_else(|| mode.default_offset_reset());

        let connection = ConnectionConfig {
            bootstrap_server,
            port: cli.port,
            client_id: format!("{}{}", CLIENT_ID_PREFIX, started_at_ms),
            topic,
            ssl: SslConfig {
                ca_location,
                certificate_location,
                key_location,
            },
            offset_reset,
            verify_certificates: false,
        };

        Ok(Self {
            connection,
            mode,
            filter,
        })
    }
}

/// Compiles a filter flag, recording a problem when a pattern is invalid.
fn compile_flag(flag: &str, value: &str, problems: &mut Vec<String>) -> FilterSpec {
    FilterSpec::compile(value).unwrap_or_else(|e| {
        problems.push(format!("failed to parse flag {}: {}", flag, e));
        FilterSpec::default()
    })
}

/// Returns the flag value, or records a problem when it is absent or empty.
fn required(value: &Option<String>, flag: &str, problems: &mut Vec<String>) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            problems.push(format!("flag {} was not set", flag));
            String::new()
        }
    }
}
