//! Command-line interface definition for kafka-tail
//!
//! This module defines the CLI structure using clap's derive API. Required
//! connection flags are modelled as options so that missing ones can be
//! collected and reported together by [`crate::config::ConnectionConfig::from_cli`].

use clap::{Parser, ValueEnum};

/// Default broker port for SSL listeners.
pub const DEFAULT_PORT: u16 = 9093;

/// kafka-tail - diagnostic Kafka consumer
///
/// Connects to an SSL-secured Kafka cluster, subscribes to one topic and
/// prints every received message to stdout as indented JSON.
#[derive(Parser, Debug, Clone)]
#[command(name = "kafka-tail")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Bootstrap server name/IP
    #[arg(long)]
    pub bootstrap_server: Option<String>,

    /// Bootstrap server port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Kafka topic to consume
    #[arg(long)]
    pub topic: Option<String>,

    /// client.key file location for SSL authentication
    #[arg(long)]
    pub ssl_key_file: Option<String>,

    /// ca.crt file location for SSL authentication
    #[arg(long)]
    pub ca_crt_file: Option<String>,

    /// client.crt file location for SSL authentication
    #[arg(long)]
    pub client_crt_file: Option<String>,

    /// CloudEvents mode. If set, Kafka messages are decoded as CloudEvents
    #[arg(long)]
    pub ce_mode: bool,

    /// Comma separated list of CloudEvent type regex filters (CloudEvents mode)
    #[arg(long, default_value = "")]
    pub ce_type_filters: String,

    /// Comma separated list of message key regex filters (raw mode)
    #[arg(long, default_value = "")]
    pub key_filters: String,

    /// Offset reset policy; defaults to `latest` in CloudEvents mode and
    /// `earliest` in raw mode
    #[arg(long, value_enum)]
    pub offset_reset: Option<OffsetResetArg>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Offset reset policy as accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetResetArg {
    /// Start from the beginning of the topic
    Earliest,
    /// Only consume new messages
    Latest,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["kafka-tail"]).unwrap();
        assert_eq!(cli.port, DEFAULT_PORT);
        assert!(cli.bootstrap_server.is_none());
        assert!(cli.topic.is_none());
        assert!(!cli.ce_mode);
        assert_eq!(cli.ce_type_filters, "");
        assert_eq!(cli.key_filters, "");
        assert!(cli.offset_reset.is_none());
        assert!(!cli.json_logs);
    }

    #[test]
    fn test_cli_parse_full_flag_set() {
        let cli = Cli::try_parse_from([
            "kafka-tail",
            "--bootstrap-server",
            "10.0.0.5",
            "--port",
            "19093",
            "--topic",
            "orders",
            "--ssl-key-file",
            "client.key",
            "--ca-crt-file",
            "ca.crt",
            "--client-crt-file",
            "client.crt",
            "--ce-mode",
            "--ce-type-filters",
            r"^order\.",
        ])
        .unwrap();

        assert_eq!(cli.bootstrap_server.as_deref(), Some("10.0.0.5"));
        assert_eq!(cli.port, 19093);
        assert_eq!(cli.topic.as_deref(), Some("orders"));
        assert_eq!(cli.ssl_key_file.as_deref(), Some("client.key"));
        assert_eq!(cli.ca_crt_file.as_deref(), Some("ca.crt"));
        assert_eq!(cli.client_crt_file.as_deref(), Some("client.crt"));
        assert!(cli.ce_mode);
        assert_eq!(cli.ce_type_filters, r"^order\.");
    }

    #[test]
    fn test_cli_parse_offset_reset() {
        let cli = Cli::try_parse_from(["kafka-tail", "--offset-reset", "latest"]).unwrap();
        assert_eq!(cli.offset_reset, Some(OffsetResetArg::Latest));
    }

    #[test]
    fn test_cli_rejects_bad_port() {
        let cli = Cli::try_parse_from(["kafka-tail", "--port", "not-a-port"]);
        assert!(cli.is_err());
    }
}
