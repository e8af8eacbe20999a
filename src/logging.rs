//! Structured logging setup
//!
//! Provides JSON-formatted and human-readable logging on stderr, so that
//! stdout carries nothing but emitted messages. Integrates with the tracing
//! ecosystem for structured event logging.

use anyhow::Result;
use std::io;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging options taken from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json_format: bool,
}

impl LoggingConfig {
    /// Builds the logging configuration from CLI switches.
    ///
    /// # Examples
    ///
    /// ```
    /// use kafka_tail::logging::LoggingConfig;
    ///
    /// let config = LoggingConfig::from_flags(true, false);
    /// assert_eq!(config.level, "kafka_tail=debug");
    /// ```
    pub fn from_flags(verbose: bool, json_format: bool) -> Self {
        let level = if verbose {
            "kafka_tail=debug"
        } else {
            "kafka_tail=info"
        };
        Self {
            level: level.to_string(),
            json_format,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::from_flags(false, false)
    }
}

/// Initialize logging based on configuration.
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json_format {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .try_init()?;
    }

    Ok(())
}
