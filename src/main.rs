//! kafka-tail - diagnostic Kafka consumer
//!
#![doc = "Main entry point for the kafka-tail binary."]

use std::process::ExitCode;

use anyhow::anyhow;
use tracing::{error, info};

use kafka_tail::cli::Cli;
use kafka_tail::config::{ConsumerMode, ConsumerSettings};
use kafka_tail::dispatcher;
use kafka_tail::logging::{init_logging, LoggingConfig};
use kafka_tail::transport::KafkaTransport;
use kafka_tail::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Parse command line arguments
    let cli = Cli::parse_args();

    if let Err(e) = init_logging(&LoggingConfig::from_flags(cli.verbose, cli.json_logs)) {
        eprintln!("ERROR: failed to initialize logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Validate flags, connect and consume until a fatal error.
async fn run(cli: Cli) -> Result<()> {
    let settings = ConsumerSettings::from_cli(&cli).map_err(|e| {
        anyhow!(
            "invalid command line flags:\n{}\nRun kafka-tail --help to see the available cli flags.",
            e
        )
    })?;

    let connection = &settings.connection;
    info!(
        "Starting kafka consumer {} on server {}. Topic {:?}",
        connection.client_id,
        connection.server(),
        connection.topic
    );

    match settings.mode {
        ConsumerMode::CloudEvents => info!(
            filters = %settings.filter.summary(),
            "Cloud Events mode enabled"
        ),
        ConsumerMode::Raw => info!(
            filters = %settings.filter.summary(),
            "Raw mode enabled"
        ),
    }

    let transport = KafkaTransport::connect(connection)?;

    dispatcher::run(
        settings.mode,
        transport,
        &settings.filter,
        std::io::stdout(),
    )
    .await?;

    Ok(())
}
