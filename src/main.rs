//! Mambo Binary Entry Point
//!
//! This binary runs the collection pipeline until interrupted.
//! Core functionality is provided by the `mambo` library crate.

use clap::Parser;
use mambo::{AppConfig, Pipeline};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Mambo - MySQL to StatsD metric collector
#[derive(Parser, Debug)]
#[command(name = "mambo", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "mambo.yaml", env = "MAMBO_CONFIG")]
    config: String,

    /// StatsD host (overrides config file)
    #[arg(long, env = "MAMBO_SINK_HOST")]
    sink_host: Option<String>,

    /// StatsD port (overrides config file)
    #[arg(long, env = "MAMBO_SINK_PORT")]
    sink_port: Option<u16>,

    /// MySQL host (overrides config file; empty selects the local socket)
    #[arg(long, env = "MAMBO_SOURCE_HOST")]
    source_host: Option<String>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mambo=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Mambo - MySQL to StatsD metric collector");

    let cli = Cli::parse();

    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::from_file(&cli.config)?;

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(host) = cli.sink_host {
        config.sink.host = host;
    }
    if let Some(port) = cli.sink_port {
        config.sink.port = port;
    }
    if let Some(host) = cli.source_host {
        config.source.host = host;
    }
    config.validate()?;

    tracing::info!(
        "Source: {}, Sink: {}",
        config.source.masked_dsn(),
        config.sink.address(),
    );

    if cli.check {
        print_summary(&config);
        return Ok(());
    }

    let pipeline = Pipeline::from_config(&config).await?;
    tracing::info!("Press Ctrl+C to shutdown");

    shutdown_signal().await;

    tracing::info!("Shutting down pipeline...");
    let report = pipeline.shutdown().await?;
    if report.probes.timed_out {
        tracing::warn!("Some probes were aborted during shutdown");
    }
    for job in &report.probes.jobs {
        if let Some(stats) = job.stats {
            tracing::info!(
                probe = %job.info.name,
                ticks = stats.ticks,
                succeeded = stats.succeeded,
                failed = stats.failed,
                "Probe summary"
            );
        }
    }
    tracing::info!(
        sent = report.dispatch.sent,
        failed = report.dispatch.failed,
        "Shutdown complete"
    );
    Ok(())
}

fn print_summary(config: &AppConfig) {
    println!("configuration OK");
    println!("  source: {}", config.source.masked_dsn());
    println!("  sink:   {}", config.sink.address());
    for probe in &config.probes {
        let state = if probe.enabled { "" } else { " (disabled)" };
        println!("  probe:  {probe}{state}");
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
