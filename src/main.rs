//! GitHub Exporter Binary Entry Point
//!
//! Runs one export, or keeps exporting on a schedule until shutdown.
//! Core functionality is provided by the `github_exporter` library crate.

use std::process::ExitCode;

use clap::Parser;
use github_exporter::{
    Exporter, Schedule,
    config::{DEFAULT_CONFIG_PATH, ExporterConfig},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// GitHub Exporter - repository metrics to InfluxDB
#[derive(Parser, Debug)]
#[command(name = "github-exporter", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = DEFAULT_CONFIG_PATH,
        env = "GITHUB_EXPORTER_CONFIG"
    )]
    config: String,

    /// Keep running on a schedule: an interval (`1h`, `30m`) or a 6-field
    /// cron expression (`0 0 * * * *`). Without it, export once and exit.
    #[arg(long, env = "GITHUB_EXPORTER_SCHEDULE")]
    schedule: Option<Schedule>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,github_exporter=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    tracing::info!("Loading configuration from: {}", cli.config);
    let config = match ExporterConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?config, "Configuration loaded");

    let exporter = match Exporter::from_config(&config) {
        Ok(exporter) => exporter,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialise exporter");
            return ExitCode::FAILURE;
        }
    };

    match cli.schedule {
        None => match exporter.run().await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "Export run failed");
                ExitCode::FAILURE
            }
        },
        Some(schedule) => {
            tracing::info!(%schedule, "Running on schedule");
            tracing::info!("Press Ctrl+C to shutdown");
            tokio::select! {
                _ = run_scheduled(&exporter, &schedule) => {}
                _ = shutdown_signal() => {}
            }
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
    }
}

/// Export now, then on every tick of `schedule`.
///
/// A failed run is logged and the next tick proceeds.
async fn run_scheduled(exporter: &Exporter, schedule: &Schedule) {
    loop {
        if let Err(e) = exporter.run().await {
            tracing::error!(error = %e, "Export run failed");
        }

        let Some(delay) = schedule.next_delay(chrono::Utc::now()) else {
            tracing::warn!(%schedule, "Schedule has no further occurrences");
            return;
        };
        tracing::info!(
            next_run_in = %humantime::format_duration(delay),
            "Waiting for next run"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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
