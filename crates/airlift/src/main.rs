//! Airlift
//!
//! Runs one airlift simulation and writes its audit log.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize Prometheus metrics recorder
//! 3. Create the audit log (`GeneralRepository`)
//! 4. Run the simulation, cancelled on Ctrl+C
//! 5. Flush the audit log and log the run report

#![warn(clippy::pedantic)]

use std::sync::Arc;

use airlift::config::Config;
use airlift::observability::metrics::init_metrics_recorder;
use airlift::repository::{GeneralRepository, Reporter};
use airlift::simulation::run_simulation;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airlift=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Airlift");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        run_id = %config.run_id,
        passengers = config.params.passengers,
        min_boarding = config.params.min_boarding,
        max_seats = config.params.max_seats,
        log_file = %config.log_file,
        travel_max_ms = config.delays.travel_max.as_millis(),
        flight_forward_max_ms = config.delays.flight_forward_max.as_millis(),
        flight_back_max_ms = config.delays.flight_back_max.as_millis(),
        "Configuration loaded successfully"
    );

    // Must happen before any metrics are recorded
    let prometheus_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        e
    })?;

    let repository = Arc::new(
        GeneralRepository::create(&config.log_file, config.params.passengers, &config.run_id)
            .map_err(|e| {
                error!(error = %e, path = %config.log_file, "Failed to create audit log");
                e
            })?,
    );

    let cancel_token = CancellationToken::new();
    let signal_token = cancel_token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Shutdown signal received, cancelling simulation");
        signal_token.cancel();
    });

    let reporter: Arc<dyn Reporter> = Arc::clone(&repository) as Arc<dyn Reporter>;
    let outcome = run_simulation(&config, reporter, cancel_token).await;

    // The audit log is flushed even for a failed run.
    let flushed = repository.finish();

    debug!(metrics = %prometheus_handle.render(), "Final metrics snapshot");

    let report = outcome.map_err(|e| {
        error!(error = %e, error_type = e.error_type(), "Simulation failed");
        e
    })?;
    flushed.map_err(|e| {
        error!(error = %e, path = %config.log_file, "Failed to write audit log");
        e
    })?;

    match serde_json::to_string(&report) {
        Ok(json) => info!(report = %json, "Simulation report"),
        Err(e) => warn!(error = %e, "Failed to serialize simulation report"),
    }

    info!(
        flights = report.flights.len(),
        transported = report.transported_passengers,
        "Airlift complete"
    );

    Ok(())
}

/// Wait for Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        // Never resolve: the simulation runs to completion unattended.
        std::future::pending::<()>().await;
    }
}
