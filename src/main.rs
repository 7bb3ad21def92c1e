//! Door controller - garage door position reporting and relay control
//!
//! Runs on a Raspberry Pi with reed sensors along the door track and a relay
//! wired across the opener's push button. Without hardware, the emulated
//! backend simulates door travel after each toggle.
//!
//! Module structure:
//! - `domain/` - Door positions, sensor vectors, decode table
//! - `io/` - GPIO backends, event log, HTTP API
//! - `services/` - Actuator, transition monitor, travel emulator
//! - `infra/` - Configuration and logging

use clap::Parser;
use door_controller::infra::{logging, Config};
use door_controller::io::{start_api_server, ApiState, FileEventSink};
use door_controller::services::DoorController;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Door controller - sensor monitoring and relay toggle service
#[derive(Parser, Debug)]
#[command(name = "door-controller", version, about)]
struct Args {
    /// Path to TOML configuration file (default: $CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    info!(git_hash = %env!("GIT_HASH"), "door-controller starting");

    // Parse command line arguments using clap
    let args = Args::parse();

    let config = match args.config.as_deref() {
        Some(path) => Config::load_from_path(path),
        None => Config::load(&std::env::args().collect::<Vec<_>>()),
    };

    info!(
        config_file = %config.config_file(),
        backend = %config.gpio_backend().as_str(),
        relay_pin = %config.relay_pin(),
        sensor_pins = ?config.topology().pins(),
        decode_entries = %config.decode_table().entries().len(),
        poll_interval_ms = %config.poll_interval().as_millis(),
        events_file = %config.events_file(),
        http_port = %config.http_port(),
        "config_loaded"
    );

    let log = Arc::new(FileEventSink::new(config.events_file()));
    let door = Arc::new(DoorController::from_config(&config, log.clone()));
    // sysfs export sleeps while udev settles
    tokio::task::block_in_place(|| door.setup())?;

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let api_task = if config.http_port() > 0 {
        let addr: SocketAddr = format!("{}:{}", config.http_bind_address(), config.http_port())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid HTTP bind address: {e}"))?;
        let state = Arc::new(ApiState {
            door: door.clone(),
            log,
            default_log_limit: config.events_recent_limit(),
        });
        let api_shutdown = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = start_api_server(addr, state, api_shutdown).await {
                tracing::error!(error = %e, "HTTP API error");
            }
        }))
    } else {
        None
    };

    tokio::signal::ctrl_c().await?;
    info!("shutdown_signal_received");
    let _ = shutdown_tx.send(true);

    if let Some(task) = api_task {
        let _ = task.await;
    }
    door.shutdown().await;

    info!("door-controller shutdown complete");
    Ok(())
}
