//! Door check - one-shot toggle smoke test
//!
//! Reads the door position, pulses the relay once, waits and reads again.
//! Against the emulated backend this exercises the full travel simulation.

use clap::Parser;
use door_controller::infra::{logging, Config};
use door_controller::io::FileEventSink;
use door_controller::services::DoorController;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "door-check", version, about)]
struct Args {
    /// Path to TOML configuration file (default: $CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Seconds to wait after the toggle before reading again
    #[arg(short, long, default_value_t = 2)]
    wait_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let config = match args.config.as_deref() {
        Some(path) => Config::load_from_path(path),
        None => Config::load(&std::env::args().collect::<Vec<_>>()),
    };
    let log = Arc::new(FileEventSink::new(config.events_file()));
    let door = DoorController::from_config(&config, log);

    tokio::task::block_in_place(|| door.setup())?;
    let result = run(&door, Duration::from_secs(args.wait_secs)).await;
    door.shutdown().await;
    result
}

async fn run(door: &DoorController, wait: Duration) -> anyhow::Result<()> {
    println!("Current Status: {}", door.status()?);

    println!("Toggling door...");
    let pulse = door.toggle().await?;
    if let Some(direction) = pulse.simulated {
        println!("Simulating travel ({})", direction.as_str());
    }

    println!("Waiting {} seconds...", wait.as_secs());
    tokio::time::sleep(wait).await;
    println!("Current Status: {}", door.status()?);
    Ok(())
}
