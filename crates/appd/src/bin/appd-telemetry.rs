//! Telemetry publisher CLI
//!
//! Sends samples to a running appd, for bench testing without the vehicle
//! stack.

use anyhow::{Context, Result};
use appd_api::{TelemetrySample, ThermalStatus};
use appd_telemetry::TelemetryPublisher;
use appd_util::default_telemetry_socket;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Publish telemetry samples to appd
#[derive(Parser, Debug)]
#[command(name = "appd-telemetry")]
#[command(about = "Publish telemetry samples to appd", long_about = None)]
struct Args {
    /// Telemetry socket path (or set APPD_TELEMETRY_SOCKET env var)
    #[arg(short, long, env = "APPD_TELEMETRY_SOCKET", default_value_os_t = default_telemetry_socket())]
    socket: PathBuf,

    /// Report the vehicle as started
    #[arg(long)]
    started: bool,

    /// Thermal status: green, yellow, red, danger (or 0-3)
    #[arg(short, long, default_value = "green")]
    thermal: ThermalStatus,

    /// Number of samples to send
    #[arg(short = 'n', long, default_value_t = 1)]
    count: u32,

    /// Delay between samples in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut publisher = TelemetryPublisher::connect(&args.socket)
        .await
        .with_context(|| format!("Failed to connect to {:?}", args.socket))?;

    let sample = TelemetrySample::new(args.started, args.thermal);
    for i in 0..args.count {
        if i > 0 {
            tokio::time::sleep(Duration::from_millis(args.interval_ms)).await;
        }
        publisher
            .publish(&sample)
            .await
            .context("Failed to publish sample")?;
        println!(
            "sent started={} thermal={}",
            sample.started, sample.thermal_status
        );
    }

    publisher.close().await?;
    Ok(())
}
