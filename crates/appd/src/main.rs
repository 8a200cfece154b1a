//! appd - The companion app lifecycle service
//!
//! This is the main entry point for the appd service.
//! It wires together all the components:
//! - Configuration loading
//! - Parameter store
//! - Shell executor and package installer (Android)
//! - Telemetry server
//! - Lifecycle supervisor

use anyhow::{Context, Result};
use appd_config::{load_config, Policy};
use appd_core::{HostServices, LoopStep, SupervisorEvent, SupervisorLoop};
use appd_host_android::{AndroidInstaller, ShellExecutor, UpdateManifest};
use appd_params::FileParams;
use appd_telemetry::{TelemetryReceiver, TelemetryServer};
use appd_util::{default_config_path, MonotonicInstant};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// appd - Lifecycle supervisor for in-vehicle companion apps
#[derive(Parser, Debug)]
#[command(name = "appd")]
#[command(about = "Lifecycle supervisor for in-vehicle companion apps", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/appd/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Params directory override (or set APPD_PARAMS_DIR env var)
    #[arg(short, long, env = "APPD_PARAMS_DIR")]
    params_dir: Option<PathBuf>,

    /// Telemetry socket override (or set APPD_TELEMETRY_SOCKET env var)
    #[arg(short, long, env = "APPD_TELEMETRY_SOCKET")]
    telemetry_socket: Option<PathBuf>,

    /// Shell used to run lifecycle commands (default: /system/bin/sh, else sh)
    #[arg(long)]
    shell: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    policy: Policy,
    services: HostServices,
    telemetry: Arc<TelemetryServer>,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        let policy = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            app_count = policy.apps.len(),
            "Configuration loaded"
        );

        let params_dir = args
            .params_dir
            .clone()
            .unwrap_or_else(|| policy.daemon.params_dir.clone());

        let socket_path = args
            .telemetry_socket
            .clone()
            .unwrap_or_else(|| policy.daemon.telemetry_socket.clone());

        let params = FileParams::open(&params_dir)
            .with_context(|| format!("Failed to open params directory {:?}", params_dir))?;

        info!(params_dir = %params_dir.display(), "Parameter store opened");

        let executor = Arc::new(match &args.shell {
            Some(shell) => ShellExecutor::new(shell.clone()),
            None => ShellExecutor::detect(),
        });

        info!(shell = %executor.shell().display(), "Shell executor initialized");

        let manifest = match &policy.install.manifest {
            Some(path) => Some(
                UpdateManifest::load(path)
                    .with_context(|| format!("Failed to load update manifest {:?}", path))?,
            ),
            None => None,
        };

        let installer = Arc::new(AndroidInstaller::new(executor.clone(), manifest));

        let mut telemetry = TelemetryServer::new(&socket_path);
        telemetry
            .start()
            .await
            .with_context(|| format!("Failed to bind telemetry socket {:?}", socket_path))?;

        Ok(Self {
            policy,
            services: HostServices {
                params: Arc::new(params),
                executor,
                installer,
            },
            telemetry: Arc::new(telemetry),
        })
    }

    async fn run(self) -> Result<()> {
        let telemetry_accept = self.telemetry.clone();
        tokio::spawn(async move {
            if let Err(e) = telemetry_accept.run().await {
                error!(error = %e, "Telemetry server error");
            }
        });

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup =
            signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        let timing = self.policy.supervisor;
        let mut receiver = self.telemetry.receiver();
        let mut runner = SupervisorLoop::new(
            self.policy.clone(),
            self.services.clone(),
            MonotonicInstant::now(),
        );

        info!(
            grace = ?timing.startup_grace,
            interval = ?timing.cycle_interval,
            "Service running"
        );

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }
                result = step(&mut runner, &mut receiver, timing.cycle_interval) => {
                    result?;
                }
            }
        }

        info!("Shutting down appd");
        self.telemetry.shutdown();
        info!("Shutdown complete");
        Ok(())
    }
}

/// One loop iteration followed by the inter-cycle sleep
async fn step(
    runner: &mut SupervisorLoop,
    receiver: &mut TelemetryReceiver,
    interval: Duration,
) -> Result<()> {
    match runner
        .step(MonotonicInstant::now(), receiver)
        .await
        .context("Failed to build supervisor")?
    {
        LoopStep::Waiting | LoopStep::Started => {}
        LoopStep::Cycle(events) => log_events(&events),
        LoopStep::TelemetryClosed => warn!("No telemetry available"),
    }

    tokio::time::sleep(interval).await;
    Ok(())
}

fn log_events(events: &[SupervisorEvent]) {
    for event in events {
        match serde_json::to_string(event) {
            Ok(json) => debug!(event = %json, "Supervisor event"),
            Err(e) => debug!(error = %e, kind = ?event.kind, "Supervisor event"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "appd starting");

    let service = Service::new(&args).await?;
    service.run().await
}
