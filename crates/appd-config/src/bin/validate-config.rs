//! Config validation CLI tool
//!
//! Validates an appd configuration file and reports any errors.

use appd_config::{ConfigError, CURRENT_CONFIG_VERSION};
use appd_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates an appd configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config config.example.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match appd_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", CURRENT_CONFIG_VERSION);
            println!("  Params dir: {}", policy.daemon.params_dir.display());
            println!("  Telemetry socket: {}", policy.daemon.telemetry_socket.display());
            println!(
                "  Cycle: every {}s, +{} frames (start {}, thermal restart {}, stop {})",
                policy.supervisor.cycle_interval.as_secs(),
                policy.supervisor.frame_step,
                policy.supervisor.start_delay,
                policy.supervisor.thermal_restart_delay,
                policy.supervisor.stop_delay,
            );
            println!(
                "  Install: online={} auto_update={}",
                policy.install.online, policy.install.auto_update
            );
            println!("  Apps: {}", policy.apps.len());

            if !policy.apps.is_empty() {
                println!();
                println!("Apps:");
                for app in &policy.apps {
                    let manual = app.manual_ctrl_param.as_deref().unwrap_or("-");
                    println!(
                        "  - {} [{}] manual={}",
                        app.id.component(),
                        app.category,
                        manual
                    );
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ {}: invalid configuration", config_path.display());
            report(&e);
            ExitCode::from(1)
        }
    }
}

fn report(error: &ConfigError) {
    match error {
        ConfigError::ValidationFailed { errors } => {
            for err in errors {
                eprintln!("  - {}", err);
            }
            eprintln!("{} problem(s) found", errors.len());
        }
        ConfigError::UnsupportedVersion(version) => {
            eprintln!(
                "  config_version = {} is not supported, this build reads version {}",
                version, CURRENT_CONFIG_VERSION
            );
        }
        other => eprintln!("  {}", other),
    }
}
