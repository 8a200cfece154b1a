//! Raw configuration schema (as parsed from TOML)

use appd_api::AppCategory;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Daemon-level paths
    #[serde(default)]
    pub daemon: RawDaemonConfig,

    /// Supervisor cadence and delays
    #[serde(default)]
    pub supervisor: RawSupervisorConfig,

    /// Install/update policy
    #[serde(default)]
    pub install: RawInstallConfig,

    /// Supervised applications
    #[serde(default)]
    pub apps: Vec<RawApp>,
}

/// Daemon-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDaemonConfig {
    /// Parameter store directory
    pub params_dir: Option<PathBuf>,

    /// Telemetry socket path
    pub telemetry_socket: Option<PathBuf>,
}

/// Supervisor timing. Delays are in frames; the frame counter advances by
/// `frame_step` per telemetry sample.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSupervisorConfig {
    /// Grace period before any app is constructed
    pub startup_grace_seconds: Option<u64>,

    /// Sleep between cycles
    pub cycle_interval_seconds: Option<u64>,

    /// Frame counter increment per cycle
    pub frame_step: Option<u64>,

    /// Settle delay after the vehicle starts
    pub start_delay: Option<u64>,

    /// Delay after recovering from red thermal status
    pub thermal_restart_delay: Option<u64>,

    /// Grace period after the vehicle stops
    pub stop_delay: Option<u64>,
}

/// Install/update policy
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawInstallConfig {
    /// Whether remote versions may be fetched and packages installed
    #[serde(default)]
    pub online: bool,

    /// Update installed packages when the remote version differs
    #[serde(default)]
    pub auto_update: bool,

    /// JSON update manifest (package -> version and APK path)
    pub manifest: Option<PathBuf>,
}

/// Raw application definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawApp {
    /// Android package id
    pub package: String,

    /// Activity or service component started for this app
    pub entry_point: String,

    /// Arbitration category
    pub category: AppCategory,

    /// Parameter holding the enable flag ("1" = enabled). Always enabled if absent.
    pub enable_param: Option<String>,

    /// Parameter holding the auto-run flag ("1" = eligible)
    pub auto_run_param: Option<String>,

    /// Parameter holding manual control requests ("-1"/"0"/"1")
    pub manual_ctrl_param: Option<String>,

    /// Runtime permissions granted after install
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Operation modes allowed after install
    #[serde(default)]
    pub app_ops: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_app_entry() {
        let toml_str = r#"
            config_version = 1

            [[apps]]
            package = "com.mixplorer"
            entry_point = "com.mixplorer.activities.BrowseActivity"
            category = "utility"
            manual_ctrl_param = "OpkrRunMixplorer"
            permissions = ["android.permission.READ_EXTERNAL_STORAGE"]
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.apps.len(), 1);
        assert_eq!(config.apps[0].category, AppCategory::Utility);
        assert!(config.apps[0].enable_param.is_none());
        assert!(config.apps[0].app_ops.is_empty());
    }

    #[test]
    fn parse_supervisor_section() {
        let toml_str = r#"
            config_version = 1

            [supervisor]
            startup_grace_seconds = 0
            stop_delay = 90

            [install]
            online = true
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.supervisor.startup_grace_seconds, Some(0));
        assert_eq!(config.supervisor.stop_delay, Some(90));
        assert!(config.supervisor.frame_step.is_none());
        assert!(config.install.online);
        assert!(!config.install.auto_update);
    }
}
