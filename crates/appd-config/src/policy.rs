//! Validated policy structures

use crate::schema::{RawApp, RawConfig, RawDaemonConfig, RawInstallConfig, RawSupervisorConfig};
use appd_api::AppCategory;
use appd_util::{default_params_dir, default_telemetry_socket, AppId};
use std::path::PathBuf;
use std::time::Duration;

/// Validated policy ready for use by the supervisor
#[derive(Debug, Clone)]
pub struct Policy {
    /// Daemon configuration
    pub daemon: DaemonConfig,

    /// Supervisor cadence and delays
    pub supervisor: SupervisorTiming,

    /// Install/update policy
    pub install: InstallPolicy,

    /// Supervised applications, in construction order
    pub apps: Vec<AppSpec>,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            daemon: DaemonConfig::from_raw(raw.daemon),
            supervisor: SupervisorTiming::from_raw(raw.supervisor),
            install: InstallPolicy::from_raw(raw.install),
            apps: raw.apps.into_iter().map(AppSpec::from_raw).collect(),
        }
    }

    /// Get app by package id
    pub fn get_app(&self, package: &str) -> Option<&AppSpec> {
        self.apps.iter().find(|a| a.id.package() == package)
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub params_dir: PathBuf,
    pub telemetry_socket: PathBuf,
}

impl DaemonConfig {
    fn from_raw(raw: RawDaemonConfig) -> Self {
        Self {
            params_dir: raw.params_dir.unwrap_or_else(default_params_dir),
            telemetry_socket: raw.telemetry_socket.unwrap_or_else(default_telemetry_socket),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::from_raw(RawDaemonConfig::default())
    }
}

/// Supervisor cadence. Delays are measured in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorTiming {
    /// No app is constructed before this has elapsed
    pub startup_grace: Duration,

    /// Sleep between cycles
    pub cycle_interval: Duration,

    /// Frame counter increment per cycle
    pub frame_step: u64,

    /// Settle delay after the vehicle starts
    pub start_delay: u64,

    /// Start delay applied when recovering from red thermal status
    pub thermal_restart_delay: u64,

    /// Grace period before non-fullscreen apps are killed after the vehicle stops
    pub stop_delay: u64,
}

impl SupervisorTiming {
    fn from_raw(raw: RawSupervisorConfig) -> Self {
        let defaults = Self::default();
        Self {
            startup_grace: raw
                .startup_grace_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.startup_grace),
            cycle_interval: raw
                .cycle_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.cycle_interval),
            frame_step: raw.frame_step.unwrap_or(defaults.frame_step),
            start_delay: raw.start_delay.unwrap_or(defaults.start_delay),
            thermal_restart_delay: raw
                .thermal_restart_delay
                .unwrap_or(defaults.thermal_restart_delay),
            stop_delay: raw.stop_delay.unwrap_or(defaults.stop_delay),
        }
    }
}

impl Default for SupervisorTiming {
    fn default() -> Self {
        Self {
            startup_grace: Duration::from_secs(10),
            cycle_interval: Duration::from_secs(3),
            frame_step: 3,
            start_delay: 5,
            thermal_restart_delay: 60,
            stop_delay: 30,
        }
    }
}

/// Install/update policy
#[derive(Debug, Clone, Default)]
pub struct InstallPolicy {
    pub online: bool,
    pub auto_update: bool,
    pub manifest: Option<PathBuf>,
}

impl InstallPolicy {
    fn from_raw(raw: RawInstallConfig) -> Self {
        Self {
            online: raw.online,
            auto_update: raw.auto_update,
            manifest: raw.manifest,
        }
    }
}

/// Validated application definition
#[derive(Debug, Clone)]
pub struct AppSpec {
    pub id: AppId,
    pub category: AppCategory,
    pub enable_param: Option<String>,
    pub auto_run_param: Option<String>,
    pub manual_ctrl_param: Option<String>,
    pub permissions: Vec<String>,
    pub app_ops: Vec<String>,
}

impl AppSpec {
    /// Bare app entry; parameter keys and grants are added with the builder methods
    pub fn new(id: AppId, category: AppCategory) -> Self {
        Self {
            id,
            category,
            enable_param: None,
            auto_run_param: None,
            manual_ctrl_param: None,
            permissions: Vec::new(),
            app_ops: Vec::new(),
        }
    }

    pub fn with_enable_param(mut self, key: impl Into<String>) -> Self {
        self.enable_param = Some(key.into());
        self
    }

    pub fn with_auto_run_param(mut self, key: impl Into<String>) -> Self {
        self.auto_run_param = Some(key.into());
        self
    }

    pub fn with_manual_ctrl_param(mut self, key: impl Into<String>) -> Self {
        self.manual_ctrl_param = Some(key.into());
        self
    }

    pub fn with_permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions = permissions.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_app_ops(mut self, app_ops: &[&str]) -> Self {
        self.app_ops = app_ops.iter().map(|op| op.to_string()).collect();
        self
    }

    fn from_raw(raw: RawApp) -> Self {
        Self {
            id: AppId::new(raw.package, raw.entry_point),
            category: raw.category,
            enable_param: raw.enable_param,
            auto_run_param: raw.auto_run_param,
            manual_ctrl_param: raw.manual_ctrl_param,
            permissions: raw.permissions,
            app_ops: raw.app_ops,
        }
    }
}
