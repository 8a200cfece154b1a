//! Events emitted by the supervisor

use appd_api::{Direction, ThermalStatus};
use appd_util::AppId;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Why the supervisor dispatched an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionReason {
    /// The app's enable flag was cleared while it was running
    Disabled,
    /// A manual control request
    Override,
    /// One-shot category action on the stopped -> started edge
    VehicleStarted,
    /// Fullscreen exclusivity
    Fullscreen,
    /// Thermal status blocks automatic runs
    Thermal,
    /// Start delay has passed for an auto-run app
    AutoRun,
    /// Stop delay has passed since the vehicle stopped
    StopDelay,
}

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SupervisorEventKind {
    /// Start commands were dispatched
    AppStarted {
        app: AppId,
        forced: bool,
        reason: ActionReason,
    },

    /// Kill commands were dispatched
    AppKilled {
        app: AppId,
        forced: bool,
        reason: ActionReason,
    },

    /// A manual control request was acknowledged
    OverrideHonored { app: AppId, direction: Direction },

    /// The vehicle started or stopped
    SessionEdge { started: bool, frame: u64 },

    /// Automatic runs were allowed or blocked by thermal status
    ThermalGateChanged {
        auto_run_allowed: bool,
        thermal_status: ThermalStatus,
    },
}

/// A supervisor event with the wall-clock time it was recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorEvent {
    pub timestamp: DateTime<Local>,
    #[serde(flatten)]
    pub kind: SupervisorEventKind,
}

impl SupervisorEvent {
    pub fn new(kind: SupervisorEventKind) -> Self {
        Self {
            timestamp: appd_util::now(),
            kind,
        }
    }

    /// The app this event concerns, if any
    pub fn app(&self) -> Option<&AppId> {
        match &self.kind {
            SupervisorEventKind::AppStarted { app, .. }
            | SupervisorEventKind::AppKilled { app, .. }
            | SupervisorEventKind::OverrideHonored { app, .. } => Some(app),
            SupervisorEventKind::SessionEdge { .. }
            | SupervisorEventKind::ThermalGateChanged { .. } => None,
        }
    }
}
