//! Lifecycle supervisor

use appd_api::{Direction, TelemetrySample};
use appd_config::{Policy, SupervisorTiming};
use appd_host_api::{ParamStore, ParamsMarker, TelemetrySource};
use appd_util::{AppId, AppdError};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    ActionReason, AppRecord, HostServices, SessionState, SupervisorEvent, SupervisorEventKind,
};

/// The supervisor control loop state
///
/// A cycle is split around the telemetry wait: [`Supervisor::prepare_cycle`]
/// handles parameter changes and manual control requests, then
/// [`Supervisor::apply_telemetry`] arbitrates on the received sample.
pub struct Supervisor {
    apps: Vec<AppRecord>,
    params: Arc<dyn ParamStore>,
    timing: SupervisorTiming,
    session: SessionState,
    last_marker: Option<ParamsMarker>,
    enabled: Vec<usize>,
}

impl Supervisor {
    /// Create a supervisor over already-built records
    pub fn new(
        apps: Vec<AppRecord>,
        params: Arc<dyn ParamStore>,
        timing: SupervisorTiming,
    ) -> appd_util::Result<Self> {
        let mut seen = HashSet::new();
        for app in &apps {
            if !seen.insert(app.id().package()) {
                return Err(AppdError::DuplicateApp(app.id().clone()));
            }
        }

        info!(app_count = apps.len(), "Supervisor initialized");

        Ok(Self {
            apps,
            params,
            timing,
            session: SessionState::new(),
            last_marker: None,
            enabled: Vec::new(),
        })
    }

    /// Build one record per configured app, in configuration order
    pub fn from_policy(policy: &Policy, services: &HostServices) -> appd_util::Result<Self> {
        let apps = policy
            .apps
            .iter()
            .map(|spec| AppRecord::new(spec.clone(), &policy.install, services))
            .collect();
        Self::new(apps, services.params.clone(), policy.supervisor)
    }

    pub fn apps(&self) -> &[AppRecord] {
        &self.apps
    }

    pub fn app(&self, id: &AppId) -> appd_util::Result<&AppRecord> {
        self.apps
            .iter()
            .find(|app| app.id() == id)
            .ok_or_else(|| AppdError::AppNotFound(id.clone()))
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Pre-telemetry half of a cycle: pick up parameter changes, kill apps
    /// that were just disabled, rebuild the enabled set and honor manual
    /// control requests.
    pub fn prepare_cycle(&mut self) -> Vec<SupervisorEvent> {
        let mut events = Vec::new();

        let marker = self.params.last_modified();
        let changed = marker != self.last_marker;
        if changed {
            debug!(marker = ?marker, "Parameters changed, refreshing apps");
        }

        for app in &mut self.apps {
            if changed {
                app.refresh();
            }
            if app.last_enabled() && !app.is_enabled() && app.is_running() && app.kill(true) {
                events.push(killed_event(app.id(), true, ActionReason::Disabled));
            }
        }
        self.last_marker = marker;

        self.enabled = self
            .apps
            .iter()
            .enumerate()
            .filter(|(_, app)| app.is_enabled())
            .map(|(i, _)| i)
            .collect();
        self.session.any_fullscreen_enabled = self
            .enabled
            .iter()
            .any(|&i| self.apps[i].category().is_fullscreen());

        for &i in &self.enabled {
            let app = &mut self.apps[i];
            let Some(direction) = app.consume_override() else {
                continue;
            };
            events.push(SupervisorEvent::new(SupervisorEventKind::OverrideHonored {
                app: app.id().clone(),
                direction,
            }));
            if let Some(event) = dispatch(app, direction, true, ActionReason::Override) {
                events.push(event);
            }
        }

        events
    }

    /// Post-telemetry half of a cycle: advance timers and arbitrate
    pub fn apply_telemetry(&mut self, sample: TelemetrySample) -> Vec<SupervisorEvent> {
        let mut events = Vec::new();
        let started = sample.started;
        let edge = self.session.is_edge(started);

        if started {
            if let Some(allowed) = self
                .session
                .observe_started(sample.thermal_status, &self.timing)
            {
                info!(
                    thermal = %sample.thermal_status,
                    auto_run_allowed = allowed,
                    "Thermal gate changed"
                );
                events.push(SupervisorEvent::new(
                    SupervisorEventKind::ThermalGateChanged {
                        auto_run_allowed: allowed,
                        thermal_status: sample.thermal_status,
                    },
                ));
            }

            if edge {
                info!(frame = self.session.frame, "Vehicle started");
                for &i in &self.enabled {
                    let app = &mut self.apps[i];
                    if let Some(direction) = app.category().rules().on_vehicle_start {
                        events.extend(dispatch(app, direction, false, ActionReason::VehicleStarted));
                    }
                }
            }

            let any_fullscreen = self.session.any_fullscreen_enabled;
            let auto_run_allowed = self.session.auto_run_allowed;
            let start_due = self.session.start_deadline_reached();

            for &i in &self.enabled {
                let app = &mut self.apps[i];
                if app.overridden_this_session() {
                    continue;
                }
                let rules = app.category().rules();

                if any_fullscreen {
                    if let Some(direction) = rules.under_fullscreen {
                        events.extend(dispatch(app, direction, false, ActionReason::Fullscreen));
                    }
                } else if !auto_run_allowed {
                    if app.kill(false) {
                        events.push(killed_event(app.id(), false, ActionReason::Thermal));
                    }
                } else if start_due && app.is_auto_run_eligible() && rules.auto_run {
                    events.extend(dispatch(app, Direction::Run, false, ActionReason::AutoRun));
                }
            }
        } else {
            if edge {
                info!(frame = self.session.frame, "Vehicle stopped");
            }
            self.session.observe_stopped(&self.timing);

            let any_fullscreen = self.session.any_fullscreen_enabled;
            let stop_due = self.session.stop_deadline_reached();

            for &i in &self.enabled {
                let app = &mut self.apps[i];
                if !app.is_running() || app.overridden_this_session() {
                    continue;
                }
                if any_fullscreen || stop_due {
                    let reason = if any_fullscreen {
                        ActionReason::Fullscreen
                    } else {
                        ActionReason::StopDelay
                    };
                    if app.kill(false) {
                        events.push(killed_event(app.id(), false, reason));
                    }
                }
            }
        }

        if edge {
            events.push(SupervisorEvent::new(SupervisorEventKind::SessionEdge {
                started,
                frame: self.session.frame,
            }));
            for &i in &self.enabled {
                self.apps[i].end_session();
            }
        }

        self.session.advance(started, self.timing.frame_step);
        events
    }

    /// Both halves of a cycle around an already-received sample
    pub fn cycle(&mut self, sample: TelemetrySample) -> Vec<SupervisorEvent> {
        let mut events = self.prepare_cycle();
        events.extend(self.apply_telemetry(sample));
        events
    }

    /// Run one cycle, waiting on `telemetry` between the two halves.
    ///
    /// Returns `None` if the telemetry source is gone; the post-telemetry half
    /// is skipped in that case.
    pub async fn run_cycle(
        &mut self,
        telemetry: &mut dyn TelemetrySource,
    ) -> Option<Vec<SupervisorEvent>> {
        let mut events = self.prepare_cycle();
        let Some(sample) = telemetry.recv().await else {
            warn!("Telemetry source closed, skipping cycle");
            return None;
        };
        events.extend(self.apply_telemetry(sample));
        Some(events)
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("apps", &self.apps)
            .field("timing", &self.timing)
            .field("session", &self.session)
            .finish()
    }
}

/// Unforced or forced run/kill, reported only if commands went out
fn dispatch(
    app: &mut AppRecord,
    direction: Direction,
    force: bool,
    reason: ActionReason,
) -> Option<SupervisorEvent> {
    match direction {
        Direction::Run => app.run(force).then(|| started_event(app.id(), force, reason)),
        Direction::Kill => app.kill(force).then(|| killed_event(app.id(), force, reason)),
    }
}

fn started_event(app: &AppId, forced: bool, reason: ActionReason) -> SupervisorEvent {
    SupervisorEvent::new(SupervisorEventKind::AppStarted {
        app: app.clone(),
        forced,
        reason,
    })
}

fn killed_event(app: &AppId, forced: bool, reason: ActionReason) -> SupervisorEvent {
    SupervisorEvent::new(SupervisorEventKind::AppKilled {
        app: app.clone(),
        forced,
        reason,
    })
}
