//! Per-application record

use appd_api::{AppCategory, Direction, ManualControl};
use appd_config::{AppSpec, InstallPolicy};
use appd_host_api::lifecycle::{self, AppOpsMode, MOCK_LOCATION_OP};
use appd_host_api::{dispatch, CommandExecutor, PackageInstaller, ParamStore};
use appd_util::AppId;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Collaborators shared by every app record
#[derive(Clone)]
pub struct HostServices {
    pub params: Arc<dyn ParamStore>,
    pub executor: Arc<dyn CommandExecutor>,
    pub installer: Arc<dyn PackageInstaller>,
}

/// Lifecycle state of one supervised application
///
/// `running` is the last commanded state, not something observed on the
/// device. It changes only through [`AppRecord::run`], [`AppRecord::kill`]
/// and [`AppRecord::consume_override`].
pub struct AppRecord {
    spec: AppSpec,
    params: Arc<dyn ParamStore>,
    executor: Arc<dyn CommandExecutor>,
    enabled: bool,
    last_enabled: bool,
    installed: bool,
    auto_run_eligible: bool,
    running: bool,
    manual_override: ManualControl,
    overridden_this_session: bool,
}

impl AppRecord {
    /// Build the record, installing/updating or uninstalling the package
    /// according to its enable flag and the install policy.
    ///
    /// Runs once per app per process lifetime.
    pub fn new(spec: AppSpec, install: &InstallPolicy, services: &HostServices) -> Self {
        let params = services.params.as_ref();
        let installer = services.installer.as_ref();

        let enabled = read_enabled(params, spec.enable_param.as_deref());
        let mut installed = false;
        let mut auto_run_eligible = false;

        if enabled {
            let local = installer.local_version(&spec.id);
            installed = local.is_some();

            if install.online {
                let remote = match &local {
                    Some(_) if install.auto_update => installer.remote_version(&spec.id),
                    _ => local.clone(),
                };
                let outdated = matches!((&local, &remote), (Some(l), Some(r)) if l != r);
                if local.is_none() || outdated {
                    info!(
                        app = %spec.id,
                        local = ?local,
                        remote = ?remote,
                        "Updating app"
                    );
                    installer.update_app(&spec.id);
                }
            }

            if installed {
                grant_permissions(services.executor.as_ref(), &spec);
            }

            auto_run_eligible = installed
                && match spec.auto_run_param.as_deref() {
                    None => true,
                    Some(key) => read_enabled(params, Some(key)),
                };
        } else {
            info!(app = %spec.id, "App disabled, uninstalling");
            installer.uninstall_app(&spec.id);
        }

        if let Some(key) = spec.manual_ctrl_param.as_deref() {
            put_param(params, key, ManualControl::Idle.as_param());
        }

        debug!(
            app = %spec.id,
            category = %spec.category,
            enabled,
            installed,
            auto_run_eligible,
            "App record created"
        );

        Self {
            spec,
            params: services.params.clone(),
            executor: services.executor.clone(),
            enabled,
            last_enabled: false,
            installed,
            auto_run_eligible,
            running: false,
            manual_override: ManualControl::Idle,
            overridden_this_session: false,
        }
    }

    pub fn id(&self) -> &AppId {
        &self.spec.id
    }

    pub fn category(&self) -> AppCategory {
        self.spec.category
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// `enabled` as it was before the most recent refresh
    pub fn last_enabled(&self) -> bool {
        self.last_enabled
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub fn is_auto_run_eligible(&self) -> bool {
        self.auto_run_eligible
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn manual_override(&self) -> ManualControl {
        self.manual_override
    }

    pub fn overridden_this_session(&self) -> bool {
        self.overridden_this_session
    }

    /// Re-read the enable flag and the manual control request
    pub fn refresh(&mut self) {
        let params = self.params.as_ref();
        self.last_enabled = self.enabled;
        self.enabled = read_enabled(params, self.spec.enable_param.as_deref());
        self.manual_override = match self.spec.manual_ctrl_param.as_deref() {
            Some(key) => ManualControl::from_param(params.get(key).as_deref()),
            None => ManualControl::Idle,
        };

        if self.enabled != self.last_enabled {
            info!(app = %self.spec.id, enabled = self.enabled, "App enablement changed");
        }
    }

    /// Acknowledge a pending manual control request.
    ///
    /// Clears the request and returns the direction it asked for; the caller
    /// dispatches it with `force`. For installed apps the request is also
    /// cleared in the store, the app is marked overridden for the rest of the
    /// session, and `running` is set opposite to the request so the forced
    /// dispatch is never skipped.
    pub fn consume_override(&mut self) -> Option<Direction> {
        let direction = self.manual_override.direction()?;
        self.manual_override = ManualControl::Idle;

        if self.installed {
            if let Some(key) = self.spec.manual_ctrl_param.as_deref() {
                put_param(self.params.as_ref(), key, ManualControl::Idle.as_param());
            }
            self.overridden_this_session = true;
            self.running = direction == Direction::Kill;
        }

        info!(app = %self.spec.id, direction = ?direction, "Manual control request");
        Some(direction)
    }

    /// Start the app unless it is already running. Returns whether start
    /// commands were dispatched.
    ///
    /// `running` ends up true even when nothing was dispatched, including for
    /// apps that are not installed.
    pub fn run(&mut self, force: bool) -> bool {
        let dispatched = self.installed && (force || self.enabled) && (force || !self.running);

        if dispatched {
            let rules = self.spec.category.rules();
            let package = self.spec.id.package();
            let executor = self.executor.as_ref();

            info!(app = %self.spec.id, force, "Starting app");
            dispatch(executor, &lifecycle::pm_enable(package));
            if rules.mock_location {
                dispatch(
                    executor,
                    &lifecycle::appops_set(package, MOCK_LOCATION_OP, AppOpsMode::Allow),
                );
            }
            dispatch(executor, &lifecycle::am_start(&self.spec.id, rules.service_start));
        }

        self.running = true;
        dispatched
    }

    /// Stop the app if it is running. Returns whether kill commands were
    /// dispatched.
    pub fn kill(&mut self, force: bool) -> bool {
        if !(self.installed && (force || self.enabled) && (force || self.running)) {
            return false;
        }

        let package = self.spec.id.package();
        let executor = self.executor.as_ref();

        info!(app = %self.spec.id, force, "Killing app");
        if self.spec.category.rules().mock_location {
            dispatch(
                executor,
                &lifecycle::appops_set(package, MOCK_LOCATION_OP, AppOpsMode::Deny),
            );
        }
        dispatch(executor, &lifecycle::pkill(package));

        self.running = false;
        true
    }

    /// Forget a manual override at a session edge
    pub fn end_session(&mut self) {
        self.overridden_this_session = false;
    }
}

impl std::fmt::Debug for AppRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppRecord")
            .field("id", &self.spec.id)
            .field("category", &self.spec.category)
            .field("enabled", &self.enabled)
            .field("installed", &self.installed)
            .field("running", &self.running)
            .field("manual_override", &self.manual_override)
            .field("overridden_this_session", &self.overridden_this_session)
            .finish()
    }
}

/// A key reads as enabled only when its value is `"1"`; no key means enabled
fn read_enabled(params: &dyn ParamStore, key: Option<&str>) -> bool {
    match key {
        None => true,
        Some(key) => params.get(key).as_deref().map(str::trim) == Some("1"),
    }
}

fn put_param(params: &dyn ParamStore, key: &str, value: &str) {
    if let Err(e) = params.put(key, value) {
        warn!(key, value, error = %e, "Failed to write parameter");
    }
}

fn grant_permissions(executor: &dyn CommandExecutor, spec: &AppSpec) {
    let package = spec.id.package();
    for permission in &spec.permissions {
        dispatch(executor, &lifecycle::pm_grant(package, permission));
    }
    for op in &spec.app_ops {
        dispatch(executor, &lifecycle::appops_set(package, op, AppOpsMode::Allow));
    }
}
