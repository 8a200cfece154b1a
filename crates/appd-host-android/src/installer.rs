//! Package install/update through the package manager

use appd_host_api::{dispatch, CommandExecutor, PackageInstaller};
use appd_util::AppId;
use shell_escape::unix::escape;
use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::UpdateManifest;

pub fn dumpsys_package(package: &str) -> String {
    format!("dumpsys package {}", package)
}

pub fn pm_install(apk: &Path) -> String {
    let apk = apk.to_string_lossy();
    format!("pm install -r {}", escape(Cow::Borrowed(apk.as_ref())))
}

pub fn pm_uninstall(package: &str) -> String {
    format!("pm uninstall {}", package)
}

/// First `versionName=` value in `dumpsys package` output
pub fn parse_version_name(dumpsys: &str) -> Option<String> {
    dumpsys
        .lines()
        .filter_map(|line| line.trim().strip_prefix("versionName="))
        .map(str::trim)
        .find(|version| !version.is_empty())
        .map(str::to_string)
}

/// Installer backed by the Android package manager and an optional update
/// manifest. Without a manifest no remote version is known and nothing can
/// be installed.
pub struct AndroidInstaller {
    executor: Arc<dyn CommandExecutor>,
    manifest: Option<UpdateManifest>,
}

impl AndroidInstaller {
    pub fn new(executor: Arc<dyn CommandExecutor>, manifest: Option<UpdateManifest>) -> Self {
        Self { executor, manifest }
    }
}

impl PackageInstaller for AndroidInstaller {
    fn local_version(&self, app: &AppId) -> Option<String> {
        let command = dumpsys_package(app.package());
        match self.executor.execute(&command) {
            Ok(result) if result.is_success() => {
                let version = parse_version_name(&result.output);
                debug!(app = %app, version = ?version, "Local version");
                version
            }
            Ok(result) => {
                debug!(app = %app, code = ?result.code, "Package not found");
                None
            }
            Err(e) => {
                warn!(app = %app, error = %e, "Failed to query package");
                None
            }
        }
    }

    fn remote_version(&self, app: &AppId) -> Option<String> {
        self.manifest
            .as_ref()?
            .get(app.package())
            .map(|entry| entry.version.clone())
    }

    fn update_app(&self, app: &AppId) {
        let Some(entry) = self
            .manifest
            .as_ref()
            .and_then(|manifest| manifest.get(app.package()))
        else {
            warn!(app = %app, "No update available for app");
            return;
        };

        info!(app = %app, version = %entry.version, apk = %entry.apk.display(), "Installing app");
        dispatch(self.executor.as_ref(), &pm_install(&entry.apk));
    }

    fn uninstall_app(&self, app: &AppId) {
        if self.local_version(app).is_none() {
            return;
        }
        info!(app = %app, "Uninstalling app");
        dispatch(self.executor.as_ref(), &pm_uninstall(app.package()));
    }
}
