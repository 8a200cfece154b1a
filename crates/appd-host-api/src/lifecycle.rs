//! Lifecycle command lines understood by the Android shell

use appd_util::AppId;

/// Operation mode granting mock locations to GPS services
pub const MOCK_LOCATION_OP: &str = "android:mock_location";

/// Mode for `appops set`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppOpsMode {
    Allow,
    Deny,
}

impl AppOpsMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AppOpsMode::Allow => "allow",
            AppOpsMode::Deny => "deny",
        }
    }
}

pub fn pm_enable(package: &str) -> String {
    format!("pm enable {}", package)
}

pub fn pm_grant(package: &str, permission: &str) -> String {
    format!("pm grant {} {}", package, permission)
}

/// `appops set`, run with an empty `LD_LIBRARY_PATH`
pub fn appops_set(package: &str, op: &str, mode: AppOpsMode) -> String {
    format!("LD_LIBRARY_PATH= appops set {} {} {}", package, op, mode.as_str())
}

/// `am startservice` for service-style apps, `am start -n` otherwise
pub fn am_start(app: &AppId, service: bool) -> String {
    if service {
        format!("am startservice {}", app.component())
    } else {
        format!("am start -n {}", app.component())
    }
}

pub fn pkill(package: &str) -> String {
    format!("pkill {}", package)
}
