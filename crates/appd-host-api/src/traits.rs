//! Collaborator traits

use appd_api::TelemetrySample;
use appd_util::AppId;
use async_trait::async_trait;
use thiserror::Error;

use crate::CommandOutput;

/// Errors from host collaborator operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Parameter store error: {0}")]
    Params(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Executes shell-level lifecycle commands on the host
///
/// A non-zero exit is not an error: it is reported through
/// [`CommandOutput::code`]. `Err` is reserved for commands that could not be
/// run at all.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command: &str) -> HostResult<CommandOutput>;
}

/// Opaque store-wide modification marker
///
/// Only equality is meaningful: a different marker means the store may have
/// changed since it was last read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamsMarker(u128);

impl ParamsMarker {
    pub fn from_raw(raw: u128) -> Self {
        Self(raw)
    }
}

/// String key/value parameter store shared with the rest of the vehicle stack
pub trait ParamStore: Send + Sync {
    /// Read a value. Missing or unreadable keys read as `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value
    fn put(&self, key: &str, value: &str) -> HostResult<()>;

    /// Current modification marker, `None` if the store cannot be inspected
    fn last_modified(&self) -> Option<ParamsMarker>;
}

/// Package install/update collaborator, consulted only while building app records
///
/// Implementations report failures by returning `None` and logging; they
/// never propagate errors into the supervisor.
pub trait PackageInstaller: Send + Sync {
    /// Installed version, `None` if not installed
    fn local_version(&self, app: &AppId) -> Option<String>;

    /// Latest available version, `None` if unknown
    fn remote_version(&self, app: &AppId) -> Option<String>;

    /// Install or update the package
    fn update_app(&self, app: &AppId);

    /// Remove the package
    fn uninstall_app(&self, app: &AppId);
}

/// Source of periodic telemetry samples
#[async_trait]
pub trait TelemetrySource: Send {
    /// Wait for the next sample. `None` means the source is gone.
    async fn recv(&mut self) -> Option<TelemetrySample>;
}
