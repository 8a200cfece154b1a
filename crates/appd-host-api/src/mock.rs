//! Mock collaborators for unit/integration testing

use appd_api::TelemetrySample;
use appd_util::AppId;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::{
    CommandExecutor, CommandOutput, HostError, HostResult, PackageInstaller, ParamStore,
    ParamsMarker, TelemetrySource,
};

/// Mock command executor that records every command it is given
#[derive(Default)]
pub struct MockExecutor {
    commands: Mutex<Vec<String>>,
    responses: Mutex<Vec<(String, String)>>,
    fail: Mutex<bool>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every command exit with code 1
    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// Output returned for commands starting with `prefix`
    pub fn set_response(&self, prefix: impl Into<String>, output: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push((prefix.into(), output.into()));
    }

    /// All commands executed so far
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Drain the recorded commands
    pub fn take_commands(&self) -> Vec<String> {
        std::mem::take(&mut *self.commands.lock().unwrap())
    }
}

impl CommandExecutor for MockExecutor {
    fn execute(&self, command: &str) -> HostResult<CommandOutput> {
        self.commands.lock().unwrap().push(command.to_string());

        if *self.fail.lock().unwrap() {
            return Ok(CommandOutput::with_code(1, "Error: mock failure"));
        }

        let output = self
            .responses
            .lock()
            .unwrap()
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default();

        Ok(CommandOutput {
            code: Some(0),
            output,
        })
    }
}

/// In-memory parameter store; every write bumps the modification marker
#[derive(Default)]
pub struct MemoryParams {
    values: Mutex<HashMap<String, String>>,
    generation: AtomicU64,
    fail_writes: Mutex<bool>,
}

impl MemoryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    /// External write, as another process would make it
    pub fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }
}

impl ParamStore for MemoryParams {
    fn get(&self, key: &str) -> Option<String> {
        self.value(key)
    }

    fn put(&self, key: &str, value: &str) -> HostResult<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(HostError::Params(format!("Mock write failure for {}", key)));
        }
        self.set(key, value);
        Ok(())
    }

    fn last_modified(&self) -> Option<ParamsMarker> {
        Some(ParamsMarker::from_raw(
            self.generation.load(Ordering::SeqCst) as u128,
        ))
    }
}

/// Mock installer backed by version tables
#[derive(Default)]
pub struct MockInstaller {
    local: Mutex<HashMap<String, String>>,
    remote: Mutex<HashMap<String, String>>,
    updated: Mutex<Vec<String>>,
    uninstalled: Mutex<Vec<String>>,
}

impl MockInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_installed(self, package: &str, version: &str) -> Self {
        self.local
            .lock()
            .unwrap()
            .insert(package.to_string(), version.to_string());
        self
    }

    pub fn with_remote(self, package: &str, version: &str) -> Self {
        self.remote
            .lock()
            .unwrap()
            .insert(package.to_string(), version.to_string());
        self
    }

    /// Packages passed to `update_app`, in call order
    pub fn updated(&self) -> Vec<String> {
        self.updated.lock().unwrap().clone()
    }

    /// Packages passed to `uninstall_app`, in call order
    pub fn uninstalled(&self) -> Vec<String> {
        self.uninstalled.lock().unwrap().clone()
    }
}

impl PackageInstaller for MockInstaller {
    fn local_version(&self, app: &AppId) -> Option<String> {
        self.local.lock().unwrap().get(app.package()).cloned()
    }

    fn remote_version(&self, app: &AppId) -> Option<String> {
        self.remote.lock().unwrap().get(app.package()).cloned()
    }

    fn update_app(&self, app: &AppId) {
        self.updated.lock().unwrap().push(app.package().to_string());
    }

    fn uninstall_app(&self, app: &AppId) {
        self.uninstalled
            .lock()
            .unwrap()
            .push(app.package().to_string());
    }
}

/// Telemetry source that replays a fixed script of samples
#[derive(Debug, Default)]
pub struct ScriptedTelemetry {
    samples: VecDeque<TelemetrySample>,
}

impl ScriptedTelemetry {
    pub fn new(samples: impl IntoIterator<Item = TelemetrySample>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
        }
    }

    pub fn push(&mut self, sample: TelemetrySample) {
        self.samples.push_back(sample);
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

#[async_trait]
impl TelemetrySource for ScriptedTelemetry {
    async fn recv(&mut self) -> Option<TelemetrySample> {
        self.samples.pop_front()
    }
}
