//! Shell command execution

use appd_host_api::{CommandExecutor, CommandOutput, HostError, HostResult};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// Default shell on the device
pub const DEFAULT_SHELL: &str = "/system/bin/sh";

/// Runs each command through `<shell> -c`, blocking until it exits
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: PathBuf,
}

impl ShellExecutor {
    pub fn new(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Device shell if present, otherwise `sh` from `PATH`
    pub fn detect() -> Self {
        let device = PathBuf::from(DEFAULT_SHELL);
        if device.exists() {
            Self::new(device)
        } else {
            Self::new("sh")
        }
    }

    pub fn shell(&self) -> &PathBuf {
        &self.shell
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::detect()
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(&self, command: &str) -> HostResult<CommandOutput> {
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                HostError::SpawnFailed(format!(
                    "Failed to run {} -c {:?}: {}",
                    self.shell.display(),
                    command,
                    e
                ))
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        // None when killed by a signal
        let code = output.status.code();
        debug!(cmd = %command, code = ?code, "Command finished");

        Ok(CommandOutput {
            code,
            output: combined,
        })
    }
}
