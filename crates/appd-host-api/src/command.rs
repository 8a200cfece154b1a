//! Command results and best-effort dispatch

use appd_util::{truncate_tail, MAX_FAILURE_OUTPUT};
use tracing::{debug, warn};

use crate::CommandExecutor;

/// Result of one shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the command was killed by a signal
    pub code: Option<i32>,

    /// Combined stdout and stderr
    pub output: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            output: String::new(),
        }
    }

    pub fn with_code(code: i32, output: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            output: output.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run a command and record a failure event instead of returning an error.
///
/// Returns whether the command succeeded. Callers never retry or roll back on
/// failure.
pub fn dispatch(executor: &dyn CommandExecutor, command: &str) -> bool {
    match executor.execute(command) {
        Ok(result) if result.is_success() => {
            debug!(cmd = %command, "Command succeeded");
            true
        }
        Ok(result) => {
            warn!(
                cmd = %command,
                output = %truncate_tail(&result.output, MAX_FAILURE_OUTPUT),
                returncode = ?result.code,
                "running failed"
            );
            false
        }
        Err(e) => {
            warn!(cmd = %command, error = %e, "running failed");
            false
        }
    }
}
