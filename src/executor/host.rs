//! Host Executor
//!
//! Runs the storage tools as child processes on the local host.

use super::render_command;
use crate::domain::ports::CommandExecutor;
use crate::error::ExecutionError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Spawns real processes, bounded by a caller-level timeout
///
/// The child is killed if the timeout elapses; no retry is attempted.
#[derive(Debug, Clone)]
pub struct HostExecutor {
    timeout: Duration,
}

impl HostExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl CommandExecutor for HostExecutor {
    async fn output(&self, program: &str, args: &[String]) -> Result<Vec<u8>, ExecutionError> {
        let command = render_command(program, args);
        debug!("Running {}", command);

        let mut child = Command::new(program);
        child
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, child.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => return Err(ExecutionError::Start { command, source }),
            Err(_) => {
                warn!("{} timed out after {:?}", command, self.timeout);
                return Err(ExecutionError::Timeout {
                    command,
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            debug!("{} exited with {:?}: {}", command, output.status.code(), stderr.trim());
            return Err(ExecutionError::Failed {
                command,
                status: output.status.code(),
                stderr,
            });
        }

        Ok(output.stdout)
    }
}
