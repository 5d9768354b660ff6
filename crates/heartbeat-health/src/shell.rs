//! Shell command probe.

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{CheckResult, ProbeError};
use crate::probe::Probe;

/// Passes when `sh -c <command>` exits with status 0.
///
/// The child is killed if the check is dropped, so a timed-out command does
/// not outlive the run.
#[derive(Debug, Clone)]
pub struct ShellProbe {
    command: String,
}

impl ShellProbe {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl Probe for ShellProbe {
    fn target(&self) -> &str {
        &self.command
    }

    async fn check(&self) -> CheckResult<String> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .kill_on_drop(true)
            .status()
            .await?;

        if status.success() {
            Ok("OK".into())
        } else {
            Err(ProbeError::Exit(status))
        }
    }
}
