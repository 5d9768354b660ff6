//! Shell command alerts.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{AlertError, AlertResult};
use crate::Notifier;

/// Placeholder replaced by the alert text inside the command.
pub const MESSAGE_PLACEHOLDER: &str = "$message";

/// Environment variable carrying the unmodified alert text.
pub const MESSAGE_ENV: &str = "HEARTBEAT_MESSAGE";

const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs a configured command through `sh -c` for each alert.
///
/// `$message` in the command is replaced textually, without quoting. The
/// same text is also exported as `HEARTBEAT_MESSAGE` for commands that
/// would rather quote it themselves.
#[derive(Debug, Clone)]
pub struct ShellNotifier {
    command: String,
    timeout: Duration,
}

impl ShellNotifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The command line that will run for `message`.
    pub fn render(&self, message: &str) -> String {
        self.command.replace(MESSAGE_PLACEHOLDER, message)
    }
}

#[async_trait]
impl Notifier for ShellNotifier {
    fn kind(&self) -> &'static str {
        "shell"
    }

    async fn send(&self, message: &str) -> AlertResult<()> {
        let command = self.render(message);
        debug!(%command, "running alert command");

        let mut child = Command::new("sh");
        child
            .arg("-c")
            .arg(&command)
            .env(MESSAGE_ENV, message)
            .kill_on_drop(true);

        let status = tokio::time::timeout(self.timeout, child.status())
            .await
            .map_err(|_| AlertError::Timeout(self.timeout))?
            .map_err(AlertError::Spawn)?;

        if status.success() {
            Ok(())
        } else {
            Err(AlertError::CommandFailed(status))
        }
    }
}
