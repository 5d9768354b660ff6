//! The probe capability and its timeout wrapper.

use std::time::Duration;

use async_trait::async_trait;
use heartbeat_core::{ProbeConfig, ProbeKind};
use tracing::debug;

use crate::error::{CheckResult, ProbeError};
use crate::http::HttpProbe;
use crate::shell::ShellProbe;
use crate::tcp::TcpProbe;

/// Result of a single probe execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// The check passed.
    Healthy,
    /// The target answered, but not with the expected result.
    Unhealthy,
    /// The check could not be carried out (connection error, timeout).
    Failed,
}

impl ProbeResult {
    pub fn is_pass(&self) -> bool {
        *self == ProbeResult::Healthy
    }
}

/// A health check against one target.
#[async_trait]
pub trait Probe: Send + Sync {
    /// What is being checked, as shown on the progress line.
    fn target(&self) -> &str;

    /// Run the check once. `Ok` carries a short detail such as `200 OK`.
    async fn check(&self) -> CheckResult<String>;
}

/// Outcome of [`run_probe`]: the result plus the progress-line detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub result: ProbeResult,
    pub detail: String,
}

/// Build the probe for a configured test.
pub fn build_probe(config: &ProbeConfig) -> Box<dyn Probe> {
    match &config.kind {
        ProbeKind::Shell { command } => Box::new(ShellProbe::new(command.clone())),
        ProbeKind::Tcp { host, port } => Box::new(TcpProbe::new(host.clone(), *port)),
        ProbeKind::Http { url, headers } => {
            Box::new(HttpProbe::new(url.clone(), headers.clone(), config.timeout_or_default()))
        }
    }
}

/// Run `probe` bounded by `timeout`. Never fails: errors become outcomes.
pub async fn run_probe(probe: &dyn Probe, timeout: Duration) -> ProbeOutcome {
    let checked = match tokio::time::timeout(timeout, probe.check()).await {
        Ok(checked) => checked,
        Err(_) => Err(ProbeError::Timeout(timeout)),
    };

    match checked {
        Ok(detail) => ProbeOutcome {
            result: ProbeResult::Healthy,
            detail,
        },
        Err(e) => {
            debug!(probe = %probe.target(), error = %e, "probe check failed");
            ProbeOutcome {
                result: e.result(),
                detail: e.to_string(),
            }
        }
    }
}
