//! The run loop.

use std::path::{Path, PathBuf};

use heartbeat_alert::AlertDispatcher;
use heartbeat_core::{HeartbeatConfig, ProbeIdentity};
use heartbeat_health::{build_probe, run_probe, Clock, ProbeResult, ProbeStateMachine, SystemClock};
use heartbeat_state::{StateLock, StateStore};
use tracing::{debug, info};

use crate::error::HeartbeatResult;

/// What happened to one probe during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub name: String,
    pub identity: ProbeIdentity,
    pub result: ProbeResult,
    /// The progress line printed for this probe.
    pub line: String,
    /// Alert message sent for this probe, if any.
    pub alert: Option<String>,
}

/// Per-probe reports of a completed run, in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub probes: Vec<ProbeReport>,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.probes.iter().filter(|p| p.result.is_pass()).count()
    }

    pub fn failed(&self) -> usize {
        self.probes.len() - self.passed()
    }

    pub fn alerts(&self) -> impl Iterator<Item = &str> {
        self.probes.iter().filter_map(|p| p.alert.as_deref())
    }
}

/// `<identity> <kind> <name>` for every configured probe.
pub fn config_report(config: &HeartbeatConfig) -> Vec<String> {
    config
        .tests
        .iter()
        .map(|test| format!("{} {} {}", test.identity, test.kind.label(), test.name))
        .collect()
}

/// A configured heartbeat bound to its state file.
pub struct Heartbeat {
    config: HeartbeatConfig,
    state_path: PathBuf,
    alerts: AlertDispatcher,
    clock: Box<dyn Clock>,
    quiet: bool,
}

impl Heartbeat {
    /// Build the alert channels from `config`. Times use its `time_format`.
    pub fn new(config: HeartbeatConfig, state_path: impl Into<PathBuf>) -> HeartbeatResult<Self> {
        let alerts = AlertDispatcher::from_configs(&config.alerts)?;
        let clock = Box::new(SystemClock::new(config.time_format.clone()));
        Ok(Self {
            config,
            state_path: state_path.into(),
            alerts,
            clock,
            quiet: false,
        })
    }

    pub fn from_file(config_path: &Path, state_path: impl Into<PathBuf>) -> HeartbeatResult<Self> {
        Self::new(HeartbeatConfig::from_file(config_path)?, state_path)
    }

    /// Replace the configured alert channels.
    pub fn with_alerts(mut self, alerts: AlertDispatcher) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Suppress progress lines on stdout.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn config(&self) -> &HeartbeatConfig {
        &self.config
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Probe everything once and persist the resulting state.
    ///
    /// Probe and alert failures are part of the summary. Only lock and save
    /// errors fail the run.
    pub async fn run(&self) -> HeartbeatResult<RunSummary> {
        let mut lock = StateLock::open(&self.state_path)?;
        let _guard = lock.acquire()?;

        let mut store = StateStore::load(&self.state_path);
        let mut summary = RunSummary::default();

        for test in &self.config.tests {
            let probe = build_probe(test);
            let outcome = run_probe(probe.as_ref(), test.timeout_or_default()).await;
            let line = format!("{} {}", probe.target(), outcome.detail);
            if !self.quiet {
                println!("{line}");
            }
            debug!(probe = %test.name, result = ?outcome.result, "probe finished");

            let alert = ProbeStateMachine::new(test, &mut store, &self.alerts, self.clock.as_ref())
                .record(outcome.result)
                .await;

            summary.probes.push(ProbeReport {
                name: test.name.clone(),
                identity: test.identity.clone(),
                result: outcome.result,
                line,
                alert,
            });
        }

        store.save()?;
        info!(
            passed = summary.passed(),
            failed = summary.failed(),
            alerts = summary.alerts().count(),
            "run complete"
        );
        Ok(summary)
    }
}
