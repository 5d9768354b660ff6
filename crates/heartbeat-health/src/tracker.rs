//! Per-probe state transitions and alert suppression.

use heartbeat_alert::AlertDispatcher;
use heartbeat_core::ProbeConfig;
use heartbeat_state::{ProbeState, ProbeStatus, StateStore};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::probe::ProbeResult;
use crate::template::expand_message;

/// Applies probe results to one probe's persisted state.
///
/// Borrows everything it touches; one machine is built per probe per run.
pub struct ProbeStateMachine<'a> {
    config: &'a ProbeConfig,
    store: &'a mut StateStore,
    alerts: &'a AlertDispatcher,
    clock: &'a dyn Clock,
}

impl<'a> ProbeStateMachine<'a> {
    pub fn new(
        config: &'a ProbeConfig,
        store: &'a mut StateStore,
        alerts: &'a AlertDispatcher,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            config,
            store,
            alerts,
            clock,
        }
    }

    /// Current state of this probe, created empty if never seen.
    pub fn state(&mut self) -> &ProbeState {
        self.store.entry(&self.config.identity)
    }

    /// Route a probe result. Returns the alert message sent, if any.
    pub async fn record(&mut self, result: ProbeResult) -> Option<String> {
        match result {
            ProbeResult::Healthy => self.record_pass().await,
            ProbeResult::Unhealthy | ProbeResult::Failed => self.record_fail().await,
        }
    }

    /// The probe passed.
    ///
    /// A failing probe recovers: the up-message is rendered from the state
    /// as it was while failing and sent before anything is reset.
    pub async fn record_pass(&mut self) -> Option<String> {
        let config = self.config;

        let mut sent = None;
        if self.store.entry(&config.identity).is_failing() {
            let message = self.render(&config.up_message);
            info!(probe = %config.name, "probe recovered");
            self.alerts.notify(&message).await;
            sent = Some(message);
        }

        let now = self.clock.now_formatted();
        let state = self.store.entry(&config.identity);
        if !state.is_passing() {
            state.state = Some(ProbeStatus::Passing);
            state.first_pass_time = Some(now.clone());
        }
        state.last_pass_time = Some(now);
        state.last_fail_alert_time = Some(0.0);
        state.fail_count = Some(0);
        state.name = Some(config.name.clone());

        sent
    }

    /// The probe failed.
    ///
    /// Failures up to `ignore_fail_count` are counted but otherwise
    /// absorbed. Past that the probe is failing, and a down-message goes out
    /// unless one was sent within the alert period.
    pub async fn record_fail(&mut self) -> Option<String> {
        let config = self.config;
        let now = self.clock.now_formatted();

        let state = self.store.entry(&config.identity);
        state.fail_count = Some(state.fail_count().saturating_add(1));
        state.name = Some(config.name.clone());
        let fail_count = state.fail_count();

        let mut sent = None;
        if fail_count > config.ignore_fail_count {
            if !state.is_failing() {
                state.state = Some(ProbeStatus::Failing);
                state.first_fail_time = Some(now.clone());
                warn!(probe = %config.name, fail_count, "probe is failing");
            }

            let epoch = self.clock.now_epoch();
            let elapsed = epoch - state.last_fail_alert_time();
            if elapsed >= config.alert_period_secs() {
                state.last_fail_alert_time = Some(epoch);
                let message = self.render(&config.down_message);
                self.alerts.notify(&message).await;
                sent = Some(message);
            } else {
                debug!(
                    probe = %config.name,
                    elapsed_secs = elapsed,
                    period_secs = config.alert_period_secs(),
                    "down alert suppressed"
                );
            }
        } else {
            debug!(
                probe = %config.name,
                fail_count,
                ignore_fail_count = config.ignore_fail_count,
                "failure absorbed"
            );
        }

        self.store.entry(&config.identity).last_fail_time = Some(now);
        sent
    }

    /// Expand `template` against config fields overlaid by state fields.
    fn render(&mut self, template: &str) -> String {
        let mut table = self.config.fields.clone();
        table.extend(self.store.entry(&self.config.identity).to_fields());
        expand_message(template, &table)
    }
}
