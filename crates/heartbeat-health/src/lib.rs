//! heartbeat-health — probe execution and the per-probe alert state machine.
//!
//! A [`Probe`] reports pass or fail for one configured check. The result is
//! fed to a [`ProbeStateMachine`], which updates the probe's persisted
//! [`ProbeState`](heartbeat_state::ProbeState) and decides whether an alert
//! goes out now, later, or never.
//!
//! ```text
//! before    result  effect
//! ───────── ─────── ──────────────────────────────────────────────
//! failing   pass    up-message sent, then as below
//! any       pass    state = passing, fail_count = 0
//! any       fail    fail_count += 1; once past ignore_fail_count:
//!                   state = failing, down-message if the alert
//!                   period has elapsed since the previous one
//! ```

pub mod clock;
pub mod error;
pub mod http;
pub mod probe;
pub mod shell;
pub mod tcp;
pub mod template;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CheckResult, ProbeError};
pub use probe::{build_probe, run_probe, Probe, ProbeOutcome, ProbeResult};
pub use template::{expand_message, render_value};
pub use tracker::ProbeStateMachine;
