//! heartbeat — one pass over every configured probe.
//!
//! [`Heartbeat::run`] takes the state lock, loads the state file, runs each
//! probe in configuration order, feeds the result through the probe's state
//! machine (which may send alerts), and saves the state before releasing
//! the lock.

pub mod error;
pub mod runner;

pub use error::{HeartbeatError, HeartbeatResult};
pub use runner::{config_report, Heartbeat, ProbeReport, RunSummary};
