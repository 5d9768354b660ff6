//! Wall-clock access for the state machine.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local, Utc};
use heartbeat_core::config::DEFAULT_TIME_FORMAT;

/// Time source: epoch seconds for alert cadence, formatted text for the
/// `*_time` state fields.
pub trait Clock: Send + Sync {
    fn now_epoch(&self) -> f64;
    fn now_formatted(&self) -> String;
}

/// Render `time` with `format`, falling back to the default format if the
/// pattern is rejected at render time.
fn format_time<Tz>(time: &DateTime<Tz>, format: &str) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    if write!(out, "{}", time.format(format)).is_ok() {
        return out;
    }
    time.format(DEFAULT_TIME_FORMAT).to_string()
}

/// The real clock. Formatted times use the local time zone.
#[derive(Debug, Clone)]
pub struct SystemClock {
    format: String,
}

impl SystemClock {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_FORMAT)
    }
}

impl Clock for SystemClock {
    fn now_epoch(&self) -> f64 {
        let now = Utc::now();
        now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
    }

    fn now_formatted(&self) -> String {
        format_time(&Local::now(), &self.format)
    }
}

/// A clock that only moves when told to. Formatted times are UTC.
#[derive(Debug)]
pub struct ManualClock {
    epoch_bits: AtomicU64,
    format: String,
}

impl ManualClock {
    pub fn new(epoch: f64) -> Self {
        Self::with_format(epoch, DEFAULT_TIME_FORMAT)
    }

    pub fn with_format(epoch: f64, format: impl Into<String>) -> Self {
        Self {
            epoch_bits: AtomicU64::new(epoch.to_bits()),
            format: format.into(),
        }
    }

    pub fn set(&self, epoch: f64) {
        self.epoch_bits.store(epoch.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, secs: f64) {
        self.set(self.now_epoch() + secs);
    }
}

impl Clock for ManualClock {
    fn now_epoch(&self) -> f64 {
        f64::from_bits(self.epoch_bits.load(Ordering::SeqCst))
    }

    fn now_formatted(&self) -> String {
        let epoch = self.now_epoch();
        let secs = epoch.floor() as i64;
        let nanos = ((epoch - epoch.floor()) * 1e9) as u32;
        match DateTime::<Utc>::from_timestamp(secs, nanos) {
            Some(time) => format_time(&time, &self.format),
            None => String::new(),
        }
    }
}
