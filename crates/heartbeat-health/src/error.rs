//! Probe failure reasons.

use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::probe::ProbeResult;

/// Result type alias for a single probe check.
pub type CheckResult<T> = Result<T, ProbeError>;

/// Why a probe did not pass. Every variant is a failure outcome.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Exit(ExitStatus),

    #[error("{}", format_status(*status, reason))]
    Status { status: u16, reason: String },

    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },
}

fn format_status(status: u16, reason: &str) -> String {
    if reason.is_empty() {
        status.to_string()
    } else {
        format!("{status} {reason}")
    }
}

impl ProbeError {
    /// `Unhealthy` when the target answered badly, `Failed` when the check
    /// could not complete.
    pub fn result(&self) -> ProbeResult {
        match self {
            ProbeError::Exit(_) | ProbeError::Status { .. } => ProbeResult::Unhealthy,
            _ => ProbeResult::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_matches_progress_format() {
        let err = ProbeError::Status {
            status: 503,
            reason: "Service Unavailable".into(),
        };
        assert_eq!(err.to_string(), "503 Service Unavailable");
        assert_eq!(err.result(), ProbeResult::Unhealthy);

        let bare = ProbeError::Status {
            status: 599,
            reason: String::new(),
        };
        assert_eq!(bare.to_string(), "599");
    }

    #[test]
    fn timeout_is_a_failed_check() {
        let err = ProbeError::Timeout(Duration::from_secs(10));
        assert_eq!(err.result(), ProbeResult::Failed);
    }
}
