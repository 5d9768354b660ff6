//! Alert delivery error types.

use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for alert delivery.
pub type AlertResult<T> = Result<T, AlertError>;

/// Errors a single alert channel can report.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("failed to run alert command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("alert command failed with {0}")]
    CommandFailed(ExitStatus),

    #[error("alert command timed out after {0:?}")]
    Timeout(Duration),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sms gateway returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build email: {0}")]
    Email(String),

    #[error("smtp error: {0}")]
    Smtp(String),
}
