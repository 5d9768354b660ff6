//! Fatal run errors.

use heartbeat_alert::AlertError;
use heartbeat_core::ConfigError;
use heartbeat_state::StateError;
use thiserror::Error;

pub type HeartbeatResult<T> = Result<T, HeartbeatError>;

/// Conditions that abort a run. Probe and notifier failures never do.
#[derive(Debug, Error)]
pub enum HeartbeatError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("failed to set up alert channel: {0}")]
    Alert(#[from] AlertError),
}
