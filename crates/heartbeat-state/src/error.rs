//! Error types for the heartbeat state file.

use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while persisting probe state.
///
/// There is no read variant: an unreadable state file loads as empty.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("lock error: {0}")]
    Lock(String),
}
