//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while reading or validating `heartbeat.yaml`.
///
/// Every variant is fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{location}: unknown kind '{kind}'")]
    UnknownKind { location: String, kind: String },

    #[error("{location}: entry does not name a kind")]
    EmptyEntry { location: String },

    #[error("{location}: {source}")]
    Field {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{location}: {message}")]
    Invalid { location: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(location: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            location: location.into(),
            message: message.into(),
        }
    }
}
