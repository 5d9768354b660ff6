//! heartbeat-core — configuration model and probe identity.

pub mod config;
pub mod error;
pub mod identity;

pub use config::{AlertConfig, HeartbeatConfig, ProbeConfig, ProbeKind};
pub use error::{ConfigError, ConfigResult};
pub use identity::ProbeIdentity;
