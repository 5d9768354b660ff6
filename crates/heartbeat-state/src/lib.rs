//! heartbeat-state — persisted per-probe history.
//!
//! The state file is a single JSON object mapping each probe identity to
//! its [`ProbeState`]. It is loaded once at startup (a missing or corrupt
//! file yields an empty store), mutated in memory while probes run, and
//! written back once with write-to-temp + rename.
//!
//! # Layout
//!
//! ```text
//! {
//!   "<sha256 of probe config>": {
//!     "state": "failing",
//!     "fail_count": 3,
//!     "last_pass_time": "06/02 14:05",
//!     "last_fail_alert_time": 1717337100.5,
//!     "name": "db",
//!     ...
//!   }
//! }
//! ```
//!
//! Concurrent invocations are serialized by [`StateLock`], an advisory lock
//! on a sibling `.lock` file held across load → mutate → save.

pub mod error;
pub mod lock;
pub mod store;
pub mod types;

pub use error::{StateError, StateResult};
pub use lock::StateLock;
pub use store::StateStore;
pub use types::*;
