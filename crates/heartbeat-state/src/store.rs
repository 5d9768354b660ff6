//! StateStore — the in-memory view of the state file.
//!
//! Holds one [`ProbeState`] per probe identity. Lookups auto-create empty
//! entries so a probe seen for the first time simply starts with no
//! history. Entries for probes that are no longer configured are kept.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use heartbeat_core::ProbeIdentity;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{StateError, StateResult};
use crate::types::ProbeState;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident, $path:expr) => {
        |e| StateError::$variant(format!("{}: {}", $path.display(), e))
    };
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Mapping of probe identity to persisted state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateStore {
    /// Backing file; `None` for an in-memory store.
    path: Option<PathBuf>,
    probes: BTreeMap<ProbeIdentity, ProbeState>,
}

impl StateStore {
    /// Load the state file at `path`.
    ///
    /// Never fails: a missing file, unreadable file, or malformed document
    /// yields an empty store, and malformed entries are dropped one by one.
    pub fn load(path: &Path) -> Self {
        let probes = match fs::read_to_string(path) {
            Ok(content) => parse_document(path, &content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(?path, "no state file, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                warn!(?path, error = %e, "state file unreadable, starting empty");
                BTreeMap::new()
            }
        };
        debug!(?path, probes = probes.len(), "state loaded");
        Self {
            path: Some(path.to_path_buf()),
            probes,
        }
    }

    /// Create an ephemeral store that is never written to disk.
    pub fn open_in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // ── Access ─────────────────────────────────────────────────────

    /// Mutable state for `id`, created empty if absent.
    pub fn entry(&mut self, id: &ProbeIdentity) -> &mut ProbeState {
        self.probes.entry(id.clone()).or_default()
    }

    /// State for `id` without creating it.
    pub fn probe(&self, id: &ProbeIdentity) -> Option<&ProbeState> {
        self.probes.get(id)
    }

    /// Field `key` of probe `id`, or `default` when the field is unset.
    pub fn get(&mut self, id: &ProbeIdentity, key: &str, default: Value) -> Value {
        self.entry(id).get(key).unwrap_or(default)
    }

    /// Assign field `key` of probe `id`.
    pub fn set(&mut self, id: &ProbeIdentity, key: &str, value: Value) -> StateResult<()> {
        self.entry(id).set(key, value)
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    // ── Persistence ────────────────────────────────────────────────

    /// Write the store back to the file it was loaded from.
    pub fn save(&self) -> StateResult<()> {
        match &self.path {
            Some(path) => self.save_to(path),
            None => Ok(()),
        }
    }

    /// Atomically replace `path` with the serialized store.
    ///
    /// The document is written to a sibling temp file, synced, then renamed
    /// over `path`, so a crash leaves either the old or the new file intact.
    pub fn save_to(&self, path: &Path) -> StateResult<()> {
        let json = serde_json::to_vec_pretty(&self.probes).map_err(map_err!(Serialize))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(map_err!(Write, parent))?;
        }

        let tmp_path = sibling_path(path, ".tmp");
        let written = write_synced(&tmp_path, &json);
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(StateError::Write(format!("{}: {e}", tmp_path.display())));
        }
        fs::rename(&tmp_path, path).map_err(map_err!(Write, path))?;

        // Best-effort fsync of the directory to persist the rename.
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        debug!(?path, probes = self.probes.len(), "state saved");
        Ok(())
    }
}

/// `path` with `suffix` appended to its file name.
pub(crate) fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn parse_document(path: &Path, content: &str) -> BTreeMap<ProbeIdentity, ProbeState> {
    let document: Map<String, Value> = match serde_json::from_str(content) {
        Ok(document) => document,
        Err(e) => {
            warn!(?path, error = %e, "state file is not a JSON object, starting empty");
            return BTreeMap::new();
        }
    };

    let mut probes = BTreeMap::new();
    for (id, value) in document {
        match serde_json::from_value::<ProbeState>(value) {
            Ok(state) => {
                probes.insert(ProbeIdentity::from(id), state);
            }
            Err(e) => warn!(?path, probe = %id, error = %e, "dropping malformed state entry"),
        }
    }
    probes
}
