//! Advisory lock serializing concurrent heartbeat runs.
//!
//! The state file has no protection of its own against two writers, so a
//! run holds an exclusive lock on `<state file>.lock` from load to save.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fd_lock::{RwLock, RwLockWriteGuard};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::store::sibling_path;

/// Lock file guarding one state file.
pub struct StateLock {
    path: PathBuf,
    lock: RwLock<File>,
}

impl StateLock {
    /// Open (creating if needed) the lock file next to `state_path`.
    pub fn open(state_path: &Path) -> StateResult<Self> {
        let path = sibling_path(state_path, ".lock");
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| StateError::Lock(format!("{}: {e}", parent.display())))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| StateError::Lock(format!("{}: {e}", path.display())))?;
        Ok(Self {
            path,
            lock: RwLock::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until the lock is held exclusively.
    pub fn acquire(&mut self) -> StateResult<RwLockWriteGuard<'_, File>> {
        debug!(path = ?self.path, "acquiring state lock");
        let path = self.path.clone();
        self.lock
            .write()
            .map_err(|e| StateError::Lock(format!("{}: {e}", path.display())))
    }

    /// Take the lock if no other run holds it.
    pub fn try_acquire(&mut self) -> StateResult<Option<RwLockWriteGuard<'_, File>>> {
        let path = self.path.clone();
        match self.lock.try_write() {
            Ok(guard) => Ok(Some(guard)),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(StateError::Lock(format!("{}: {e}", path.display()))),
        }
    }
}
