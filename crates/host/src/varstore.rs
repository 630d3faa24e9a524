// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Variable snapshot and last-error persistence.
//!
//! The snapshot written here is the source of truth handed to the next
//! start call and to any forked child process. The last-error record is
//! persisted independently so operators can inspect fatal failures even
//! when variable serialization itself fails.

use fh_core::{HostError, LastErrorRecord};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::paths::{LAST_ERROR_FILE, LAST_KNOWN_VARIABLES_FILE};

/// Snapshot key under which the interpreter records its own unhandled error.
pub const LAST_ERROR_VAR: &str = "lastError";

/// Persists and restores the last-known variable snapshot.
pub struct VariableStateStore {
    state_dir: PathBuf,
}

impl VariableStateStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self { state_dir: state_dir.into() }
    }

    fn snapshot_path(&self) -> PathBuf {
        self.state_dir.join(LAST_KNOWN_VARIABLES_FILE)
    }

    fn last_error_path(&self) -> PathBuf {
        self.state_dir.join(LAST_ERROR_FILE)
    }

    /// Persist a variable snapshot, best-effort per entry.
    ///
    /// Entries that fail to serialize are logged by key and skipped; the
    /// snapshot file is still written with the serializable subset. The
    /// serde error names the offending path inside nested containers, so no
    /// separate recursive inspection pass is needed.
    pub fn save<'a, I, V>(&self, vars: I) -> Result<(), HostError>
    where
        I: IntoIterator<Item = (&'a String, &'a V)>,
        V: Serialize + 'a,
    {
        let mut snapshot = Map::new();
        for (key, value) in vars {
            match serde_json::to_value(value) {
                Ok(v) => {
                    snapshot.insert(key.clone(), v);
                }
                Err(err) => {
                    warn!(key = %key, %err, "variable is not serializable, dropped from snapshot");
                }
            }
        }
        std::fs::create_dir_all(&self.state_dir)?;
        std::fs::write(self.snapshot_path(), serde_json::to_vec_pretty(&snapshot)?)?;
        Ok(())
    }

    /// Load the last snapshot. Missing file means no snapshot; a corrupt
    /// file is logged and treated the same rather than aborting the host.
    pub fn load(&self) -> Option<Map<String, Value>> {
        let raw = match std::fs::read_to_string(self.snapshot_path()) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(%e, "cannot read variable snapshot, starting without one");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(map) => Some(map),
            Err(e) => {
                warn!(%e, "variable snapshot is corrupt, starting without one");
                None
            }
        }
    }

    /// Load the snapshot with the last-error overlay applied.
    ///
    /// An error value already present in the snapshot is never overwritten
    /// by the separately persisted record: the interpreter's own handling
    /// takes precedence.
    pub fn load_with_error_overlay(&self) -> Option<Map<String, Value>> {
        let mut snapshot = self.load()?;
        if !snapshot.contains_key(LAST_ERROR_VAR) {
            if let Some(record) = self.load_last_error() {
                debug!("overlaying persisted last error into snapshot");
                if let Ok(value) = serde_json::to_value(&record) {
                    snapshot.insert(LAST_ERROR_VAR.to_string(), value);
                }
            }
        }
        Some(snapshot)
    }

    /// Persist the last unhandled error.
    pub fn record_last_error(&self, record: &LastErrorRecord) -> Result<(), HostError> {
        std::fs::create_dir_all(&self.state_dir)?;
        std::fs::write(self.last_error_path(), serde_json::to_vec_pretty(record)?)?;
        Ok(())
    }

    pub fn load_last_error(&self) -> Option<LastErrorRecord> {
        let raw = std::fs::read_to_string(self.last_error_path()).ok()?;
        serde_json::from_str(&raw).ok()
    }
}

#[cfg(test)]
#[path = "varstore_tests.rs"]
mod tests;
