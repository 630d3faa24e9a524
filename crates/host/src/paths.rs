// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem layout of one process working directory.
//!
//! All paths are relative to the working directory handed to the host by
//! the external launcher. The state directory is owned exclusively by this
//! host process for the lifetime of one instance.

use std::path::{Path, PathBuf};

/// Plain-text instance id, written by the launcher, polled by the host.
pub const INSTANCE_ID_FILE: &str = "_instance_id";
/// The process configuration document.
pub const CONFIGURATION_FILE: &str = "_process.json";
/// System files shipped with the process (policy, dependency lists).
pub const SYSTEM_DIR: &str = "_system";
/// Optional policy document inside the system directory.
pub const POLICY_FILE: &str = "policy.json";
/// Attachments visible to flows and uploaded with checkpoints.
pub const ATTACHMENTS_DIR: &str = "_attachments";
/// Host-owned execution state, inside the attachments directory.
pub const STATE_DIR: &str = "_state";
/// Resume marker: the single event name to resume with.
pub const RESUME_MARKER: &str = "_resume";
/// Suspend marker: event names the suspended instance awaits, one per line.
pub const SUSPEND_MARKER: &str = "_suspend";
/// Last variable snapshot.
pub const LAST_KNOWN_VARIABLES_FILE: &str = "_last_known_variables.json";
/// Last unhandled error record.
pub const LAST_ERROR_FILE: &str = "_last_error.json";
/// Transient checkpoint archives, inside the attachments directory.
pub const CHECKPOINTS_DIR: &str = "checkpoints";
/// Best-effort output variables document.
pub const OUT_VALUES_FILE: &str = "out.json";
/// Advisory lock guarding single-writer ownership of the working dir.
pub const LOCK_FILE: &str = ".fhost.lock";

/// Resolved paths for one working directory.
#[derive(Debug, Clone)]
pub struct HostPaths {
    work_dir: PathBuf,
}

impl HostPaths {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self { work_dir: work_dir.into() }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn instance_id_file(&self) -> PathBuf {
        self.work_dir.join(INSTANCE_ID_FILE)
    }

    pub fn configuration_file(&self) -> PathBuf {
        self.work_dir.join(CONFIGURATION_FILE)
    }

    pub fn system_dir(&self) -> PathBuf {
        self.work_dir.join(SYSTEM_DIR)
    }

    pub fn policy_file(&self) -> PathBuf {
        self.system_dir().join(POLICY_FILE)
    }

    pub fn attachments_dir(&self) -> PathBuf {
        self.work_dir.join(ATTACHMENTS_DIR)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.attachments_dir().join(STATE_DIR)
    }

    pub fn checkpoints_dir(&self) -> PathBuf {
        self.attachments_dir().join(CHECKPOINTS_DIR)
    }

    pub fn out_values_file(&self) -> PathBuf {
        self.attachments_dir().join(OUT_VALUES_FILE)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.attachments_dir().join(LOCK_FILE)
    }
}
