// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Suspend and resume marker files.
//!
//! The markers live in the state directory and carry event names, one per
//! line. Within one host invocation markers are cleared before a new
//! start/resume call and written only after that call returns, so a stale
//! and a fresh marker never coexist.

use fh_core::HostError;
use std::path::Path;

use crate::paths::{RESUME_MARKER, SUSPEND_MARKER};

/// Read the distinct event names recorded in a marker file.
fn read_events(path: &Path) -> Result<Vec<String>, HostError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)?;
    let mut events: Vec<String> = Vec::new();
    for line in raw.lines() {
        let name = line.trim();
        if !name.is_empty() && !events.iter().any(|e| e == name) {
            events.push(name.to_string());
        }
    }
    Ok(events)
}

/// Resume events currently recorded for this instance.
pub fn read_resume_events(state_dir: &Path) -> Result<Vec<String>, HostError> {
    read_events(&state_dir.join(RESUME_MARKER))
}

/// Suspend events the instance is awaiting.
pub fn read_suspend_events(state_dir: &Path) -> Result<Vec<String>, HostError> {
    read_events(&state_dir.join(SUSPEND_MARKER))
}

/// The single resume event to honor this invocation.
///
/// Zero markers means a fresh start. More than one distinct event name is a
/// configuration inconsistency: the host must fail fast rather than guess.
pub fn single_resume_event(state_dir: &Path) -> Result<Option<String>, HostError> {
    let mut events = read_resume_events(state_dir)?;
    match events.len() {
        0 => Ok(None),
        1 => Ok(events.pop()),
        _ => Err(HostError::AmbiguousResume(events)),
    }
}

/// Record the event the next invocation must resume with.
pub fn write_resume_marker(state_dir: &Path, event: &str) -> Result<(), HostError> {
    std::fs::create_dir_all(state_dir)?;
    std::fs::write(state_dir.join(RESUME_MARKER), format!("{}\n", event))?;
    Ok(())
}

/// Record the events the suspended instance awaits.
pub fn write_suspend_marker(state_dir: &Path, events: &[String]) -> Result<(), HostError> {
    std::fs::create_dir_all(state_dir)?;
    let mut contents = events.join("\n");
    contents.push('\n');
    std::fs::write(state_dir.join(SUSPEND_MARKER), contents)?;
    Ok(())
}

/// Delete both markers. Missing files are fine.
pub fn clear_markers(state_dir: &Path) -> Result<(), HostError> {
    for name in [RESUME_MARKER, SUSPEND_MARKER] {
        match std::fs::remove_file(state_dir.join(name)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// True if either marker exists (test observation point).
pub fn any_marker(state_dir: &Path) -> bool {
    state_dir.join(RESUME_MARKER).exists() || state_dir.join(SUSPEND_MARKER).exists()
}

#[cfg(test)]
#[path = "markers_tests.rs"]
mod tests;
