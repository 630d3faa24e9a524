// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending events returned by the step interpreter.
//!
//! After every start/resume call the interpreter reports the set of events
//! it is waiting on. A checkpoint request is a pending event whose payload
//! carries a checkpoint command; everything else is a generic suspend event
//! awaiting external input.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One event the interpreter is suspended on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEvent {
    /// Event name; resume calls address events by this name.
    pub name: String,
    /// Opaque interpreter payload.
    #[serde(default)]
    pub payload: Value,
}

impl PendingEvent {
    pub fn suspend(name: impl Into<String>) -> Self {
        Self { name: name.into(), payload: Value::Null }
    }

    pub fn checkpoint(name: impl Into<String>, command: CheckpointCommand) -> Self {
        Self {
            name: name.into(),
            // Serialization of a plain struct into a JSON object cannot fail
            payload: serde_json::to_value(&command).unwrap_or(Value::Null),
        }
    }

    /// Extract a checkpoint command if this event requests one.
    pub fn checkpoint_command(&self) -> Option<CheckpointCommand> {
        serde_json::from_value(self.payload.clone()).ok()
    }
}

/// Payload of a checkpoint-request event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointCommand {
    pub checkpoint_id: String,
    pub correlation_id: String,
    pub checkpoint_name: String,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
