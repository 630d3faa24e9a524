// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host error taxonomy and the persisted last-error record.
//!
//! Inner components return typed errors and never decide the process exit
//! code; only the lifecycle controller maps a `HostError` to an exit status.
//! The one sanctioned exception is the heartbeat monitor's sustained-liveness
//! kill switch.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use thiserror::Error;

/// Boxed error type carried inside `HostError` variants that wrap an
/// external collaborator's failure.
pub type BoxedError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum HostError {
    /// More than one distinct resume event is pending. The host must not
    /// guess which to honor.
    #[error("ambiguous resume state: {0:?} events pending, expected exactly one")]
    AmbiguousResume(Vec<String>),

    /// Process configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A remote call failed after retries were exhausted.
    #[error("remote call '{call}' failed: {source}")]
    Remote {
        call: &'static str,
        #[source]
        source: BoxedError,
    },

    /// Building or uploading a checkpoint archive failed.
    #[error("checkpoint {checkpoint_id} failed: {source}")]
    Checkpoint {
        checkpoint_id: String,
        #[source]
        source: BoxedError,
    },

    /// The step interpreter reported a failure from start/resume.
    #[error("interpreter error: {0}")]
    Interpreter(#[source] BoxedError),

    /// Another host process holds the state directory lock.
    #[error("state directory is locked by another process: {0}")]
    StateLocked(#[source] std::io::Error),

    #[error("state i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HostError {
    pub fn interpreter(source: impl Into<BoxedError>) -> Self {
        Self::Interpreter(source.into())
    }

    /// Short classification used in the persisted last-error record.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AmbiguousResume(_) => "ambiguous-resume",
            Self::Config(_) => "config",
            Self::Remote { .. } => "remote",
            Self::Checkpoint { .. } => "checkpoint",
            Self::Interpreter(_) => "interpreter",
            Self::StateLocked(_) => "state-locked",
            Self::Io(_) => "io",
            Self::Json(_) => "serialization",
        }
    }
}

/// Walk the `source` chain to the most specific cause.
///
/// Replaces the original's unwrap-wrapper-by-wrapper cascade: every error in
/// this codebase carries its cause as a `source`, so one traversal suffices.
pub fn root_cause<'a>(err: &'a (dyn StdError + 'static)) -> &'a (dyn StdError + 'static) {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current
}

/// Serialized record of the last unhandled error, persisted independently of
/// the variable snapshot so operators can inspect fatal failures even when
/// variable serialization itself fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LastErrorRecord {
    /// Short classification, e.g. "checkpoint" or "remote".
    pub kind: String,
    /// Message of the most specific cause.
    pub message: String,
    /// Outermost-to-innermost rendering of the full cause chain.
    pub chain: Vec<String>,
    /// Epoch milliseconds at capture time.
    pub at_ms: u64,
}

impl LastErrorRecord {
    /// Capture an error and its full cause chain.
    pub fn capture(kind: &str, err: &(dyn StdError + 'static), at_ms: u64) -> Self {
        let mut chain = vec![err.to_string()];
        let mut current = err;
        while let Some(next) = current.source() {
            chain.push(next.to_string());
            current = next;
        }
        Self {
            kind: kind.to_string(),
            message: current.to_string(),
            chain,
            at_ms,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
