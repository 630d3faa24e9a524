// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability interface of the external step interpreter.
//!
//! The host never inspects workflow graphs; it only starts, resumes, and
//! asks what the interpreter is waiting on. State continuity across resume
//! calls is the interpreter's own concern.

use async_trait::async_trait;
use fh_core::error::BoxedError;
use fh_core::{InstanceId, PendingEvent, PolicyDocument, ProcessConfiguration};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// One start/resume invocation's inputs.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub instance_id: InstanceId,
    pub work_dir: PathBuf,
    pub entry_point: String,
    pub arguments: Map<String, Value>,
    /// Last-known variable snapshot; `None` on resume, where the
    /// interpreter owns state continuity.
    pub variables: Option<Map<String, Value>>,
    /// Policy constraints the interpreter must honor; empty means none.
    pub policy: PolicyDocument,
}

impl RunRequest {
    /// Assemble the argument map the interpreter sees: configured arguments
    /// plus instance id, working directory, output expressions, and
    /// process/project metadata.
    pub fn build(
        instance_id: InstanceId,
        work_dir: &Path,
        config: &ProcessConfiguration,
        policy: &PolicyDocument,
        arguments: Map<String, Value>,
        variables: Option<Map<String, Value>>,
    ) -> Self {
        let mut arguments = arguments;
        arguments.insert("instanceId".to_string(), Value::String(instance_id.to_string()));
        arguments.insert(
            "workDir".to_string(),
            Value::String(work_dir.display().to_string()),
        );
        arguments.insert(
            "outExpressions".to_string(),
            Value::Array(config.out_expressions.iter().cloned().map(Value::String).collect()),
        );
        arguments.insert(
            "processInfo".to_string(),
            Value::Object(config.meta.process_info.clone()),
        );
        arguments.insert(
            "projectInfo".to_string(),
            Value::Object(config.meta.project_info.clone()),
        );
        Self {
            instance_id,
            work_dir: work_dir.to_path_buf(),
            entry_point: config.entry_point.clone(),
            arguments,
            variables,
            policy: policy.clone(),
        }
    }
}

/// What the host needs from the step-execution engine.
#[async_trait]
pub trait Interpreter: Send + Sync {
    /// Begin executing the flow at the request's entry point.
    async fn start(&self, request: RunRequest) -> Result<(), BoxedError>;

    /// Resume a suspended flow with the named event.
    async fn resume(&self, event: &str, request: RunRequest) -> Result<(), BoxedError>;

    /// Events the interpreter is currently suspended on.
    async fn pending_events(&self) -> Vec<PendingEvent>;

    /// Snapshot of the current workflow variables.
    async fn variables(&self) -> Map<String, Value>;
}

/// Placeholder interpreter for wiring and smoke runs: completes any entry
/// point immediately with no pending events.
#[derive(Debug, Default, Clone)]
pub struct NullInterpreter;

#[async_trait]
impl Interpreter for NullInterpreter {
    async fn start(&self, _request: RunRequest) -> Result<(), BoxedError> {
        Ok(())
    }

    async fn resume(&self, _event: &str, _request: RunRequest) -> Result<(), BoxedError> {
        Ok(())
    }

    async fn pending_events(&self) -> Vec<PendingEvent> {
        Vec::new()
    }

    async fn variables(&self) -> Map<String, Value> {
        Map::new()
    }
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod tests;
