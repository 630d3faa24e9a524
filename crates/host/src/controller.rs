// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The execution lifecycle controller.
//!
//! Resolves instance identity, boots configuration and policy, opens the
//! remote session and heartbeat, then runs the start/resume/checkpoint
//! control loop. The controller is the only place that maps errors to a
//! process exit code; everything below it returns typed errors.

use fh_api::{ProcessApiClient, ProcessStatus};
use fh_core::{
    root_cause, AgentId, Clock, HostError, InstanceId, LastErrorRecord, PolicyDocument,
    ProcessConfiguration,
};
use fs2::FileExt;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::checkpoint::CheckpointManager;
use crate::heartbeat::{FatalHook, HeartbeatConfig, HeartbeatMonitor};
use crate::identity;
use crate::interpreter::{Interpreter, RunRequest};
use crate::markers;
use crate::paths::HostPaths;
use crate::varstore::VariableStateStore;

/// Opens a remote client bound to the configuration's session credential.
pub type ApiFactory =
    Box<dyn Fn(&str) -> Result<Arc<dyn ProcessApiClient>, HostError> + Send + Sync>;

/// Host timing knobs with production default values.
#[derive(Debug, Clone)]
pub struct HostTuning {
    /// Delay between instance id poll attempts.
    pub poll_delay: Duration,
    pub heartbeat: HeartbeatConfig,
    /// Defaults merged under the configured arguments before first use;
    /// explicit configuration values always win.
    pub default_arguments: Map<String, Value>,
}

impl Default for HostTuning {
    fn default() -> Self {
        Self {
            poll_delay: Duration::from_millis(250),
            heartbeat: HeartbeatConfig::default(),
            default_arguments: Map::new(),
        }
    }
}

pub struct ExecutionLifecycleController<I, C, H> {
    paths: HostPaths,
    interpreter: I,
    open_api: ApiFactory,
    agent_id: AgentId,
    tuning: HostTuning,
    clock: C,
    fatal_hook: H,
    /// Remote session once opened, kept for best-effort failure reporting.
    session: Mutex<Option<(InstanceId, Arc<dyn ProcessApiClient>)>>,
    /// Set once the interpreter has been handed this invocation; a snapshot
    /// is only valid after that point.
    invoked: AtomicBool,
}

impl<I, C, H> ExecutionLifecycleController<I, C, H>
where
    I: Interpreter,
    C: Clock,
    H: FatalHook + Clone,
{
    pub fn new(
        paths: HostPaths,
        interpreter: I,
        open_api: ApiFactory,
        agent_id: AgentId,
        tuning: HostTuning,
        clock: C,
        fatal_hook: H,
    ) -> Self {
        Self {
            paths,
            interpreter,
            open_api,
            agent_id,
            tuning,
            clock,
            fatal_hook,
            session: Mutex::new(None),
            invoked: AtomicBool::new(false),
        }
    }

    /// Run the host to completion and map the outcome to a process exit
    /// code: 0 on clean suspension/termination, 1 on any unhandled error.
    pub async fn run_to_exit_code(&self) -> i32 {
        match self.run().await {
            Ok(()) => 0,
            Err(err) => {
                self.handle_fatal(&err).await;
                1
            }
        }
    }

    pub async fn run(&self) -> Result<(), HostError> {
        let _lock = self.acquire_lock()?;

        let instance_id =
            identity::resolve_instance_id(&self.paths.instance_id_file(), self.tuning.poll_delay)
                .await;
        info!(instance_id = %instance_id, work_dir = %self.paths.work_dir().display(), "host starting");

        // Fail fast on inconsistent resume state before any remote call
        markers::single_resume_event(&self.paths.state_dir())?;

        let policy = PolicyDocument::load_or_empty(&self.paths.policy_file())?;
        if !policy.is_empty() {
            info!("policy document loaded");
        }
        let mut config = ProcessConfiguration::load(&self.paths.configuration_file())?;
        config.apply_default_arguments(&self.tuning.default_arguments);

        let api = (self.open_api)(&config.session_token)?;
        *self.session.lock() = Some((instance_id, api.clone()));

        let heartbeat = HeartbeatMonitor::start(
            api.clone(),
            instance_id,
            self.tuning.heartbeat,
            self.fatal_hook.clone(),
        );

        let result = self.drive(instance_id, &config, &policy, api.as_ref()).await;
        heartbeat.stop().await;
        result
    }

    async fn drive(
        &self,
        instance_id: InstanceId,
        config: &ProcessConfiguration,
        policy: &PolicyDocument,
        api: &dyn ProcessApiClient,
    ) -> Result<(), HostError> {
        api.update_status(instance_id, &self.agent_id, ProcessStatus::Running)
            .await
            .map_err(|e| HostError::Remote { call: "update_status", source: Box::new(e) })?;

        let state_dir = self.paths.state_dir();
        let varstore = VariableStateStore::new(&state_dir);
        let checkpoints = CheckpointManager::new(api, instance_id);

        // Configured arguments are one-shot: once a checkpoint restarts the
        // loop they must not be replayed.
        let mut arguments = config.arguments.clone();

        loop {
            let resume = markers::single_resume_event(&state_dir)?;
            markers::clear_markers(&state_dir)?;

            match &resume {
                None => {
                    let variables = varstore.load_with_error_overlay();
                    let request = RunRequest::build(
                        instance_id,
                        self.paths.work_dir(),
                        config,
                        policy,
                        arguments.clone(),
                        variables,
                    );
                    info!(entry_point = %config.entry_point, "starting flow");
                    self.invoked.store(true, Ordering::Relaxed);
                    self.interpreter.start(request).await.map_err(HostError::Interpreter)?;
                }
                Some(event) => {
                    let request = RunRequest::build(
                        instance_id,
                        self.paths.work_dir(),
                        config,
                        policy,
                        arguments.clone(),
                        None,
                    );
                    info!(event = %event, "resuming flow");
                    self.invoked.store(true, Ordering::Relaxed);
                    self.interpreter
                        .resume(event, request)
                        .await
                        .map_err(HostError::Interpreter)?;
                }
            }

            varstore.save(&self.interpreter.variables().await)?;
            let events = self.interpreter.pending_events().await;

            // A checkpoint request is an internal transition: handle it and
            // loop again without waiting for an external event.
            if let Some((event_name, command)) =
                events.iter().find_map(|e| e.checkpoint_command().map(|c| (e.name.clone(), c)))
            {
                checkpoints.process(&command, &event_name, &self.paths).await?;
                arguments = Map::new();
                continue;
            }

            if events.is_empty() {
                remove_state_dir(&state_dir)?;
                if let Err(e) =
                    api.update_status(instance_id, &self.agent_id, ProcessStatus::Finished).await
                {
                    warn!(%e, "could not report finished status");
                }
                info!("process finished, no further state to track");
            } else {
                let names: Vec<String> = events.into_iter().map(|e| e.name).collect();
                markers::write_suspend_marker(&state_dir, &names)?;
                if let Err(e) =
                    api.update_status(instance_id, &self.agent_id, ProcessStatus::Suspended).await
                {
                    warn!(%e, "could not report suspended status");
                }
                info!(events = ?names, "process suspended, awaiting external events");
            }
            return Ok(());
        }
    }

    /// Best-effort diagnostics on the single higher-priority failure path:
    /// nothing here may crash the process.
    async fn handle_fatal(&self, err: &HostError) {
        let cause = root_cause(err);
        error!(%err, %cause, "unhandled host error");

        // Another host owns this work dir and its state; leave both alone.
        if matches!(err, HostError::StateLocked(_)) {
            return;
        }

        let record = LastErrorRecord::capture(err.kind(), err, self.clock.epoch_ms());
        let varstore = VariableStateStore::new(self.paths.state_dir());
        // The snapshot is written after every interpreter stop, unhandled
        // errors included. A failure before the interpreter ran has no
        // snapshot to offer and must not clobber the previous one.
        if self.invoked.load(Ordering::Relaxed) {
            if let Err(e) = varstore.save(&self.interpreter.variables().await) {
                warn!(%e, "could not persist variable snapshot");
            }
        }
        if let Err(e) = varstore.record_last_error(&record) {
            warn!(%e, "could not persist last error record");
        }
        if let Err(e) = self.fold_error_into_out_values(&record) {
            warn!(%e, "could not amend output variables with error");
        }
        let session = self.session.lock().clone();
        if let Some((instance_id, api)) = session {
            if let Err(e) =
                api.update_status(instance_id, &self.agent_id, ProcessStatus::Failed).await
            {
                warn!(%e, "could not report failed status");
            }
        }
    }

    /// Fold an `error` entry into the output-variables document, keeping
    /// whatever was already persisted there.
    fn fold_error_into_out_values(&self, record: &LastErrorRecord) -> Result<(), HostError> {
        let path = self.paths.out_values_file();
        let mut out: Map<String, Value> = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => Map::new(),
        };
        out.insert("error".to_string(), serde_json::to_value(record)?);
        std::fs::create_dir_all(self.paths.attachments_dir())?;
        std::fs::write(&path, serde_json::to_vec_pretty(&out)?)?;
        Ok(())
    }

    fn acquire_lock(&self) -> Result<File, HostError> {
        std::fs::create_dir_all(self.paths.attachments_dir())?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.paths.lock_file())?;
        file.try_lock_exclusive().map_err(HostError::StateLocked)?;
        Ok(file)
    }
}

/// Remove the state directory entirely; already-gone is fine.
fn remove_state_dir(state_dir: &std::path::Path) -> Result<(), HostError> {
    match std::fs::remove_dir_all(state_dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
