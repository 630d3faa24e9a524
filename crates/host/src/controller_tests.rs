// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use fh_api::{ApiError, CheckpointUpload};
use fh_core::error::BoxedError;
use fh_core::{CheckpointCommand, FakeClock, PendingEvent};
use serde_json::json;
use std::collections::VecDeque;

/// Interpreter scripted with the pending-event sets to report after each
/// successive start/resume call.
#[derive(Default)]
struct ScriptedInterpreter {
    script: Mutex<VecDeque<Result<Vec<PendingEvent>, String>>>,
    pending: Mutex<Vec<PendingEvent>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedInterpreter {
    fn with_script(script: Vec<Result<Vec<PendingEvent>, String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    fn step(&self, call: String) -> Result<(), BoxedError> {
        self.calls.lock().push(call);
        match self.script.lock().pop_front().unwrap_or(Ok(Vec::new())) {
            Ok(events) => {
                *self.pending.lock() = events;
                Ok(())
            }
            Err(msg) => Err(msg.into()),
        }
    }
}

#[async_trait]
impl Interpreter for Arc<ScriptedInterpreter> {
    async fn start(&self, _request: RunRequest) -> Result<(), BoxedError> {
        self.step("start".to_string())
    }

    async fn resume(&self, event: &str, _request: RunRequest) -> Result<(), BoxedError> {
        self.step(format!("resume:{}", event))
    }

    async fn pending_events(&self) -> Vec<PendingEvent> {
        self.pending.lock().clone()
    }

    async fn variables(&self) -> Map<String, Value> {
        [("stepCount".to_string(), json!(1))].into_iter().collect()
    }
}

#[derive(Default)]
struct RecordingApi {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ProcessApiClient for RecordingApi {
    async fn update_status(
        &self,
        _: InstanceId,
        _: &AgentId,
        status: ProcessStatus,
    ) -> Result<(), ApiError> {
        self.calls.lock().push(format!("status:{:?}", status));
        Ok(())
    }

    async fn upload_checkpoint(
        &self,
        _: InstanceId,
        upload: CheckpointUpload,
    ) -> Result<(), ApiError> {
        self.calls.lock().push(format!("checkpoint:{}", upload.checkpoint_id));
        Ok(())
    }

    async fn ping(&self, _: InstanceId) -> Result<(), ApiError> {
        Ok(())
    }
}

#[derive(Clone)]
struct NoKill;

impl FatalHook for NoKill {
    fn terminate(&self, _reason: &str) {}
}

struct Fixture {
    _dir: tempfile::TempDir,
    paths: HostPaths,
    api: Arc<RecordingApi>,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let paths = HostPaths::new(dir.path());
    std::fs::write(paths.instance_id_file(), InstanceId::new().to_string()).unwrap();
    std::fs::write(
        paths.configuration_file(),
        r#"{"entryPoint": "main", "sessionToken": "tok"}"#,
    )
    .unwrap();
    Fixture { _dir: dir, paths, api: Arc::new(RecordingApi::default()) }
}

fn controller(
    fx: &Fixture,
    interpreter: Arc<ScriptedInterpreter>,
) -> ExecutionLifecycleController<Arc<ScriptedInterpreter>, FakeClock, NoKill> {
    let api = fx.api.clone();
    ExecutionLifecycleController::new(
        fx.paths.clone(),
        interpreter,
        Box::new(move |_token| Ok(api.clone() as Arc<dyn ProcessApiClient>)),
        AgentId::new("agent-1"),
        HostTuning::default(),
        FakeClock::new(),
        NoKill,
    )
}

fn checkpoint_event(id: &str, name: &str) -> PendingEvent {
    PendingEvent::checkpoint(
        format!("checkpoint_{}", id),
        CheckpointCommand {
            checkpoint_id: id.to_string(),
            correlation_id: "corr".to_string(),
            checkpoint_name: name.to_string(),
        },
    )
}

#[tokio::test]
async fn fresh_start_with_suspend_event_exits_zero_and_keeps_state() {
    let fx = fixture();
    let interp = ScriptedInterpreter::with_script(vec![Ok(vec![PendingEvent::suspend("formWait")])]);
    let code = controller(&fx, interp.clone()).run_to_exit_code().await;

    assert_eq!(code, 0);
    assert_eq!(*interp.calls.lock(), vec!["start"]);
    assert_eq!(
        markers::read_suspend_events(&fx.paths.state_dir()).unwrap(),
        vec!["formWait"]
    );
    assert_eq!(markers::read_resume_events(&fx.paths.state_dir()).unwrap(), Vec::<String>::new());
    assert!(fx.paths.state_dir().exists());
    assert_eq!(
        *fx.api.calls.lock(),
        vec!["status:Running", "status:Suspended"]
    );
}

#[tokio::test]
async fn resume_with_no_pending_events_removes_state_dir() {
    let fx = fixture();
    markers::write_resume_marker(&fx.paths.state_dir(), "formWait").unwrap();
    let interp = ScriptedInterpreter::with_script(vec![Ok(vec![])]);

    let code = controller(&fx, interp.clone()).run_to_exit_code().await;

    assert_eq!(code, 0);
    assert_eq!(*interp.calls.lock(), vec!["resume:formWait"]);
    assert!(!fx.paths.state_dir().exists());
    assert_eq!(
        *fx.api.calls.lock(),
        vec!["status:Running", "status:Finished"]
    );
}

#[tokio::test]
async fn checkpoint_event_loops_without_external_input() {
    let fx = fixture();
    let interp = ScriptedInterpreter::with_script(vec![
        Ok(vec![checkpoint_event("c1", "cp1")]),
        Ok(vec![]),
    ]);

    let code = controller(&fx, interp.clone()).run_to_exit_code().await;

    assert_eq!(code, 0);
    assert_eq!(*interp.calls.lock(), vec!["start", "resume:checkpoint_c1"]);
    assert_eq!(
        *fx.api.calls.lock(),
        vec!["status:Running", "checkpoint:c1", "status:Finished"]
    );
}

#[tokio::test]
async fn ambiguous_resume_markers_fail_before_any_remote_call() {
    let fx = fixture();
    std::fs::create_dir_all(fx.paths.state_dir()).unwrap();
    std::fs::write(
        fx.paths.state_dir().join(crate::paths::RESUME_MARKER),
        "eventA\neventB\n",
    )
    .unwrap();
    let interp = ScriptedInterpreter::with_script(vec![]);

    let code = controller(&fx, interp.clone()).run_to_exit_code().await;

    assert_eq!(code, 1);
    assert!(interp.calls.lock().is_empty());
    assert!(fx.api.calls.lock().is_empty());

    let varstore = VariableStateStore::new(fx.paths.state_dir());
    let record = varstore.load_last_error().unwrap();
    assert_eq!(record.kind, "ambiguous-resume");
    // The interpreter never ran, so there is no snapshot to write
    assert!(varstore.load().is_none());
}

#[tokio::test]
async fn interpreter_failure_persists_diagnostics_and_exits_one() {
    let fx = fixture();
    std::fs::create_dir_all(fx.paths.attachments_dir()).unwrap();
    std::fs::write(fx.paths.out_values_file(), r#"{"existing": true}"#).unwrap();
    let interp =
        ScriptedInterpreter::with_script(vec![Err("flow blew up".to_string())]);

    let code = controller(&fx, interp).run_to_exit_code().await;

    assert_eq!(code, 1);
    let record = VariableStateStore::new(fx.paths.state_dir()).load_last_error().unwrap();
    assert_eq!(record.kind, "interpreter");
    assert_eq!(record.message, "flow blew up");

    let out: Map<String, Value> =
        serde_json::from_str(&std::fs::read_to_string(fx.paths.out_values_file()).unwrap())
            .unwrap();
    assert_eq!(out.get("existing"), Some(&json!(true)));
    assert_eq!(out.get("error").and_then(|e| e.get("kind")), Some(&json!("interpreter")));

    assert_eq!(
        *fx.api.calls.lock(),
        vec!["status:Running", "status:Failed"]
    );
}

#[tokio::test]
async fn second_host_cannot_lock_the_same_work_dir() {
    let fx = fixture();
    let first = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open({
            std::fs::create_dir_all(fx.paths.attachments_dir()).unwrap();
            fx.paths.lock_file()
        })
        .unwrap();
    fs2::FileExt::try_lock_exclusive(&first).unwrap();

    let interp = ScriptedInterpreter::with_script(vec![]);
    let code = controller(&fx, interp).run_to_exit_code().await;
    assert_eq!(code, 1);
    // The work dir belongs to the other host: no state or diagnostics written
    assert!(!fx.paths.state_dir().exists());
    assert!(fx.api.calls.lock().is_empty());
}
