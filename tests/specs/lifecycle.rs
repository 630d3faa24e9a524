// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host lifecycle specs: suspension, resume, restart cycles.

use crate::prelude::*;
use fh_core::PendingEvent;

#[tokio::test]
async fn fresh_instance_suspends_on_named_event() {
    let host = Host::new();
    let interp = FakeInterpreter::scripted([Ok(vec![PendingEvent::suspend("formWait")])]);

    let code = host.invoke(interp.clone()).await;

    assert_eq!(code, 0);
    assert_eq!(interp.call_kinds(), vec!["start"]);
    let (resume, suspend) = host.state_dir_markers();
    assert!(resume.is_empty());
    assert_eq!(suspend, vec!["formWait"]);
    assert!(host.paths.state_dir().exists(), "state dir is retained while suspended");
}

#[tokio::test]
async fn resumed_instance_with_no_pending_events_terminates_cleanly() {
    let host = Host::new();
    let first = FakeInterpreter::scripted([Ok(vec![PendingEvent::suspend("formWait")])]);
    assert_eq!(host.invoke(first).await, 0);

    host.deliver_event("formWait");

    let second = FakeInterpreter::scripted([Ok(vec![])]);
    assert_eq!(host.invoke(second.clone()).await, 0);

    assert_eq!(second.call_kinds(), vec!["resume:formWait"]);
    assert!(!host.paths.state_dir().exists(), "state dir removed on termination");
}

#[tokio::test]
async fn at_most_one_marker_exists_between_invocations() {
    let host = Host::new();

    let first = FakeInterpreter::scripted([Ok(vec![PendingEvent::suspend("a")])]);
    host.invoke(first).await;
    let (resume, suspend) = host.state_dir_markers();
    assert!(resume.is_empty() && !suspend.is_empty());

    host.deliver_event("a");
    let (resume, suspend) = host.state_dir_markers();
    assert!(!resume.is_empty() && suspend.is_empty());

    let second = FakeInterpreter::scripted([Ok(vec![PendingEvent::suspend("b")])]);
    host.invoke(second).await;
    let (resume, suspend) = host.state_dir_markers();
    assert!(resume.is_empty() && suspend == vec!["b"]);
}

#[tokio::test]
async fn control_loop_iterations_equal_checkpoints_plus_one() {
    let host = Host::new();
    let interp = FakeInterpreter::scripted([
        Ok(vec![checkpoint_event("c1", "first")]),
        Ok(vec![checkpoint_event("c2", "second")]),
        Ok(vec![checkpoint_event("c3", "third")]),
        Ok(vec![]),
    ]);

    let code = host.invoke(interp.clone()).await;

    assert_eq!(code, 0);
    assert_eq!(
        interp.call_kinds(),
        vec!["start", "resume:checkpoint_c1", "resume:checkpoint_c2", "resume:checkpoint_c3"]
    );
    assert_eq!(host.api.uploads.lock().len(), 3);
}

#[tokio::test]
async fn variable_snapshot_feeds_the_next_start() {
    let host = Host::new();
    let first = FakeInterpreter::scripted([Ok(vec![PendingEvent::suspend("wait")])]);
    *first.vars.lock() = [("count".to_string(), serde_json::json!(7))].into_iter().collect();
    host.invoke(first).await;

    // Supervisor clears all markers: next invocation is a fresh start that
    // must see the previous snapshot.
    fh_host::markers::clear_markers(&host.paths.state_dir()).unwrap();

    let second = FakeInterpreter::scripted([Ok(vec![])]);
    host.invoke(second.clone()).await;

    let calls = second.calls.lock();
    assert_eq!(calls[0].kind, "start");
    let variables = calls[0].variables.as_ref().unwrap();
    assert_eq!(variables.get("count"), Some(&serde_json::json!(7)));
}

#[tokio::test]
async fn failure_before_the_interpreter_runs_keeps_the_prior_snapshot() {
    let host = Host::new();
    let first = FakeInterpreter::scripted([Ok(vec![PendingEvent::suspend("wait")])]);
    *first.vars.lock() = [("count".to_string(), serde_json::json!(7))].into_iter().collect();
    host.invoke(first).await;

    // Corrupted resume marker: two distinct events
    std::fs::write(
        host.paths.state_dir().join(fh_host::paths::RESUME_MARKER),
        "eventA\neventB\n",
    )
    .unwrap();

    let second = FakeInterpreter::scripted([]);
    assert_eq!(host.invoke(second.clone()).await, 1);
    assert!(second.calls.lock().is_empty());

    let snapshot = fh_host::VariableStateStore::new(host.paths.state_dir()).load().unwrap();
    assert_eq!(snapshot.get("count"), Some(&serde_json::json!(7)));
}

#[tokio::test]
async fn default_arguments_fill_gaps_but_never_override() {
    let host = Host::with_config(
        r#"{"entryPoint": "main", "arguments": {"color": "red"}, "sessionToken": "tok"}"#,
    );
    let mut tuning = fh_host::HostTuning::default();
    tuning.default_arguments = [
        ("color".to_string(), serde_json::json!("blue")),
        ("size".to_string(), serde_json::json!(3)),
    ]
    .into_iter()
    .collect();

    let interp = FakeInterpreter::scripted([Ok(vec![])]);
    host.invoke_with(interp.clone(), tuning).await;

    let calls = interp.calls.lock();
    assert_eq!(calls[0].arguments.get("color"), Some(&serde_json::json!("red")));
    assert_eq!(calls[0].arguments.get("size"), Some(&serde_json::json!(3)));
}

#[tokio::test]
async fn interpreter_failure_then_restart_overlays_last_error() {
    let host = Host::new();
    let failing = FakeInterpreter::scripted([Err("task exploded".to_string())]);
    assert_eq!(host.invoke(failing).await, 1);

    let retry = FakeInterpreter::scripted([Ok(vec![])]);
    assert_eq!(host.invoke(retry.clone()).await, 0);

    let calls = retry.calls.lock();
    assert_eq!(calls[0].kind, "start");
    let variables = calls[0].variables.as_ref().unwrap();
    let last_error = variables.get("lastError").expect("last error overlaid into snapshot");
    assert_eq!(
        last_error.get("message"),
        Some(&serde_json::json!("task exploded"))
    );
}
