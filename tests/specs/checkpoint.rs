// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint specs: archive contents and loop continuation.

use crate::prelude::*;
use fh_core::PendingEvent;
use std::io::Read;

fn archive_entries(data: &[u8]) -> Vec<String> {
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(data));
    archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[tokio::test]
async fn checkpoint_uploads_attachments_and_system_dirs() {
    let host = Host::new();
    std::fs::create_dir_all(host.paths.attachments_dir()).unwrap();
    std::fs::write(host.paths.attachments_dir().join("data.bin"), b"payload").unwrap();
    std::fs::create_dir_all(host.paths.system_dir()).unwrap();
    std::fs::write(host.paths.policy_file(), b"{}").unwrap();

    let interp = FakeInterpreter::scripted([
        Ok(vec![checkpoint_event("c1", "cp1")]),
        Ok(vec![]),
    ]);

    assert_eq!(host.invoke(interp.clone()).await, 0);

    let uploads = host.api.uploads.lock();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].checkpoint_id, "c1");
    assert_eq!(uploads[0].name, "cp1");

    let entries = archive_entries(&uploads[0].data);
    assert!(entries.iter().any(|e| e == "attachments/data.bin"), "{:?}", entries);
    assert!(entries.iter().any(|e| e == "system/policy.json"), "{:?}", entries);
    assert!(entries.iter().any(|e| e == "checkpoint.name"), "{:?}", entries);

    // The loop continued to the resume call without an external event
    assert_eq!(interp.call_kinds(), vec!["start", "resume:checkpoint_c1"]);
}

#[tokio::test]
async fn checkpoint_name_entry_carries_the_checkpoint_name() {
    let host = Host::new();
    let interp = FakeInterpreter::scripted([
        Ok(vec![checkpoint_event("c9", "before-deploy")]),
        Ok(vec![]),
    ]);
    host.invoke(interp).await;

    let uploads = host.api.uploads.lock();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(&uploads[0].data[..]));
    let mut name = String::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        if entry.path().unwrap().to_string_lossy() == "checkpoint.name" {
            entry.read_to_string(&mut name).unwrap();
        }
    }
    assert_eq!(name, "before-deploy");
}

#[tokio::test]
async fn one_shot_arguments_are_not_replayed_after_a_checkpoint() {
    let host = Host::with_config(
        r#"{"entryPoint": "main", "arguments": {"name": "world"}, "sessionToken": "tok"}"#,
    );
    let interp = FakeInterpreter::scripted([
        Ok(vec![checkpoint_event("c1", "cp1")]),
        Ok(vec![]),
    ]);

    host.invoke(interp.clone()).await;

    let calls = interp.calls.lock();
    assert_eq!(calls[0].arguments.get("name"), Some(&serde_json::json!("world")));
    // Post-checkpoint resume: configured one-shot arguments are gone...
    assert!(calls[1].arguments.get("name").is_none());
    // ...but the identity and working directory are still merged in
    assert!(calls[1].arguments.contains_key("instanceId"));
    assert!(calls[1].arguments.contains_key("workDir"));
}

#[tokio::test]
async fn transient_archives_are_not_retained_locally() {
    let host = Host::new();
    let interp = FakeInterpreter::scripted([
        Ok(vec![checkpoint_event("c1", "cp1")]),
        Ok(vec![PendingEvent::suspend("wait")]),
    ]);
    host.invoke(interp).await;

    let checkpoints = host.paths.checkpoints_dir();
    if checkpoints.exists() {
        let leftovers: Vec<_> = std::fs::read_dir(&checkpoints).unwrap().collect();
        assert!(leftovers.is_empty(), "checkpoint dir should be empty after upload");
    }
}
