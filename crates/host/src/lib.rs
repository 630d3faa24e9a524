// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fh-host: the resumable process execution host.
//!
//! One host process drives one workflow instance: it acquires the instance
//! identity, boots configuration and policy, keeps a heartbeat session open
//! with the remote controller, and runs the start/resume/checkpoint control
//! loop against the external step interpreter. The host exits after every
//! suspension and is re-invoked by an external supervisor when a resume
//! event arrives.

pub mod checkpoint;
pub mod controller;
pub mod heartbeat;
pub mod identity;
pub mod interpreter;
pub mod markers;
pub mod paths;
pub mod varstore;

pub use checkpoint::CheckpointManager;
pub use controller::{ExecutionLifecycleController, HostTuning};
pub use heartbeat::{FatalHook, HeartbeatConfig, HeartbeatMonitor, ProcessExit};
pub use interpreter::{Interpreter, NullInterpreter, RunRequest};
pub use paths::HostPaths;
pub use varstore::VariableStateStore;
