// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fh-core: shared types for the flowhost process execution host

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod id;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{PolicyDocument, ProcessConfiguration, ProcessMeta};
pub use error::{root_cause, HostError, LastErrorRecord};
pub use event::{CheckpointCommand, PendingEvent};
pub use id::{AgentId, InstanceId};
