// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance identity acquisition.
//!
//! The launcher writes the instance id file after the host process may
//! already be running, so the host polls for it. A missing or malformed
//! file is "not ready yet", never an error: this loop cannot time out.
//! Filesystem watch primitives proved unreliable in containers, hence the
//! bounded busy-wait with sleep.

use fh_core::InstanceId;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Log a warning once per this many failed poll attempts.
const WARN_EVERY: u64 = 40;

/// Poll `path` until it contains a parseable instance id.
pub async fn resolve_instance_id(path: &Path, poll_delay: Duration) -> InstanceId {
    let mut attempts: u64 = 0;
    loop {
        match std::fs::read_to_string(path) {
            Ok(raw) => match raw.parse::<InstanceId>() {
                Ok(id) => {
                    debug!(instance_id = %id, attempts, "instance id resolved");
                    return id;
                }
                // Transient: the launcher may still be writing the file
                Err(err) => {
                    attempts += 1;
                    if attempts % WARN_EVERY == 0 {
                        warn!(path = %path.display(), attempts, %err, "instance id file not yet parseable");
                    }
                }
            },
            Err(_) => {
                attempts += 1;
                if attempts % WARN_EVERY == 0 {
                    warn!(path = %path.display(), attempts, "instance id file not yet present");
                }
            }
        }
        tokio::time::sleep(poll_delay).await;
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
