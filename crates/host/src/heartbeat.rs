// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background liveness reporting.
//!
//! A host that cannot prove liveness to the remote controller must not keep
//! running unsupervised, so a sustained heartbeat gap terminates the whole
//! process. Per-call retries absorb transient blips; this monitor handles
//! sustained controller unavailability.

use fh_api::ProcessApiClient;
use fh_core::InstanceId;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Log only every k-th consecutive ping failure after the first.
const FAILURE_LOG_EVERY: u64 = 6;

#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    /// Fixed ping interval.
    pub interval: Duration,
    /// Maximum tolerated time since the last successful ping.
    pub max_silence: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_silence: Duration::from_secs(300),
        }
    }
}

/// Invoked when the liveness gap exceeds the configured bound.
pub trait FatalHook: Send + Sync + 'static {
    fn terminate(&self, reason: &str);
}

/// Production hook: immediate hard process exit, no graceful drain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExit;

impl FatalHook for ProcessExit {
    fn terminate(&self, reason: &str) {
        error!(reason, "liveness lost, terminating host");
        std::process::exit(1);
    }
}

/// Handle to the running background monitor.
pub struct HeartbeatMonitor {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl HeartbeatMonitor {
    /// Spawn the monitor task. It runs until [`HeartbeatMonitor::stop`] or
    /// until the fatal hook fires.
    pub fn start(
        api: Arc<dyn ProcessApiClient>,
        instance_id: InstanceId,
        config: HeartbeatConfig,
        hook: impl FatalHook,
    ) -> Self {
        let cancel = CancellationToken::new();
        let child = cancel.child_token();
        let task = tokio::spawn(async move {
            ping_loop(api, instance_id, config, hook, child).await;
        });
        Self { cancel, task }
    }

    /// Stop the monitor and wait for the task to wind down.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

async fn ping_loop(
    api: Arc<dyn ProcessApiClient>,
    instance_id: InstanceId,
    config: HeartbeatConfig,
    hook: impl FatalHook,
    cancel: CancellationToken,
) {
    let mut last_success = Instant::now();
    let mut consecutive_failures: u64 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.interval) => {}
        }

        match api.ping(instance_id).await {
            Ok(()) => {
                if consecutive_failures > 0 {
                    info!(instance_id = %instance_id, "heartbeat recovered");
                }
                consecutive_failures = 0;
                last_success = Instant::now();
            }
            Err(err) => {
                consecutive_failures += 1;
                if consecutive_failures == 1 || consecutive_failures % FAILURE_LOG_EVERY == 0 {
                    warn!(instance_id = %instance_id, consecutive_failures, %err, "heartbeat ping failed");
                }
                let silence = Instant::now().saturating_duration_since(last_success);
                if silence > config.max_silence {
                    hook.terminate(&format!(
                        "no successful heartbeat for {:?} (max {:?})",
                        silence, config.max_silence
                    ));
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
