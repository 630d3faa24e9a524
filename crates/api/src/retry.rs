// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded fixed-interval retry for remote calls.
//!
//! Retries handle transient network blips; sustained controller
//! unavailability is the heartbeat monitor's problem, not this layer's.

use crate::client::{ApiError, CheckpointUpload, ProcessApiClient, ProcessStatus};
use async_trait::async_trait;
use fh_core::{AgentId, InstanceId};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Attempt bound and fixed inter-attempt delay.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, interval: Duration::from_secs(5) }
    }
}

/// Run `op` up to `policy.max_attempts` times with a fixed delay between
/// attempts. The final failure is surfaced as the operation's own error,
/// never masked by a retry-layer wrapper.
pub async fn with_retry<T, E, Fut, Op>(
    policy: RetryPolicy,
    label: &str,
    mut op: Op,
) -> Result<T, E>
where
    E: Display,
    Fut: Future<Output = Result<T, E>>,
    Op: FnMut() -> Fut,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts => {
                warn!(call = label, attempt, max = attempts, error = %err, "remote call failed, retrying");
                tokio::time::sleep(policy.interval).await;
                attempt += 1;
            }
            Err(err) => {
                warn!(call = label, attempt, "remote call failed, attempts exhausted");
                return Err(err);
            }
        }
    }
}

/// Applies a `RetryPolicy` uniformly to every call of an inner client.
#[derive(Debug, Clone)]
pub struct Retried<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C> Retried<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<C: ProcessApiClient> ProcessApiClient for Retried<C> {
    async fn update_status(
        &self,
        instance_id: InstanceId,
        agent_id: &AgentId,
        status: ProcessStatus,
    ) -> Result<(), ApiError> {
        with_retry(self.policy, "update_status", || {
            self.inner.update_status(instance_id, agent_id, status)
        })
        .await
    }

    async fn upload_checkpoint(
        &self,
        instance_id: InstanceId,
        upload: CheckpointUpload,
    ) -> Result<(), ApiError> {
        with_retry(self.policy, "upload_checkpoint", || {
            self.inner.upload_checkpoint(instance_id, upload.clone())
        })
        .await
    }

    async fn ping(&self, instance_id: InstanceId) -> Result<(), ApiError> {
        with_retry(self.policy, "ping", || self.inner.ping(instance_id)).await
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
