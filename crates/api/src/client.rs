// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote process API: status updates, checkpoint upload, heartbeat ping.

use async_trait::async_trait;
use fh_core::{AgentId, InstanceId};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Request timeout for individual remote calls. Retries are bounded by
/// attempt count, so each attempt must not hang indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server rejected {call}: http {status}")]
    Rejected { call: &'static str, status: u16 },
}

/// Process status reported to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStatus {
    Running,
    Suspended,
    Finished,
    Failed,
}

/// Checkpoint archive handed to the server.
#[derive(Debug, Clone)]
pub struct CheckpointUpload {
    pub checkpoint_id: String,
    pub correlation_id: String,
    pub name: String,
    /// Archive bytes; built and discarded within one control-loop iteration.
    pub data: Vec<u8>,
}

/// Remote calls the host relies on. All endpoints are idempotent under
/// at-least-once delivery.
#[async_trait]
pub trait ProcessApiClient: Send + Sync {
    async fn update_status(
        &self,
        instance_id: InstanceId,
        agent_id: &AgentId,
        status: ProcessStatus,
    ) -> Result<(), ApiError>;

    async fn upload_checkpoint(
        &self,
        instance_id: InstanceId,
        upload: CheckpointUpload,
    ) -> Result<(), ApiError>;

    async fn ping(&self, instance_id: InstanceId) -> Result<(), ApiError>;
}

/// HTTP implementation bound to one base URL and session credential.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    http: reqwest::Client,
    base_url: String,
    session_token: String,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>, session_token: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_token: session_token.into(),
        })
    }

    fn url(&self, instance_id: InstanceId, suffix: &str) -> String {
        format!("{}/api/v1/process/{}/{}", self.base_url, instance_id, suffix)
    }

    fn check(call: &'static str, response: &reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Rejected { call, status: status.as_u16() })
        }
    }
}

#[async_trait]
impl ProcessApiClient for HttpApiClient {
    async fn update_status(
        &self,
        instance_id: InstanceId,
        agent_id: &AgentId,
        status: ProcessStatus,
    ) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url(instance_id, "status"))
            .bearer_auth(&self.session_token)
            .json(&serde_json::json!({ "agentId": agent_id, "status": status }))
            .send()
            .await?;
        Self::check("update_status", &response)
    }

    async fn upload_checkpoint(
        &self,
        instance_id: InstanceId,
        upload: CheckpointUpload,
    ) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url(instance_id, "checkpoint"))
            .bearer_auth(&self.session_token)
            .query(&[
                ("checkpointId", upload.checkpoint_id.as_str()),
                ("correlationId", upload.correlation_id.as_str()),
                ("name", upload.name.as_str()),
            ])
            .body(upload.data)
            .send()
            .await?;
        Self::check("upload_checkpoint", &response)
    }

    async fn ping(&self, instance_id: InstanceId) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url(instance_id, "ping"))
            .bearer_auth(&self.session_token)
            .send()
            .await?;
        Self::check("ping", &response)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
