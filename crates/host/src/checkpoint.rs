// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mid-flight checkpoint snapshots.
//!
//! A checkpoint packages the attachments and system directories plus a
//! checkpoint-name marker into a gzipped tar archive, streams it to the
//! remote store, and synthesizes a resume marker so the control loop can
//! proceed without waiting on an external event. The archive is staged
//! through a temp file that is removed on every exit path and is never
//! retained locally after upload.

use fh_api::{CheckpointUpload, ProcessApiClient};
use fh_core::{CheckpointCommand, HostError, InstanceId};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::markers;
use crate::paths::HostPaths;

/// Archive entry holding the checkpoint name.
const NAME_ENTRY: &str = "checkpoint.name";

pub struct CheckpointManager<'a> {
    api: &'a dyn ProcessApiClient,
    instance_id: InstanceId,
}

impl<'a> CheckpointManager<'a> {
    pub fn new(api: &'a dyn ProcessApiClient, instance_id: InstanceId) -> Self {
        Self { api, instance_id }
    }

    /// Build and upload one checkpoint, then record the synthesized resume
    /// event. Any I/O failure is wrapped as a checkpoint error and is fatal
    /// for this control-loop iteration; retries happen only at the
    /// remote-call layer.
    pub async fn process(
        &self,
        command: &CheckpointCommand,
        resume_event: &str,
        paths: &HostPaths,
    ) -> Result<(), HostError> {
        let wrap = |source: std::io::Error| HostError::Checkpoint {
            checkpoint_id: command.checkpoint_id.clone(),
            source: Box::new(source),
        };

        std::fs::create_dir_all(paths.checkpoints_dir()).map_err(wrap)?;
        let name_file = paths
            .checkpoints_dir()
            .join(format!("{}.name", command.checkpoint_id));
        std::fs::write(&name_file, &command.checkpoint_name).map_err(wrap)?;

        // Staged outside the attachments tree so the archive never
        // contains itself; dropped (and thus deleted) on every exit path.
        let data = build_archive(paths, &name_file).map_err(wrap)?;
        debug!(
            checkpoint_id = %command.checkpoint_id,
            bytes = data.len(),
            "checkpoint archive built"
        );

        self.api
            .upload_checkpoint(
                self.instance_id,
                CheckpointUpload {
                    checkpoint_id: command.checkpoint_id.clone(),
                    correlation_id: command.correlation_id.clone(),
                    name: command.checkpoint_name.clone(),
                    data,
                },
            )
            .await
            .map_err(|e| HostError::Checkpoint {
                checkpoint_id: command.checkpoint_id.clone(),
                source: Box::new(e),
            })?;

        std::fs::remove_file(&name_file).map_err(wrap)?;
        markers::write_resume_marker(&paths.state_dir(), resume_event)?;

        info!(
            checkpoint_id = %command.checkpoint_id,
            name = %command.checkpoint_name,
            "checkpoint uploaded"
        );
        Ok(())
    }
}

/// Write attachments, system dir, and the name entry into a tar.gz staged
/// in a temp file, returning its bytes.
fn build_archive(paths: &HostPaths, name_file: &Path) -> std::io::Result<Vec<u8>> {
    let staging = tempfile::NamedTempFile::new()?;
    {
        let encoder = GzEncoder::new(staging.as_file(), Compression::default());
        let mut archive = tar::Builder::new(encoder);
        let attachments = paths.attachments_dir();
        if attachments.exists() {
            archive.append_dir_all("attachments", &attachments)?;
        }
        let system = paths.system_dir();
        if system.exists() {
            archive.append_dir_all("system", &system)?;
        }
        archive.append_path_with_name(name_file, NAME_ENTRY)?;
        archive.into_inner()?.finish()?;
    }

    let mut data = Vec::new();
    staging.reopen()?.read_to_end(&mut data)?;
    Ok(data)
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
