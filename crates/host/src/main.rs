// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fhost: resumable process execution host binary.
//!
//! Launched by the process supervisor with a prepared working directory;
//! exits 0 after a clean suspension or termination and 1 on any unhandled
//! error. The supervisor re-invokes the host when a resume event arrives.

use clap::Parser;
use fh_api::{HttpApiClient, ProcessApiClient, Retried, RetryPolicy};
use fh_core::{AgentId, HostError, SystemClock};
use fh_host::{
    ExecutionLifecycleController, HeartbeatConfig, HostPaths, HostTuning, NullInterpreter,
    ProcessExit,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fhost", about = "Resumable process execution host")]
struct Args {
    /// Working directory prepared by the launcher.
    work_dir: PathBuf,

    /// Base URL of the process API server.
    #[arg(long, env = "FHOST_API_URL")]
    api_url: String,

    /// Agent slot this host runs under.
    #[arg(long, env = "FHOST_AGENT_ID", default_value = "")]
    agent_id: String,

    /// Heartbeat ping interval, milliseconds.
    #[arg(long, default_value_t = 10_000)]
    heartbeat_interval_ms: u64,

    /// Maximum tolerated time without a successful heartbeat, milliseconds.
    #[arg(long, default_value_t = 300_000)]
    max_no_heartbeat_ms: u64,

    /// Remote call retry attempts.
    #[arg(long, default_value_t = 3)]
    retry_attempts: u32,

    /// Delay between remote call retry attempts, milliseconds.
    #[arg(long, default_value_t = 5_000)]
    retry_interval_ms: u64,

    /// Delay between instance id poll attempts, milliseconds.
    #[arg(long, default_value_t = 250)]
    poll_delay_ms: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let tuning = HostTuning {
        poll_delay: Duration::from_millis(args.poll_delay_ms),
        heartbeat: HeartbeatConfig {
            interval: Duration::from_millis(args.heartbeat_interval_ms),
            max_silence: Duration::from_millis(args.max_no_heartbeat_ms),
        },
        ..HostTuning::default()
    };
    let retry = RetryPolicy {
        max_attempts: args.retry_attempts,
        interval: Duration::from_millis(args.retry_interval_ms),
    };
    let api_url = args.api_url.clone();

    let controller = ExecutionLifecycleController::new(
        HostPaths::new(&args.work_dir),
        NullInterpreter,
        Box::new(move |session_token| {
            let client = HttpApiClient::new(api_url.clone(), session_token)
                .map_err(|e| HostError::Remote { call: "open_session", source: Box::new(e) })?;
            Ok(Arc::new(Retried::new(client, retry)) as Arc<dyn ProcessApiClient>)
        }),
        AgentId::new(args.agent_id),
        tuning,
        SystemClock,
        ProcessExit,
    );

    match controller.run_to_exit_code().await {
        0 => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
