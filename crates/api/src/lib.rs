// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fh-api: remote process API client with bounded retries.
//!
//! The server endpoints (status update, checkpoint upload, heartbeat ping)
//! are assumed safe for idempotent retried calls; the server deduplicates by
//! instance id where required.

pub mod client;
pub mod retry;

pub use client::{ApiError, CheckpointUpload, HttpApiClient, ProcessApiClient, ProcessStatus};
pub use retry::{with_retry, Retried, RetryPolicy};
