// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker→primary API payloads.

use armada_core::{Job, JobId, WorkerId, WorkerStats, WorkerStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Body of `POST /api/workers/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Shared registration secret, distributed out of band
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub worker_id: WorkerId,
    /// Seconds between check-ins expected by the primary
    pub checkin_interval: u64,
}

/// Summary of one job currently held by the worker, reported at check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveJob {
    pub job_id: JobId,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<String>,
}

/// Body of `POST /api/workers/<id>/checkin`. Absent fields leave the
/// corresponding record fields untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckinRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<WorkerStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkerStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_jobs: Option<Vec<ActiveJob>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinResponse {
    pub next_checkin_seconds: u64,
    /// True iff the reported sync_revision differs from the current one
    pub sync_needed: bool,
    pub current_revision: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedJobsResponse {
    pub jobs: Vec<Job>,
}

/// Body of `POST /api/jobs/<id>/start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartJobRequest {
    pub worker_id: WorkerId,
    /// Final log file basename chosen by the worker
    pub log_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartJobResponse {
    pub status: String,
}

/// Body of `POST /api/jobs/<id>/log/stream`. The first chunk of a job uses
/// `append = false` and initializes the partial artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamLogRequest {
    pub worker_id: WorkerId,
    pub content: String,
    #[serde(default)]
    pub append: bool,
}

/// Body of `POST /api/jobs/<id>/complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteJobRequest {
    pub worker_id: WorkerId,
    pub exit_code: i32,
    pub log_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub duration_seconds: f64,
    /// host → facts map forwarded to the external CMDB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmdb_facts: Option<HashMap<String, serde_json::Value>>,
    /// Piggybacked check-in applied after the state transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin: Option<CheckinRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteJobResponse {
    /// Final job status: "completed" or "failed"
    pub status: String,
    pub log_stored: bool,
    pub worker_stats_updated: bool,
    pub cmdb_facts_stored: bool,
    pub checkin_processed: bool,
}

#[cfg(test)]
#[path = "worker_api_tests.rs"]
mod tests;
