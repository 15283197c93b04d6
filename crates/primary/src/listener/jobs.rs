// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job API endpoints: submission, queries, cancellation, and the
//! worker-facing execution callbacks.

use super::SharedEngine;
use crate::engine::JobFilter;
use crate::error::ApiError;
use armada_core::{check_permission, Job, JobSpec, JobStatus};
use armada_wire::{
    CompleteJobRequest, CompleteJobResponse, JobListResponse, JobSubmitResponse, StartJobRequest,
    StartJobResponse, StreamLogRequest,
};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

pub async fn submit(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Json(spec): Json<JobSpec>,
) -> Result<Json<JobSubmitResponse>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    let user = engine.require(&principal, "jobs:submit")?;
    let job = engine.submit_job(spec, &user.username)?;
    Ok(Json(JobSubmitResponse { job_id: job.id, status: job.status.to_string() }))
}

#[derive(Deserialize, Default)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub playbook: Option<String>,
    #[serde(default)]
    pub assigned_worker: Option<String>,
}

pub async fn list(
    State(engine): State<SharedEngine>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Result<Json<JobListResponse>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    let user = engine.require(&principal, "jobs:view")?;
    let filter = JobFilter {
        status: query.status,
        playbook: query.playbook,
        assigned_worker: query.assigned_worker,
    };
    Ok(Json(JobListResponse { jobs: engine.list_jobs(&user, &filter) }))
}

pub async fn get_job(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Job>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    let user = engine.require(&principal, "jobs:view")?;
    let job =
        engine.store.get_job(&id).ok_or_else(|| ApiError::NotFound(format!("job {id}")))?;

    let sees_all = check_permission(&user, "jobs.all:view", &engine.store.role_map());
    if !sees_all && job.submitted_by != user.username {
        return Err(ApiError::Forbidden { required_permission: "jobs.all:view".to_string() });
    }
    Ok(Json(job))
}

pub async fn cancel(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Job>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    let user = engine.require(&principal, "jobs:cancel")?;
    let job =
        engine.store.get_job(&id).ok_or_else(|| ApiError::NotFound(format!("job {id}")))?;
    if !engine.may_cancel(&user, &job) {
        return Err(ApiError::Forbidden { required_permission: "jobs.all:cancel".to_string() });
    }
    Ok(Json(engine.cancel_job(&id, &user.username)?))
}

pub async fn log(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<String, ApiError> {
    let principal = engine.resolve_principal(&headers);
    engine.require(&principal, "logs:view")?;
    let job =
        engine.store.get_job(&id).ok_or_else(|| ApiError::NotFound(format!("job {id}")))?;

    // Running jobs serve the live partial; finished jobs the final file.
    if let Some(partial) = engine.broker.read_partial(&job.id) {
        return Ok(partial);
    }
    let name = job
        .log_file
        .as_deref()
        .ok_or_else(|| ApiError::NotFound(format!("log for job {id}")))?;
    engine
        .broker
        .read_log(name)
        .map_err(|_| ApiError::NotFound(format!("log for job {id}")))
}

#[derive(Deserialize)]
pub struct StatusPatch {
    pub status: JobStatus,
    #[serde(default)]
    pub worker_id: Option<armada_core::WorkerId>,
}

/// Restricted status patch. Workers use it to flag a pickup; operators
/// holding `jobs.all:edit` may drive the machine directly.
pub async fn update_status(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<StatusPatch>,
) -> Result<Json<Job>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    let authorized_worker =
        engine.require_worker(&principal, body.worker_id.as_ref()).is_ok();
    if !authorized_worker {
        engine.require(&principal, "jobs.all:edit")?;
    }
    Ok(Json(engine.update_job_status(&id, body.status)?))
}

#[derive(Deserialize)]
pub struct CleanupRequest {
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u64,
    #[serde(default = "default_keep_count")]
    pub keep_count: usize,
}

fn default_max_age_days() -> u64 {
    30
}

fn default_keep_count() -> usize {
    100
}

/// Remove old terminal jobs and their logs.
pub async fn cleanup(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Json(body): Json<CleanupRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    engine.require(&principal, "jobs:cleanup")?;
    let removed = engine.cleanup_jobs(body.max_age_days, body.keep_count)?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}

// === Worker-facing callbacks ===

pub async fn start(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<StartJobRequest>,
) -> Result<Json<StartJobResponse>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    engine.require_worker(&principal, Some(&body.worker_id))?;
    engine.start_job(&id, &body)?;
    Ok(Json(StartJobResponse { status: "running".to_string() }))
}

pub async fn stream_log(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<StreamLogRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    engine.require_worker(&principal, Some(&body.worker_id))?;
    engine.stream_log(&id, &body)?;
    Ok(Json(serde_json::json!({})))
}

pub async fn complete(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<CompleteJobRequest>,
) -> Result<Json<CompleteJobResponse>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    engine.require_worker(&principal, Some(&body.worker_id))?;
    Ok(Json(engine.complete_job(&id, &body).await?))
}
