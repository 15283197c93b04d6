// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker registry endpoints.

use super::SharedEngine;
use crate::error::ApiError;
use armada_wire::{
    AssignedJobsResponse, CheckinRequest, CheckinResponse, RegisterRequest, RegisterResponse,
    WorkerListResponse,
};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

pub async fn register(
    State(engine): State<SharedEngine>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    // Authentication here is the registration token itself.
    Ok(Json(engine.register_worker(&body)?))
}

pub async fn checkin(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<CheckinRequest>,
) -> Result<Json<CheckinResponse>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    let claimed = armada_core::WorkerId::from(id.as_str());
    engine.require_worker(&principal, Some(&claimed))?;
    Ok(Json(engine.checkin_worker(&id, &body)?))
}

#[derive(Deserialize)]
pub struct JobsQuery {
    #[serde(default)]
    pub status: Option<armada_core::JobStatus>,
}

pub async fn jobs(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
    Query(query): Query<JobsQuery>,
    headers: HeaderMap,
) -> Result<Json<AssignedJobsResponse>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    let claimed = armada_core::WorkerId::from(id.as_str());
    engine.require_worker(&principal, Some(&claimed))?;

    let jobs = match query.status {
        None | Some(armada_core::JobStatus::Assigned) => engine.assigned_jobs(&id)?,
        Some(status) => {
            let worker = engine
                .store
                .get_worker(&id)
                .ok_or_else(|| ApiError::NotFound(format!("worker {id}")))?;
            engine.store.jobs_for_worker(&worker.id, Some(&[status]))
        }
    };
    Ok(Json(AssignedJobsResponse { jobs }))
}

pub async fn list(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
) -> Result<Json<WorkerListResponse>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    engine.require(&principal, "workers:view")?;
    Ok(Json(WorkerListResponse { workers: engine.store.workers() }))
}

pub async fn get_worker(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<armada_core::Worker>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    engine.require(&principal, "workers:view")?;
    engine
        .store
        .get_worker(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("worker {id}")))
}

pub async fn delete_worker(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    let user = engine.require(&principal, "workers:delete")?;
    engine.delete_worker(&id, &user.username)?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
