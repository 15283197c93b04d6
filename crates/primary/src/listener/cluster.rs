// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health probe and cluster status summary.

use super::SharedEngine;
use crate::auth::Principal;
use crate::error::ApiError;
use armada_core::{JobStatus, WorkerStatus};
use armada_wire::ClusterStatus;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

/// Public liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn status(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
) -> Result<Json<ClusterStatus>, ApiError> {
    match engine.resolve_principal(&headers) {
        Principal::WorkerNode(_) => {}
        principal @ Principal::User(_) => {
            engine.require(&principal, "workers:view")?;
        }
        Principal::Anonymous => return Err(ApiError::Unauthenticated),
    }

    let workers = engine.store.workers();
    let jobs = engine.store.jobs();
    Ok(Json(ClusterStatus {
        workers_total: workers.len(),
        workers_online: workers
            .iter()
            .filter(|w| matches!(w.status, WorkerStatus::Online | WorkerStatus::Busy))
            .count(),
        jobs_queued: jobs.iter().filter(|j| j.status == JobStatus::Queued).count(),
        jobs_running: jobs.iter().filter(|j| j.status == JobStatus::Running).count(),
        revision: engine.content.current_revision(),
    }))
}
