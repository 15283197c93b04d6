// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Playbook catalogue endpoint.

use super::SharedEngine;
use crate::engine::PlaybookEntry;
use crate::error::ApiError;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct PlaybookListResponse {
    pub playbooks: Vec<PlaybookEntry>,
}

pub async fn list(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
) -> Result<Json<PlaybookListResponse>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    // A tag-scoped grant like `playbooks.servers:view` satisfies this via
    // prefix matching; the per-tag narrowing happens in the engine.
    let user = engine.require(&principal, "playbooks:view")?;
    Ok(Json(PlaybookListResponse { playbooks: engine.list_playbooks(&user) }))
}
