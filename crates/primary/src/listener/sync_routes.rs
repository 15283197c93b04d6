// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content sync endpoints.

use super::SharedEngine;
use crate::auth::Principal;
use crate::content::{Change, ContentError};
use crate::error::ApiError;
use armada_core::AuditEntry;
use armada_wire::{ManifestResponse, RevisionInfo};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::UnsafePath(path) => {
                ApiError::BadRequest(format!("path '{path}' is not allowed"))
            }
            ContentError::NotFound(path) => ApiError::NotFound(path),
            ContentError::Io(io) => ApiError::Internal(io.to_string()),
        }
    }
}

/// Workers read sync state with their worker identity; authenticated users
/// (the UI) may read it too.
fn require_sync_read(engine: &SharedEngine, headers: &HeaderMap) -> Result<(), ApiError> {
    match engine.resolve_principal(headers) {
        Principal::WorkerNode(_) => Ok(()),
        principal @ Principal::User(_) => engine.require(&principal, "workers:view").map(|_| ()),
        Principal::Anonymous => Err(ApiError::Unauthenticated),
    }
}

pub async fn revision(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
) -> Result<Json<RevisionInfo>, ApiError> {
    require_sync_read(&engine, &headers)?;
    Ok(Json(RevisionInfo::new(engine.content.current_revision())))
}

pub async fn manifest(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
) -> Result<Json<ManifestResponse>, ApiError> {
    require_sync_read(&engine, &headers)?;
    let (revision, files) = engine.content.manifest();
    Ok(Json(ManifestResponse { revision, files }))
}

pub async fn archive(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_sync_read(&engine, &headers)?;
    let bytes = engine.content.archive()?;
    Ok(([(header::CONTENT_TYPE, "application/gzip")], bytes))
}

pub async fn file(
    State(engine): State<SharedEngine>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_sync_read(&engine, &headers)?;
    let bytes = engine.content.file(&path)?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}

#[derive(Deserialize)]
pub struct CommitRequest {
    /// relative path → new content; `null` deletes the file
    pub changes: std::collections::BTreeMap<String, Option<String>>,
}

/// Apply a content commit and push `sync_available` to the workers topic.
pub async fn commit(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Json(body): Json<CommitRequest>,
) -> Result<Json<RevisionInfo>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    let user = engine.require(&principal, "playbooks:edit")?;

    let changes = body
        .changes
        .into_iter()
        .map(|(path, content)| {
            let change = match content {
                Some(text) => Change::Write(text.into_bytes()),
                None => Change::Delete,
            };
            (path, change)
        })
        .collect();
    let revision = engine.content.commit(changes)?;

    engine.hub.notify_sync(&revision);
    engine.audit_entry(
        AuditEntry::new(engine.now_ms(), &user.username, "content.commit")
            .detail(armada_core::short(&revision, 7).to_string()),
    );
    Ok(Json(RevisionInfo::new(revision)))
}
