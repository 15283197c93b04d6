// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content-sync payloads and socket frames.

use armada_core::{JobId, JobStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Response of `GET /api/sync/revision`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionInfo {
    pub revision: String,
    /// First seven characters, for display
    pub short_revision: String,
}

impl RevisionInfo {
    pub fn new(revision: impl Into<String>) -> Self {
        let revision = revision.into();
        let short_revision = armada_core::short(&revision, 7).to_string();
        Self { revision, short_revision }
    }
}

/// One file in the content manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub sha256: String,
    pub size: u64,
}

/// Response of `GET /api/sync/manifest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestResponse {
    pub revision: String,
    pub files: BTreeMap<String, FileEntry>,
}

/// Frames on the workers notification socket.
///
/// Workers send `join_workers` once after connecting; the primary emits
/// `sync_available` on every content commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SocketFrame {
    JoinWorkers,
    SyncAvailable { revision: String, short_revision: String },
}

/// Events on the per-job UI topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    /// A streamed log chunk; `append = false` resets the view
    LogChunk { job_id: JobId, content: String, append: bool },
    /// Terminal transition of a job
    JobCompleted { job_id: JobId, status: JobStatus, exit_code: Option<i32> },
    /// The finished job's artifacts are ready for the external review agent
    ReviewReady { job_id: JobId },
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
