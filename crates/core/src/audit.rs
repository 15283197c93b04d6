// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit entry shape.
//!
//! Persistence and export are the hosting layer's concern; the core only
//! fixes the entry shape and the emission points (login attempts, job
//! submit/cancel, worker register/delete, user/role/token writes, content
//! commits).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp_ms: u64,
    /// Acting principal; "anonymous" when none resolved
    pub username: String,
    /// Verb, e.g. "login", "job.submit", "worker.delete"
    pub action: String,
    /// Affected resource identifier
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    /// "success", "denied", or "failure"
    pub outcome: String,
}

impl AuditEntry {
    pub fn new(timestamp_ms: u64, username: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            username: username.into(),
            action: action.into(),
            resource: None,
            detail: None,
            outcome: "success".to_string(),
        }
    }

    crate::setters! {
        into {
            outcome: String,
        }
        option {
            resource: String,
            detail: String,
        }
    }
}
