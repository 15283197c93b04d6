// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only audit sink.
//!
//! One JSON document per line under `<state_dir>/audit.jsonl`. Export and
//! retention are the hosting layer's concern; a failed append is logged and
//! never fails the operation that emitted it.

use armada_core::AuditEntry;
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

pub struct AuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self { path: state_dir.into().join("audit.jsonl"), lock: Mutex::new(()) }
    }

    /// Append an entry. Best-effort: errors are traced, not returned.
    pub fn append(&self, entry: &AuditEntry) {
        let _guard = self.lock.lock();
        let result = serde_json::to_string(entry).map_err(std::io::Error::other).and_then(|line| {
            let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
            writeln!(file, "{line}")
        });
        if let Err(err) = result {
            tracing::warn!(error = %err, "audit append failed");
        }
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
