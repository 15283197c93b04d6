// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker record and lifecycle status.

use crate::id::{JobId, WorkerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Reserved id of the primary's co-located executor.
pub const LOCAL_WORKER_ID: &str = "__local__";

/// Priority boost pinned on the local worker so it is only chosen when no
/// remote worker qualifies.
pub const LOCAL_PRIORITY_BOOST: i32 = -1000;

/// Reported status of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Online,
    Busy,
    Offline,
    /// Missed check-ins beyond the staleness threshold
    Stale,
}

crate::simple_display! {
    WorkerStatus {
        Online => "online",
        Busy => "busy",
        Offline => "offline",
        Stale => "stale",
    }
}

/// Numeric gauges and counters reported by and maintained for a worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerStats {
    #[serde(default)]
    pub load_1m: f64,
    #[serde(default)]
    pub cpu_percent: f64,
    #[serde(default)]
    pub memory_percent: f64,
    #[serde(default)]
    pub memory_available_mb: u64,
    #[serde(default)]
    pub disk_percent: f64,
    #[serde(default)]
    pub disk_free_gb: u64,
    #[serde(default)]
    pub jobs_completed: u64,
    #[serde(default)]
    pub jobs_failed: u64,
    /// Running mean over all completed and failed jobs, in seconds
    #[serde(default)]
    pub avg_job_duration: f64,
    #[serde(default)]
    pub last_job_completed: Option<u64>,
}

impl WorkerStats {
    /// Adopt the gauges a worker reported at check-in, keeping the
    /// primary-maintained counters untouched.
    pub fn merge_gauges(&mut self, reported: &WorkerStats) {
        self.load_1m = reported.load_1m;
        self.cpu_percent = reported.cpu_percent;
        self.memory_percent = reported.memory_percent;
        self.memory_available_mb = reported.memory_available_mb;
        self.disk_percent = reported.disk_percent;
        self.disk_free_gb = reported.disk_free_gb;
    }

    /// Fold one finished job into the counters and the duration running mean.
    pub fn record_completion(&mut self, success: bool, duration_seconds: f64, epoch_ms: u64) {
        if success {
            self.jobs_completed += 1;
        } else {
            self.jobs_failed += 1;
        }
        let total = self.jobs_completed + self.jobs_failed;
        self.avg_job_duration += (duration_seconds - self.avg_job_duration) / total as f64;
        self.last_job_completed = Some(epoch_ms);
    }
}

/// A worker record held by the primary's registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    /// Unique among non-local workers; re-registration with the same name
    /// updates the existing record
    pub name: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub priority_boost: i32,
    pub status: WorkerStatus,
    #[serde(default)]
    pub is_local: bool,
    /// Content revision the worker last reported holding
    #[serde(default)]
    pub sync_revision: Option<String>,
    /// Jobs currently assigned or running on this worker
    #[serde(default)]
    pub current_jobs: BTreeSet<JobId>,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: u32,
    #[serde(default)]
    pub stats: WorkerStats,
    pub registered_at: u64,
    pub last_checkin: u64,
}

fn default_max_concurrent() -> u32 {
    1
}

impl Worker {
    /// Create a freshly registered remote worker.
    pub fn new(name: impl Into<String>, tags: BTreeSet<String>, epoch_ms: u64) -> Self {
        Self {
            id: WorkerId::new(),
            name: name.into(),
            tags,
            priority_boost: 0,
            status: WorkerStatus::Online,
            is_local: false,
            sync_revision: None,
            current_jobs: BTreeSet::new(),
            max_concurrent: 1,
            stats: WorkerStats::default(),
            registered_at: epoch_ms,
            last_checkin: epoch_ms,
        }
    }

    /// Create the primary's co-located executor record.
    ///
    /// Always present, never stale, never deletable.
    pub fn local(epoch_ms: u64) -> Self {
        Self {
            id: WorkerId::from(LOCAL_WORKER_ID),
            name: "local".to_string(),
            tags: BTreeSet::new(),
            priority_boost: LOCAL_PRIORITY_BOOST,
            status: WorkerStatus::Online,
            is_local: true,
            sync_revision: None,
            current_jobs: BTreeSet::new(),
            max_concurrent: 1,
            stats: WorkerStats::default(),
            registered_at: epoch_ms,
            last_checkin: epoch_ms,
        }
    }

    pub fn is_local(&self) -> bool {
        self.is_local || self.id == LOCAL_WORKER_ID
    }

    /// True when the worker can take another assignment.
    pub fn has_capacity(&self) -> bool {
        (self.current_jobs.len() as u32) < self.max_concurrent
    }
}

crate::builder! {
    pub struct WorkerBuilder => Worker {
        into {
            id: WorkerId = "worker-1",
            name: String = "test-worker",
        }
        set {
            tags: BTreeSet<String> = BTreeSet::new(),
            priority_boost: i32 = 0,
            status: WorkerStatus = WorkerStatus::Online,
            is_local: bool = false,
            current_jobs: BTreeSet<JobId> = BTreeSet::new(),
            max_concurrent: u32 = 1,
            stats: WorkerStats = WorkerStats::default(),
            registered_at: u64 = 1_000_000_000,
            last_checkin: u64 = 1_000_000_000,
        }
        option {
            sync_revision: String = None,
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
