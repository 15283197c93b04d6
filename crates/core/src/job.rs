// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and state machine.

use crate::clock::Clock;
use crate::id::{JobId, WorkerId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Status of a job as it moves through the queue.
///
/// The machine is acyclic except for the requeue edges used by stale-worker
/// recovery: `assigned → queued` and `running → queued`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for the dispatcher to find an eligible worker
    Queued,
    /// Matched to a worker, not yet picked up
    Assigned,
    /// Executing on the assigned worker
    Running,
    /// Finished with exit code 0
    Completed,
    /// Finished with a non-zero exit code or an execution error
    Failed,
    /// Cancelled by a user; process termination on the worker is advisory
    Cancelled,
}

crate::simple_display! {
    JobStatus {
        Queued => "queued",
        Assigned => "assigned",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl JobStatus {
    /// Check if this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    /// Check whether a transition between two statuses is allowed.
    pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (from, to),
            (Queued, Assigned)
                | (Queued, Cancelled)
                | (Assigned, Running)
                | (Assigned, Queued)
                | (Assigned, Cancelled)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Queued)
                | (Running, Cancelled)
        )
    }
}

/// Execution class of a job. Long-running jobs are dispatched the same way
/// but are exempt from age-based cleanup while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    #[default]
    Normal,
    LongRunning,
}

crate::simple_display! {
    JobType {
        Normal => "normal",
        LongRunning => "long_running",
    }
}

/// Submission payload for a new job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSpec {
    /// Playbook name, stored without extension
    pub playbook: String,
    /// Inventory limit string; "all" targets every host
    #[serde(default = "default_target")]
    pub target: String,
    /// Every required tag must be present on a candidate worker
    #[serde(default)]
    pub required_tags: BTreeSet<String>,
    /// Soft scoring input for dispatcher tie-breaks
    #[serde(default)]
    pub preferred_tags: BTreeSet<String>,
    /// 0–100, higher dispatches first
    #[serde(default)]
    pub priority: u8,
    #[serde(default)]
    pub job_type: JobType,
    /// Passed to the playbook as `-e` JSON
    #[serde(default)]
    pub extra_vars: HashMap<String, serde_json::Value>,
}

fn default_target() -> String {
    "all".to_string()
}

/// A job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub playbook: String,
    pub target: String,
    #[serde(default)]
    pub required_tags: BTreeSet<String>,
    #[serde(default)]
    pub preferred_tags: BTreeSet<String>,
    #[serde(default)]
    pub priority: u8,
    #[serde(default)]
    pub job_type: JobType,
    #[serde(default)]
    pub extra_vars: HashMap<String, serde_json::Value>,
    pub status: JobStatus,
    /// Non-null exactly while status is assigned or running
    #[serde(default)]
    pub assigned_worker: Option<WorkerId>,
    /// Username recorded at submission; drives ownership checks
    pub submitted_by: String,
    /// Log file basename, set once execution starts
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    pub submitted_at: u64,
    #[serde(default)]
    pub assigned_at: Option<u64>,
    #[serde(default)]
    pub started_at: Option<u64>,
    #[serde(default)]
    pub completed_at: Option<u64>,
}

impl Job {
    /// Create a queued job from a submission.
    pub fn new(spec: JobSpec, submitted_by: impl Into<String>, clock: &impl Clock) -> Self {
        Self {
            id: JobId::new(),
            playbook: spec.playbook,
            target: spec.target,
            required_tags: spec.required_tags,
            preferred_tags: spec.preferred_tags,
            priority: spec.priority.min(100),
            job_type: spec.job_type,
            extra_vars: spec.extra_vars,
            status: JobStatus::Queued,
            assigned_worker: None,
            submitted_by: submitted_by.into(),
            log_file: None,
            exit_code: None,
            error_message: None,
            duration_seconds: None,
            submitted_at: clock.epoch_ms(),
            assigned_at: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// True while the job occupies a worker slot.
    pub fn is_active(&self) -> bool {
        matches!(self.status, JobStatus::Assigned | JobStatus::Running)
    }

    /// Record a dispatcher assignment.
    pub fn assign(&mut self, worker: WorkerId, epoch_ms: u64) {
        self.status = JobStatus::Assigned;
        self.assigned_worker = Some(worker);
        self.assigned_at = Some(epoch_ms);
    }

    /// Return the job to the queue, clearing assignment bookkeeping.
    pub fn requeue(&mut self, reason: impl Into<String>) {
        self.status = JobStatus::Queued;
        self.assigned_worker = None;
        self.assigned_at = None;
        self.started_at = None;
        self.error_message = Some(reason.into());
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            id: JobId = "job-1",
            playbook: String = "site",
            target: String = "all",
            submitted_by: String = "tester",
        }
        set {
            required_tags: BTreeSet<String> = BTreeSet::new(),
            preferred_tags: BTreeSet<String> = BTreeSet::new(),
            priority: u8 = 50,
            job_type: JobType = JobType::Normal,
            extra_vars: HashMap<String, serde_json::Value> = HashMap::new(),
            status: JobStatus = JobStatus::Queued,
            submitted_at: u64 = 1_000_000_000,
        }
        option {
            assigned_worker: WorkerId = None,
            log_file: String = None,
            exit_code: i32 = None,
            error_message: String = None,
            duration_seconds: f64 = None,
            assigned_at: u64 = None,
            started_at: u64 = None,
            completed_at: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
