// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job queue operations: submit, cancel, list scoping, cleanup.

use super::Engine;
use crate::error::ApiError;
use armada_core::{
    check_permission, AuditEntry, Clock, Job, JobSpec, JobStatus, User, WorkerStatus,
};

/// Filter keys accepted by the job list endpoint.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub playbook: Option<String>,
    pub assigned_worker: Option<String>,
}

impl<C: Clock> Engine<C> {
    /// Submit a job. Enters the queue immediately; the dispatcher picks it
    /// up on its next pass.
    pub fn submit_job(&self, spec: JobSpec, submitted_by: &str) -> Result<Job, ApiError> {
        if spec.playbook.is_empty() {
            return Err(ApiError::BadRequest("playbook is required".into()));
        }
        let job = Job::new(spec, submitted_by, self.clock());
        self.store.insert_job(job.clone())?;
        self.audit_entry(
            AuditEntry::new(self.now_ms(), submitted_by, "job.submit")
                .resource(job.id.as_str())
                .detail(job.playbook.clone()),
        );
        tracing::info!(job = %job.id.short(8), playbook = %job.playbook, priority = job.priority, "job submitted");
        self.poke_dispatch();
        Ok(job)
    }

    /// List jobs, newest first, restricted to the caller's visibility.
    ///
    /// Callers without `jobs.all:view` see only their own submissions.
    /// Because wildcard matching is bidirectional, a plain `jobs:view`
    /// grant satisfies `jobs.all:view`; roles meant to be limited to own
    /// jobs must not hold `jobs:view`.
    pub fn list_jobs(&self, user: &User, filter: &JobFilter) -> Vec<Job> {
        let role_defs = self.store.role_map();
        let sees_all = check_permission(user, "jobs.all:view", &role_defs);

        self.store
            .jobs()
            .into_iter()
            .filter(|j| sees_all || j.submitted_by == user.username)
            .filter(|j| filter.status.map_or(true, |s| j.status == s))
            .filter(|j| filter.playbook.as_deref().map_or(true, |p| j.playbook == p))
            .filter(|j| {
                filter
                    .assigned_worker
                    .as_deref()
                    .map_or(true, |w| j.assigned_worker.as_ref().is_some_and(|a| a == w))
            })
            .collect()
    }

    /// Cancel a job. Queued and assigned jobs are taken out of circulation
    /// immediately; for running jobs the subprocess on the worker is not
    /// killed; the worker's completion report is reconciled against the
    /// cancelled status.
    pub fn cancel_job(&self, job_id: &str, actor: &str) -> Result<Job, ApiError> {
        let now = self.now_ms();
        let cancelled = self
            .store
            .update_job(job_id, |job| {
                if !JobStatus::can_transition(job.status, JobStatus::Cancelled) {
                    return None;
                }
                let previous_worker = job.assigned_worker.clone();
                job.status = JobStatus::Cancelled;
                job.completed_at = Some(now);
                Some((job.clone(), previous_worker))
            })?
            .ok_or_else(|| ApiError::NotFound(format!("job {job_id}")))?
            .ok_or_else(|| ApiError::Conflict("job is already terminal".into()))?;

        let (job, previous_worker) = cancelled;

        // Free the worker slot promptly so the dispatcher can reuse it.
        if let Some(worker_id) = previous_worker {
            self.store.update_worker(worker_id.as_str(), |w| {
                w.current_jobs.remove(job_id);
                if w.status == WorkerStatus::Busy && w.has_capacity() {
                    w.status = WorkerStatus::Online;
                }
            })?;
        }

        self.audit_entry(AuditEntry::new(now, actor, "job.cancel").resource(job_id));
        tracing::info!(job = %job.id.short(8), "job cancelled");
        self.poke_dispatch();
        Ok(job)
    }

    /// Apply a restricted status patch. Only transitions allowed by the
    /// state machine go through; everything else is a conflict.
    pub fn update_job_status(
        &self,
        job_id: &str,
        new_status: JobStatus,
    ) -> Result<Job, ApiError> {
        let now = self.now_ms();
        self.store
            .update_job(job_id, |job| {
                if !JobStatus::can_transition(job.status, new_status) {
                    return Err(ApiError::Conflict(format!(
                        "transition {} -> {} is not allowed",
                        job.status, new_status
                    )));
                }
                match new_status {
                    JobStatus::Running => job.started_at = Some(now),
                    JobStatus::Queued => {
                        job.assigned_worker = None;
                        job.assigned_at = None;
                        job.started_at = None;
                    }
                    JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => {
                        job.completed_at = Some(now);
                    }
                    JobStatus::Assigned => {}
                }
                job.status = new_status;
                Ok(job.clone())
            })?
            .ok_or_else(|| ApiError::NotFound(format!("job {job_id}")))?
    }

    /// Whether a user may cancel a specific job: owners need `jobs:cancel`,
    /// anyone else needs `jobs.all:cancel` (or a covering wildcard).
    pub fn may_cancel(&self, user: &User, job: &Job) -> bool {
        let role_defs = self.store.role_map();
        if job.submitted_by == user.username {
            check_permission(user, "jobs:cancel", &role_defs)
        } else {
            check_permission(user, "jobs.all:cancel", &role_defs)
        }
    }

    /// Remove old terminal jobs and their final logs. Never touches
    /// non-terminal jobs; keeps the `keep_count` most recent terminal
    /// records regardless of age.
    pub fn cleanup_jobs(&self, max_age_days: u64, keep_count: usize) -> Result<usize, ApiError> {
        let cutoff = self.now_ms().saturating_sub(max_age_days * 24 * 60 * 60 * 1000);
        let candidates = self.store.cleanup_candidates(cutoff, keep_count);
        let mut removed = 0;
        for id in candidates {
            if let Some(job) = self.store.get_job(id.as_str()) {
                if let Some(log_file) = &job.log_file {
                    self.broker.remove_log(log_file);
                }
            }
            if self.store.delete_job(id.as_str())? {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(removed, "job cleanup");
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
