// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job collection: queue views and per-job mutation.

use super::RecordStore;
use crate::records::StorageError;
use armada_core::{Job, JobId, JobStatus, WorkerId};

impl RecordStore {
    /// Persist a new job record.
    pub fn insert_job(&self, job: Job) -> Result<(), StorageError> {
        self.persist("jobs", job.id.as_str(), &job)?;
        self.state.lock().jobs.insert(job.id.clone(), job);
        Ok(())
    }

    pub fn get_job(&self, id: &str) -> Option<Job> {
        self.state.lock().jobs.get(id).cloned()
    }

    /// Mutate a job under the store lock and write the result through.
    ///
    /// Returns `None` when the job does not exist; the closure's return
    /// value otherwise.
    pub fn update_job<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Job) -> R,
    ) -> Result<Option<R>, StorageError> {
        let mut state = self.state.lock();
        let Some(job) = state.jobs.get_mut(id) else {
            return Ok(None);
        };
        let result = f(job);
        let snapshot = job.clone();
        drop(state);
        self.persist("jobs", snapshot.id.as_str(), &snapshot)?;
        Ok(Some(result))
    }

    pub fn delete_job(&self, id: &str) -> Result<bool, StorageError> {
        let removed = self.state.lock().jobs.remove(id);
        if removed.is_some() {
            self.unlink("jobs", id)?;
        }
        Ok(removed.is_some())
    }

    /// All jobs, newest submission first.
    pub fn jobs(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.state.lock().jobs.values().cloned().collect();
        jobs.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        jobs
    }

    /// Queued jobs in dispatch order: priority descending, then oldest
    /// submission first. This is the sole queue view the dispatcher consumes.
    pub fn pending_jobs(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .state
            .lock()
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Queued)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| {
            b.priority.cmp(&a.priority).then(a.submitted_at.cmp(&b.submitted_at))
        });
        jobs
    }

    /// Jobs referencing a worker, optionally filtered by status.
    pub fn jobs_for_worker(&self, worker_id: &WorkerId, statuses: Option<&[JobStatus]>) -> Vec<Job> {
        self.state
            .lock()
            .jobs
            .values()
            .filter(|j| j.assigned_worker.as_ref() == Some(worker_id))
            .filter(|j| statuses.map_or(true, |s| s.contains(&j.status)))
            .cloned()
            .collect()
    }

    /// True when any job holds the worker in an active state.
    pub fn worker_has_active_jobs(&self, worker_id: &WorkerId) -> bool {
        self.state
            .lock()
            .jobs
            .values()
            .any(|j| j.assigned_worker.as_ref() == Some(worker_id) && j.is_active())
    }

    /// Ids of terminal jobs older than `cutoff_ms`, oldest first, skipping
    /// the `keep_count` most recent terminal jobs. Non-terminal jobs are
    /// never returned.
    pub fn cleanup_candidates(&self, cutoff_ms: u64, keep_count: usize) -> Vec<JobId> {
        let mut terminal: Vec<(u64, JobId)> = self
            .state
            .lock()
            .jobs
            .values()
            .filter(|j| j.is_terminal())
            .map(|j| (j.completed_at.unwrap_or(j.submitted_at), j.id.clone()))
            .collect();
        // Newest first; everything beyond keep_count is a candidate if old enough
        terminal.sort_by(|a, b| b.0.cmp(&a.0));
        terminal
            .into_iter()
            .skip(keep_count)
            .filter(|(ts, _)| *ts < cutoff_ms)
            .map(|(_, id)| id)
            .collect()
    }
}
