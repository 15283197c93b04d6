// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion pipeline: everything that happens when a worker reports a
//! job finished.
//!
//! Only the state transition (step 3) is authoritative; log persistence,
//! stats, CMDB forwarding, the piggybacked check-in, and the review
//! webhook are best-effort and never roll it back.

use super::Engine;
use crate::error::ApiError;
use armada_core::{Clock, JobStatus, WorkerStatus};
use armada_wire::{
    CompleteJobRequest, CompleteJobResponse, StartJobRequest, StreamLogRequest, UiEvent,
};

impl<C: Clock> Engine<C> {
    /// Worker picked up an assigned job and is about to execute it.
    pub fn start_job(&self, job_id: &str, req: &StartJobRequest) -> Result<(), ApiError> {
        let now = self.now_ms();
        self.store
            .update_job(job_id, |job| {
                if job.assigned_worker.as_ref() != Some(&req.worker_id) {
                    return Err(ApiError::Conflict(format!(
                        "job {job_id} is not assigned to worker {}",
                        req.worker_id
                    )));
                }
                if !JobStatus::can_transition(job.status, JobStatus::Running) {
                    return Err(ApiError::Conflict(format!(
                        "job {job_id} cannot start from status {}",
                        job.status
                    )));
                }
                job.status = JobStatus::Running;
                job.started_at = Some(now);
                job.log_file = Some(req.log_file.clone());
                Ok(())
            })?
            .ok_or_else(|| ApiError::NotFound(format!("job {job_id}")))??;
        tracing::info!(job = %armada_core::short(job_id, 8), worker = %req.worker_id, "job started");
        Ok(())
    }

    /// Accept a streamed log chunk and fan it out to subscribers.
    pub fn stream_log(&self, job_id: &str, req: &StreamLogRequest) -> Result<(), ApiError> {
        let job = self
            .store
            .get_job(job_id)
            .ok_or_else(|| ApiError::NotFound(format!("job {job_id}")))?;
        if job.assigned_worker.as_ref() != Some(&req.worker_id) {
            return Err(ApiError::Conflict(format!(
                "job {job_id} is not assigned to worker {}",
                req.worker_id
            )));
        }
        self.broker.append_chunk(&job.id, &req.content, req.append)?;
        Ok(())
    }

    /// The full completion pipeline.
    pub async fn complete_job(
        &self,
        job_id: &str,
        req: &CompleteJobRequest,
    ) -> Result<CompleteJobResponse, ApiError> {
        // 1. The caller must be the worker the job is assigned to.
        let job = self
            .store
            .get_job(job_id)
            .ok_or_else(|| ApiError::NotFound(format!("job {job_id}")))?;
        if job.assigned_worker.as_ref() != Some(&req.worker_id) {
            return Err(ApiError::Conflict(format!(
                "job {job_id} is not assigned to worker {}",
                req.worker_id
            )));
        }

        let now = self.now_ms();

        // 2. Persist the final log; the partial is retired.
        let log_stored = match self.broker.finalize(&job.id, &req.log_file, req.log_content.as_deref())
        {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(job = %job.id.short(8), error = %err, "final log not stored");
                false
            }
        };

        // 3. Authoritative state transition. A job cancelled while running
        //    keeps its cancelled status; the exit details are still
        //    recorded for the log view.
        let success = req.exit_code == 0;
        let final_status = self
            .store
            .update_job(job_id, |j| {
                if j.status != JobStatus::Cancelled {
                    j.status = if success { JobStatus::Completed } else { JobStatus::Failed };
                }
                j.exit_code = Some(req.exit_code);
                j.error_message = req.error_message.clone();
                j.duration_seconds = Some(req.duration_seconds);
                j.completed_at = Some(now);
                j.log_file = Some(req.log_file.clone());
                j.status
            })?
            .ok_or_else(|| ApiError::NotFound(format!("job {job_id}")))?;

        // 4–5. Worker stats and detachment.
        let worker_stats_updated = self
            .store
            .update_worker(req.worker_id.as_str(), |w| {
                w.stats.record_completion(success, req.duration_seconds, now);
                w.current_jobs.remove(job_id);
                if w.status == WorkerStatus::Busy && w.has_capacity() {
                    w.status = WorkerStatus::Online;
                }
            })
            .map(|updated| updated.is_some())
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "worker stats update failed");
                false
            });

        // 6. CMDB facts, best-effort.
        let mut cmdb_facts_stored = false;
        if let Some(facts) = &req.cmdb_facts {
            cmdb_facts_stored = match self
                .cmdb
                .store_facts(&job.id, &job.playbook, now, facts)
                .await
            {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(job = %job.id.short(8), error = %err, "cmdb forward failed");
                    false
                }
            };
        }

        // 7. Piggybacked check-in.
        let mut checkin_processed = false;
        if let Some(checkin) = &req.checkin {
            checkin_processed = self.checkin_worker(req.worker_id.as_str(), checkin).is_ok();
        }

        // 8. Log-review webhook, fire-and-forget.
        let hook_result = self.review.job_finished(&job.id, req.exit_code).await;
        if let Err(err) = hook_result {
            tracing::debug!(job = %job.id.short(8), error = %err, "review webhook failed");
        }

        // 9. UI events.
        self.broker.publish_completed(&job.id, final_status, Some(req.exit_code));
        self.hub.publish_event(UiEvent::JobCompleted {
            job_id: job.id.clone(),
            status: final_status,
            exit_code: Some(req.exit_code),
        });
        self.hub.publish_event(UiEvent::ReviewReady { job_id: job.id.clone() });

        tracing::info!(
            job = %job.id.short(8),
            status = %final_status,
            exit_code = req.exit_code,
            duration_s = req.duration_seconds,
            "job completed"
        );

        // A slot was freed.
        self.poke_dispatch();

        Ok(CompleteJobResponse {
            status: final_status.to_string(),
            log_stored,
            worker_stats_updated,
            cmdb_facts_stored,
            checkin_processed,
        })
    }
}

#[cfg(test)]
#[path = "completion_tests.rs"]
mod tests;
