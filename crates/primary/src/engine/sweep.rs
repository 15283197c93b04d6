// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stale-worker sweep and job recovery.
//!
//! A non-local worker that misses check-ins for more than twice the
//! check-in interval is marked stale, and every job it held in `assigned`
//! or `running` state returns to the queue with an explanatory error
//! message. The local worker is immune.

use super::Engine;
use armada_core::{Clock, JobStatus, WorkerStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

impl<C: Clock> Engine<C> {
    /// One sweep pass. Returns the ids of workers newly marked stale.
    pub fn sweep_stale_workers(&self) -> Vec<armada_core::WorkerId> {
        let now = self.now_ms();
        let threshold_ms = 2 * self.config.checkin_interval * 1000;
        let mut newly_stale = Vec::new();

        for worker in self.store.workers() {
            if worker.is_local() || worker.status == WorkerStatus::Stale {
                continue;
            }
            if now.saturating_sub(worker.last_checkin) <= threshold_ms {
                continue;
            }

            let marked = self.store.update_worker(worker.id.as_str(), |w| {
                w.status = WorkerStatus::Stale;
                w.current_jobs.clear();
            });
            match marked {
                Ok(Some(())) => {}
                Ok(None) => continue,
                Err(err) => {
                    tracing::error!(worker = %worker.id, error = %err, "stale mark failed");
                    continue;
                }
            }
            tracing::warn!(
                worker = %worker.id,
                name = %worker.name,
                last_checkin = worker.last_checkin,
                "worker went stale"
            );

            self.recover_jobs_from(&worker.id, &worker.name);
            newly_stale.push(worker.id);
        }

        if !newly_stale.is_empty() {
            self.poke_dispatch();
        }
        newly_stale
    }

    /// Requeue every active job held by a worker that was just marked
    /// stale. Only the sweep calls this, which keeps the job state machine
    /// single-writer.
    fn recover_jobs_from(&self, worker_id: &armada_core::WorkerId, worker_name: &str) {
        let active = self
            .store
            .jobs_for_worker(worker_id, Some(&[JobStatus::Assigned, JobStatus::Running]));
        for job in active {
            let reason =
                format!("worker '{worker_name}' became stale; job requeued for dispatch");
            let result = self.store.update_job(job.id.as_str(), |j| j.requeue(reason));
            match result {
                Ok(Some(())) => {
                    tracing::info!(job = %job.id.short(8), worker = %worker_id, "job recovered from stale worker");
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(job = %job.id, error = %err, "job recovery failed");
                }
            }
        }
    }
}

/// Background sweep task. The interval stays at half the check-in interval
/// so a worker is detected within one extra period of going quiet.
pub async fn run_sweep<C: Clock>(engine: Arc<Engine<C>>, cancel: CancellationToken) {
    let interval = Duration::from_secs((engine.config.checkin_interval / 2).max(1));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        let stale = engine.sweep_stale_workers();
        if !stale.is_empty() {
            tracing::warn!(count = stale.len(), "stale sweep marked workers");
        }
    }
    tracing::info!("stale sweep stopped");
}

#[cfg(test)]
#[path = "sweep_tests.rs"]
mod tests;
