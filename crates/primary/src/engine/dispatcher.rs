// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher: match queued jobs to eligible workers.
//!
//! Triggered by queue or worker changes via [`Engine::poke_dispatch`], with
//! a periodic fallback tick. A job with no eligible worker stays queued and
//! never blocks later jobs; the scan continues independently.

use super::Engine;
use armada_core::{Clock, Job, JobStatus, Worker, WorkerStatus};
use std::cmp::Ordering;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fallback poll interval for the dispatcher loop.
const DISPATCH_TICK: Duration = Duration::from_secs(5);

impl<C: Clock> Engine<C> {
    /// One dispatch pass over the pending queue. Returns the number of
    /// assignments made. Idempotent: jobs already assigned are skipped.
    pub fn dispatch_once(&self) -> usize {
        let pending = self.store.pending_jobs();
        if pending.is_empty() {
            return 0;
        }
        let mut workers = self.store.workers();
        let mut assigned = 0;
        let mut local_woken = false;

        for job in pending {
            let Some(index) = best_worker(&workers, &job) else {
                continue;
            };
            let worker_id = workers[index].id.clone();
            let now = self.now_ms();

            // Re-check under the store update so a concurrent cancel or a
            // repeated pass cannot double-assign.
            let did_assign = self
                .store
                .update_job(job.id.as_str(), |j| {
                    if j.status != JobStatus::Queued {
                        return false;
                    }
                    j.assign(worker_id.clone(), now);
                    true
                })
                .unwrap_or(None)
                .unwrap_or(false);
            if !did_assign {
                continue;
            }

            let update = self.store.update_worker(worker_id.as_str(), |w| {
                w.current_jobs.insert(job.id.clone());
                if !w.has_capacity() && w.status == WorkerStatus::Online {
                    w.status = WorkerStatus::Busy;
                }
            });
            if let Err(err) = update {
                tracing::error!(error = %err, worker = %worker_id, "worker bookkeeping failed");
            }

            // Mirror the bookkeeping in our local snapshot for later jobs
            // in this same pass.
            workers[index].current_jobs.insert(job.id.clone());
            if !workers[index].has_capacity() {
                workers[index].status = WorkerStatus::Busy;
            }

            tracing::info!(
                job = %job.id.short(8),
                playbook = %job.playbook,
                worker = %worker_id,
                priority = job.priority,
                "job assigned"
            );
            if workers[index].is_local() {
                local_woken = true;
            }
            assigned += 1;
        }

        if local_woken {
            self.poke_local();
        }
        assigned
    }
}

/// Index of the best eligible worker for a job, if any.
fn best_worker(workers: &[Worker], job: &Job) -> Option<usize> {
    workers
        .iter()
        .enumerate()
        .filter(|(_, w)| eligible(w, job))
        .min_by(|(_, a), (_, b)| rank(a, job).cmp_for(&rank(b, job)))
        .map(|(index, _)| index)
}

/// A worker is eligible when it is reachable, has a free slot, and carries
/// every required tag. The local worker is always reachable.
fn eligible(worker: &Worker, job: &Job) -> bool {
    let reachable = worker.status == WorkerStatus::Online || worker.is_local();
    reachable && worker.has_capacity() && job.required_tags.is_subset(&worker.tags)
}

struct Rank<'a> {
    preferred_overlap: usize,
    priority_boost: i32,
    current_jobs: usize,
    load_1m: f64,
    id: &'a str,
}

impl Rank<'_> {
    /// Lower ranks win: more preferred-tag overlap, higher boost, fewer
    /// current jobs, lower load, then lexicographic id as the
    /// deterministic fallback.
    fn cmp_for(&self, other: &Self) -> Ordering {
        other
            .preferred_overlap
            .cmp(&self.preferred_overlap)
            .then(other.priority_boost.cmp(&self.priority_boost))
            .then(self.current_jobs.cmp(&other.current_jobs))
            .then(self.load_1m.partial_cmp(&other.load_1m).unwrap_or(Ordering::Equal))
            .then(self.id.cmp(other.id))
    }
}

fn rank<'a>(worker: &'a Worker, job: &Job) -> Rank<'a> {
    Rank {
        preferred_overlap: job.preferred_tags.intersection(&worker.tags).count(),
        priority_boost: worker.priority_boost,
        current_jobs: worker.current_jobs.len(),
        load_1m: worker.stats.load_1m,
        id: worker.id.as_str(),
    }
}

/// Background dispatcher task: runs on pokes and on a fallback tick.
pub async fn run_dispatcher<C: Clock>(
    engine: std::sync::Arc<Engine<C>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = engine.dispatch_notified() => {}
            _ = tokio::time::sleep(DISPATCH_TICK) => {}
        }
        let assigned = engine.dispatch_once();
        if assigned > 0 {
            tracing::debug!(assigned, "dispatch pass");
        }
    }
    tracing::info!("dispatcher stopped");
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
