// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The primary's co-located executor.
//!
//! Jobs assigned to `__local__` run through the very same
//! [`armada_worker::JobRunner`] codepath as on remote workers; only the
//! control plane differs: calls land on the engine directly instead of
//! going over HTTP.

use super::Engine;
use armada_core::{Clock, JobId, JobStatus, WorkerId, LOCAL_WORKER_ID};
use armada_worker::executor::{CompletionReport, ControlPlane, JobRunner};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const LOCAL_POLL_TICK: Duration = Duration::from_secs(2);

struct LocalControlPlane<C: Clock> {
    engine: Arc<Engine<C>>,
}

#[async_trait]
impl<C: Clock> ControlPlane for LocalControlPlane<C> {
    async fn job_started(&self, job_id: &JobId, log_file: &str) -> Result<(), String> {
        self.engine
            .start_job(
                job_id.as_str(),
                &armada_wire::StartJobRequest {
                    worker_id: WorkerId::from(LOCAL_WORKER_ID),
                    log_file: log_file.to_string(),
                },
            )
            .map_err(|e| e.to_string())
    }

    async fn stream_chunk(
        &self,
        job_id: &JobId,
        content: &str,
        append: bool,
    ) -> Result<(), String> {
        self.engine
            .stream_log(
                job_id.as_str(),
                &armada_wire::StreamLogRequest {
                    worker_id: WorkerId::from(LOCAL_WORKER_ID),
                    content: content.to_string(),
                    append,
                },
            )
            .map_err(|e| e.to_string())
    }

    async fn job_completed(&self, job_id: &JobId, report: CompletionReport) -> Result<(), String> {
        let body = armada_wire::CompleteJobRequest {
            worker_id: WorkerId::from(LOCAL_WORKER_ID),
            exit_code: report.exit_code,
            log_file: report.log_file,
            log_content: report.log_content,
            error_message: report.error_message,
            duration_seconds: report.duration_seconds,
            cmdb_facts: None,
            checkin: None,
        };
        self.engine
            .complete_job(job_id.as_str(), &body)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Background task executing jobs assigned to the local worker.
pub async fn run_local_executor<C: Clock>(engine: Arc<Engine<C>>, cancel: CancellationToken) {
    let in_flight: Arc<Mutex<HashSet<JobId>>> = Arc::new(Mutex::new(HashSet::new()));
    let local_id = WorkerId::from(LOCAL_WORKER_ID);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = engine.local_notified() => {}
            _ = tokio::time::sleep(LOCAL_POLL_TICK) => {}
        }

        let assigned = engine.store.jobs_for_worker(&local_id, Some(&[JobStatus::Assigned]));
        for job in assigned {
            if !in_flight.lock().insert(job.id.clone()) {
                continue;
            }
            let runner = JobRunner::new(
                local_id.clone(),
                "local",
                engine.content.root(),
                engine.broker.logs_dir(),
            );
            let control = Arc::new(LocalControlPlane { engine: engine.clone() });
            let in_flight = in_flight.clone();
            tracing::info!(job = %job.id.short(8), playbook = %job.playbook, "local execution");
            tokio::spawn(async move {
                let result = runner.run(&job, control).await;
                in_flight.lock().remove(&result.job_id);
            });
        }
    }
    tracing::info!("local executor stopped");
}
