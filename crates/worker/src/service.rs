// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker service: lifecycle state machine and main coordination loop.
//!
//! `STARTING → REGISTERING → SYNCING → IDLE ↔ BUSY → STOPPING`, with
//! `ERROR` reachable from any state on unrecoverable failure. The main
//! loop is single-threaded and cooperative: it only suspends on its own
//! timers and on network calls to the primary, never on subprocess output.

use crate::client::{ClientError, PrimaryClient};
use crate::config::WorkerConfig;
use crate::executor::{HttpControlPlane, JobRunner};
use crate::notify::{self, SyncPending, POLL_CHECK_INTERVAL};
use crate::stats;
use crate::sync::ContentSync;
use armada_core::{JobId, WorkerId, WorkerStatus};
use armada_wire::{ActiveJob, CheckinRequest};
use chrono::Local;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const TICK: Duration = Duration::from_secs(1);
const BACKOFF_MIN: Duration = Duration::from_secs(2);
const BACKOFF_MAX: Duration = Duration::from_secs(60);
const DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

/// Worker lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Starting,
    Registering,
    Syncing,
    Idle,
    Busy,
    Stopping,
    Error,
}

armada_core::simple_display! {
    WorkerState {
        Starting => "starting",
        Registering => "registering",
        Syncing => "syncing",
        Idle => "idle",
        Busy => "busy",
        Stopping => "stopping",
        Error => "error",
    }
}

/// Next retry delay: doubled, capped.
fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(BACKOFF_MAX)
}

pub struct WorkerService {
    config: WorkerConfig,
    client: Arc<PrimaryClient>,
    sync: ContentSync,
    state: WorkerState,
    worker_id: Option<WorkerId>,
    /// job id → started timestamp (RFC 3339), for check-in summaries
    active: Arc<Mutex<HashMap<JobId, String>>>,
    seen_jobs: HashSet<JobId>,
    pending_sync: SyncPending,
    /// Mirror of the sync revision, shared with the notifier tasks
    shared_revision: Arc<Mutex<Option<String>>>,
    /// Raised by job tasks on completion to pull the next check-in forward
    checkin_nudge: Arc<AtomicBool>,
}

impl WorkerService {
    pub fn new(config: WorkerConfig) -> Result<Self, ClientError> {
        let client = Arc::new(PrimaryClient::new(&config.server_url, &config.ssl_verify)?);
        let sync = ContentSync::new(&config.content_dir);
        Ok(Self {
            config,
            client,
            sync,
            state: WorkerState::Starting,
            worker_id: None,
            active: Arc::new(Mutex::new(HashMap::new())),
            seen_jobs: HashSet::new(),
            pending_sync: SyncPending::default(),
            shared_revision: Arc::new(Mutex::new(None)),
            checkin_nudge: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    fn set_state(&mut self, state: WorkerState) {
        if self.state != state {
            tracing::info!(from = %self.state, to = %state, "state");
            self.state = state;
        }
    }

    /// Run to completion: startup, main loop, drain. Returns an error only
    /// for unrecoverable startup failures.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), ClientError> {
        tracing::info!(
            worker = %self.config.worker_name,
            server = %self.config.server_url,
            tags = ?self.config.tags,
            "worker service starting"
        );

        if !self.wait_for_primary(&cancel).await {
            return Ok(());
        }
        if !self.register(&cancel).await {
            return Ok(());
        }
        self.initial_sync(&cancel).await?;

        let notify_cancel = cancel.child_token();
        tokio::spawn(notify::run_subscriber(
            self.client.notify_url(),
            self.pending_sync.clone(),
            self.shared_revision.clone(),
            notify_cancel.clone(),
        ));
        tokio::spawn(notify::run_polling_fallback(
            self.client.clone(),
            self.pending_sync.clone(),
            self.shared_revision.clone(),
            POLL_CHECK_INTERVAL,
            notify_cancel.clone(),
        ));

        self.main_loop(&cancel).await;

        notify_cancel.cancel();
        self.shutdown().await;
        Ok(())
    }

    /// Health-check the primary with capped exponential backoff.
    async fn wait_for_primary(&mut self, cancel: &CancellationToken) -> bool {
        let mut backoff = BACKOFF_MIN;
        loop {
            if self.client.health_check().await {
                tracing::info!("primary is reachable");
                return true;
            }
            tracing::warn!(retry_in_s = backoff.as_secs(), "primary unreachable");
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = next_backoff(backoff);
        }
    }

    /// Register, retrying with backoff until accepted or cancelled.
    async fn register(&mut self, cancel: &CancellationToken) -> bool {
        self.set_state(WorkerState::Registering);
        let mut backoff = BACKOFF_MIN;
        loop {
            let attempt = self
                .client
                .register(
                    &self.config.worker_name,
                    &self.config.tags,
                    &self.config.registration_token,
                    self.config.max_concurrent_jobs,
                )
                .await;
            match attempt {
                Ok(response) => {
                    tracing::info!(
                        worker_id = %response.worker_id,
                        checkin_interval = response.checkin_interval,
                        "registered"
                    );
                    self.worker_id = Some(response.worker_id);
                    return true;
                }
                Err(err) => {
                    tracing::warn!(error = %err, retry_in_s = backoff.as_secs(), "registration failed");
                }
            }
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = next_backoff(backoff);
        }
    }

    /// First sync is always a full sync.
    async fn initial_sync(&mut self, cancel: &CancellationToken) -> Result<(), ClientError> {
        self.set_state(WorkerState::Syncing);
        self.sync.ensure_directories().map_err(ClientError::Io)?;

        let mut backoff = BACKOFF_MIN;
        loop {
            match self.sync.sync(&self.client, true).await {
                Ok(outcome) => {
                    *self.shared_revision.lock() = outcome.revision.clone();
                    tracing::info!(
                        files = outcome.files_synced,
                        revision = %outcome.revision.as_deref().map(|r| armada_core::short(r, 7)).unwrap_or("none"),
                        "initial sync complete"
                    );
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!(error = %err, retry_in_s = backoff.as_secs(), "initial sync failed");
                }
            }
            if cancel.is_cancelled() {
                return Ok(());
            }
            tokio::time::sleep(backoff).await;
            backoff = next_backoff(backoff);
        }
    }

    async fn main_loop(&mut self, cancel: &CancellationToken) {
        self.set_state(WorkerState::Idle);

        // None means "never", which is always due.
        let mut last_checkin: Option<Instant> = None;
        let mut last_sync_check = Some(Instant::now());
        let mut last_poll: Option<Instant> = None;

        let checkin_interval = Duration::from_secs(self.config.checkin_interval);
        let sync_interval = Duration::from_secs(self.config.sync_interval);
        let poll_interval = Duration::from_secs(self.config.poll_interval);
        let due = |last: Option<Instant>, interval: Duration| {
            last.map_or(true, |at| at.elapsed() >= interval)
        };

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(TICK) => {}
            }

            let nudged = self.checkin_nudge.swap(false, Ordering::SeqCst);
            if nudged || due(last_checkin, checkin_interval) {
                self.checkin().await;
                last_checkin = Some(Instant::now());
            }

            if self.pending_sync.take() || due(last_sync_check, sync_interval) {
                self.check_sync().await;
                last_sync_check = Some(Instant::now());
            }

            if due(last_poll, poll_interval) {
                self.poll_jobs().await;
                last_poll = Some(Instant::now());
            }

            let busy = !self.active.lock().is_empty();
            self.set_state(if busy { WorkerState::Busy } else { WorkerState::Idle });
        }
    }

    fn reported_status(&self) -> WorkerStatus {
        if self.active.lock().is_empty() {
            WorkerStatus::Online
        } else {
            WorkerStatus::Busy
        }
    }

    fn checkin_body(&self, status: WorkerStatus) -> CheckinRequest {
        let active_jobs = self
            .active
            .lock()
            .iter()
            .map(|(job_id, started)| ActiveJob {
                job_id: job_id.clone(),
                status: "running".to_string(),
                started: Some(started.clone()),
            })
            .collect();
        CheckinRequest {
            sync_revision: self.sync.local_revision().map(str::to_string),
            stats: Some(stats::collect(&self.config.content_dir)),
            status: Some(status),
            active_jobs: Some(active_jobs),
            max_concurrent: Some(self.config.max_concurrent_jobs),
        }
    }

    async fn checkin(&mut self) {
        let Some(worker_id) = self.worker_id.clone() else {
            return;
        };
        let body = self.checkin_body(self.reported_status());
        match self.client.checkin(&worker_id, &body).await {
            Ok(response) => {
                if response.sync_needed {
                    self.pending_sync.raise();
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "check-in failed");
            }
        }
    }

    /// Compare revisions and sync if behind. An incremental failure falls
    /// back to a full sync inside [`ContentSync::sync`].
    async fn check_sync(&mut self) {
        let previous = self.state;
        match self.sync.check_sync_needed(&self.client).await {
            Ok((false, _)) => return,
            Ok((true, server_revision)) => {
                tracing::info!(
                    server = %armada_core::short(&server_revision, 7),
                    "content update detected"
                );
            }
            Err(err) => {
                tracing::warn!(error = %err, "sync check failed");
                return;
            }
        }

        self.set_state(WorkerState::Syncing);
        match self.sync.sync(&self.client, false).await {
            Ok(outcome) => {
                *self.shared_revision.lock() = outcome.revision.clone();
                tracing::info!(files = outcome.files_synced, "sync complete");
            }
            Err(err) => {
                tracing::warn!(error = %err, "sync failed");
            }
        }
        self.set_state(previous);
    }

    /// Fetch assigned jobs and spawn a task per job, within capacity.
    async fn poll_jobs(&mut self) {
        let Some(worker_id) = self.worker_id.clone() else {
            return;
        };
        let capacity = self.config.max_concurrent_jobs as usize;
        let in_flight = self.active.lock().len();
        if in_flight >= capacity {
            return;
        }

        let response = match self.client.assigned_jobs(&worker_id).await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(error = %err, "job poll failed");
                return;
            }
        };

        let available = capacity - in_flight;
        let fresh: Vec<_> = response
            .jobs
            .into_iter()
            .filter(|job| !self.seen_jobs.contains(&job.id))
            .take(available)
            .collect();

        for job in fresh {
            self.seen_jobs.insert(job.id.clone());
            self.spawn_job(job, worker_id.clone());
        }
    }

    fn spawn_job(&self, job: armada_core::Job, worker_id: WorkerId) {
        tracing::info!(job = %job.id.short(8), playbook = %job.playbook, "executing job");
        let runner = JobRunner::new(
            worker_id.clone(),
            &self.config.worker_name,
            &self.config.content_dir,
            &self.config.logs_dir,
        );
        let control =
            Arc::new(HttpControlPlane { client: self.client.clone(), worker_id });
        let active = self.active.clone();
        let nudge = self.checkin_nudge.clone();

        active.lock().insert(job.id.clone(), Local::now().to_rfc3339());
        tokio::spawn(async move {
            let result = runner.run(&job, control).await;
            active.lock().remove(&result.job_id);
            // Pull the next check-in forward so the primary sees the freed
            // slot promptly.
            nudge.store(true, Ordering::SeqCst);
        });
    }

    /// Drain active jobs (bounded), then report offline.
    async fn shutdown(&mut self) {
        self.set_state(WorkerState::Stopping);
        let deadline = Instant::now() + DRAIN_TIMEOUT;
        while !self.active.lock().is_empty() {
            if Instant::now() >= deadline {
                let remaining = self.active.lock().len();
                tracing::warn!(remaining, "drain timeout; jobs may still be running");
                break;
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }

        if let Some(worker_id) = self.worker_id.clone() {
            let body = self.checkin_body(WorkerStatus::Offline);
            if let Err(err) = self.client.checkin(&worker_id, &body).await {
                tracing::warn!(error = %err, "final check-in failed");
            }
        }
        tracing::info!("worker service stopped");
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
