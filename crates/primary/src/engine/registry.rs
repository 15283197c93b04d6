// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker registry: registration, check-in, removal.

use super::Engine;
use crate::error::ApiError;
use armada_core::{AuditEntry, Clock, JobStatus, Worker, WorkerId, WorkerStatus};
use armada_wire::{CheckinRequest, CheckinResponse, RegisterRequest, RegisterResponse};

impl<C: Clock> Engine<C> {
    /// Register a worker, validating the shared registration token.
    ///
    /// Re-registration with a known name updates the existing record in
    /// place and returns the same worker id, preserving `registered_at`
    /// and accumulated stats.
    pub fn register_worker(&self, req: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        if req.token != self.config.registration_token {
            return Err(ApiError::Unauthenticated);
        }
        if req.name.is_empty() {
            return Err(ApiError::BadRequest("worker name is required".into()));
        }
        if req.name == "local" || req.name == armada_core::LOCAL_WORKER_ID {
            return Err(ApiError::Conflict(format!("worker name '{}' is reserved", req.name)));
        }

        let now = self.now_ms();
        let worker_id = match self.store.find_worker_by_name(&req.name) {
            Some(existing) => {
                self.store.update_worker(existing.id.as_str(), |w| {
                    w.tags = req.tags.clone();
                    w.status = WorkerStatus::Online;
                    w.last_checkin = now;
                    if let Some(mc) = req.max_concurrent {
                        w.max_concurrent = mc.max(1);
                    }
                })?;
                tracing::info!(worker = %existing.id, name = %req.name, "worker re-registered");
                existing.id
            }
            None => {
                let mut worker = Worker::new(&req.name, req.tags.clone(), now);
                if let Some(mc) = req.max_concurrent {
                    worker.max_concurrent = mc.max(1);
                }
                let id = worker.id.clone();
                self.store.upsert_worker(worker)?;
                tracing::info!(worker = %id, name = %req.name, "worker registered");
                id
            }
        };

        self.audit_entry(
            AuditEntry::new(now, &req.name, "worker.register").resource(worker_id.as_str()),
        );
        self.poke_dispatch();

        Ok(RegisterResponse { worker_id, checkin_interval: self.config.checkin_interval })
    }

    /// Apply a worker check-in: bump `last_checkin`, adopt whatever fields
    /// the worker reported, and tell it whether its content is stale.
    pub fn checkin_worker(
        &self,
        worker_id: &str,
        req: &CheckinRequest,
    ) -> Result<CheckinResponse, ApiError> {
        let now = self.now_ms();
        let current_revision = self.content.current_revision();

        let sync_needed = self
            .store
            .update_worker(worker_id, |w| {
                w.last_checkin = now;
                if let Some(rev) = &req.sync_revision {
                    w.sync_revision = Some(rev.clone());
                }
                if let Some(stats) = &req.stats {
                    w.stats.merge_gauges(stats);
                }
                if let Some(status) = req.status {
                    w.status = status;
                }
                if let Some(mc) = req.max_concurrent {
                    w.max_concurrent = mc.max(1);
                }
                w.sync_revision.as_deref() != Some(current_revision.as_str())
            })?
            .ok_or_else(|| ApiError::NotFound(format!("worker {worker_id}")))?;

        // The worker may have just come back online with free capacity.
        self.poke_dispatch();

        Ok(CheckinResponse {
            next_checkin_seconds: self.config.checkin_interval,
            sync_needed,
            current_revision,
        })
    }

    /// Remove a worker record. The local worker and workers with active
    /// jobs are refused.
    pub fn delete_worker(&self, worker_id: &str, actor: &str) -> Result<(), ApiError> {
        let worker = self
            .store
            .get_worker(worker_id)
            .ok_or_else(|| ApiError::NotFound(format!("worker {worker_id}")))?;
        if worker.is_local() {
            return Err(ApiError::Conflict("the local worker cannot be deleted".into()));
        }
        let id = WorkerId::from(worker_id);
        if self.store.worker_has_active_jobs(&id) {
            return Err(ApiError::Conflict(format!(
                "worker {} has jobs in assigned or running state",
                worker.name
            )));
        }
        self.store.delete_worker(worker_id)?;
        self.audit_entry(
            AuditEntry::new(self.now_ms(), actor, "worker.delete").resource(worker_id),
        );
        Ok(())
    }

    /// Jobs currently assigned to a worker, for the worker poll endpoint.
    pub fn assigned_jobs(&self, worker_id: &str) -> Result<Vec<armada_core::Job>, ApiError> {
        let worker = self
            .store
            .get_worker(worker_id)
            .ok_or_else(|| ApiError::NotFound(format!("worker {worker_id}")))?;
        Ok(self.store.jobs_for_worker(&worker.id, Some(&[JobStatus::Assigned])))
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
