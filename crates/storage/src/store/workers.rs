// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker collection.

use super::RecordStore;
use crate::records::StorageError;
use armada_core::{Worker, WorkerId};

impl RecordStore {
    /// Insert or replace a worker record.
    pub fn upsert_worker(&self, worker: Worker) -> Result<(), StorageError> {
        self.persist("workers", worker.id.as_str(), &worker)?;
        self.state.lock().workers.insert(worker.id.clone(), worker);
        Ok(())
    }

    pub fn get_worker(&self, id: &str) -> Option<Worker> {
        self.state.lock().workers.get(id).cloned()
    }

    /// Look up a non-local worker by its unique name.
    pub fn find_worker_by_name(&self, name: &str) -> Option<Worker> {
        self.state
            .lock()
            .workers
            .values()
            .find(|w| !w.is_local() && w.name == name)
            .cloned()
    }

    /// Mutate a worker under the store lock and write the result through.
    pub fn update_worker<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Worker) -> R,
    ) -> Result<Option<R>, StorageError> {
        let mut state = self.state.lock();
        let Some(worker) = state.workers.get_mut(id) else {
            return Ok(None);
        };
        let result = f(worker);
        let snapshot = worker.clone();
        drop(state);
        self.persist("workers", snapshot.id.as_str(), &snapshot)?;
        Ok(Some(result))
    }

    pub fn delete_worker(&self, id: &str) -> Result<bool, StorageError> {
        let removed = self.state.lock().workers.remove(id);
        if removed.is_some() {
            self.unlink("workers", id)?;
        }
        Ok(removed.is_some())
    }

    /// All workers, most recently registered first.
    pub fn workers(&self) -> Vec<Worker> {
        let mut workers: Vec<Worker> = self.state.lock().workers.values().cloned().collect();
        workers.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        workers
    }
}
