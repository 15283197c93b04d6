// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The record store: in-memory maps with write-through persistence.

mod jobs;
mod roles;
mod tokens;
mod users;
mod workers;

use crate::records::{self, StorageError};
use armada_core::{ApiToken, Job, Role, TokenId, User, Worker, WorkerId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Default)]
pub(crate) struct StoreState {
    pub jobs: HashMap<armada_core::JobId, Job>,
    pub workers: HashMap<WorkerId, Worker>,
    /// Keyed by user id; usernames are enforced unique on insert
    pub users: HashMap<String, User>,
    pub roles: HashMap<String, Role>,
    pub tokens: HashMap<TokenId, ApiToken>,
}

/// File-backed store for all cluster records.
pub struct RecordStore {
    root: PathBuf,
    pub(crate) state: Mutex<StoreState>,
}

impl RecordStore {
    /// Open a store rooted at `root`, loading every existing record.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;

        let state = StoreState {
            jobs: records::load_dir(&root.join("jobs"), |j: &Job| j.id.clone())?,
            workers: records::load_dir(&root.join("workers"), |w: &Worker| w.id.clone())?,
            users: records::load_dir(&root.join("users"), |u: &User| u.id.clone())?,
            roles: records::load_dir(&root.join("roles"), |r: &Role| r.id.clone())?,
            tokens: records::load_dir(&root.join("tokens"), |t: &ApiToken| t.id.clone())?,
        };

        tracing::info!(
            jobs = state.jobs.len(),
            workers = state.workers.len(),
            users = state.users.len(),
            roles = state.roles.len(),
            tokens = state.tokens.len(),
            "record store loaded"
        );

        Ok(Self { root, state: Mutex::new(state) })
    }

    pub(crate) fn dir(&self, kind: &str) -> PathBuf {
        self.root.join(kind)
    }

    pub(crate) fn persist<T: serde::Serialize>(
        &self,
        kind: &str,
        id: &str,
        record: &T,
    ) -> Result<(), StorageError> {
        records::write_record(&self.dir(kind), id, record)
    }

    pub(crate) fn unlink(&self, kind: &str, id: &str) -> Result<(), StorageError> {
        records::remove_record(&self.dir(kind), id)
    }

    /// State directory this store is rooted at.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
#[path = "../store_tests.rs"]
mod tests;
