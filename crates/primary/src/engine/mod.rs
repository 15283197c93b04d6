// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordination engine: registry, queue, dispatcher, sweep, completion.
//!
//! One [`Engine`] per primary, shared behind an `Arc` between the HTTP
//! listener and the background tasks. All record mutation funnels through
//! here; the listener modules only translate HTTP.

mod completion;
mod dispatcher;
mod local;
mod playbooks;
mod queue;
mod registry;
mod sweep;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use dispatcher::run_dispatcher;
pub use local::run_local_executor;
pub use playbooks::PlaybookEntry;
pub use queue::JobFilter;
pub use sweep::run_sweep;

use crate::auth::{LoginTracker, SessionMap};
use crate::content::ContentStore;
use crate::external::{CmdbSink, ReviewHook};
use crate::logs::LogBroker;
use crate::notify::NotifyHub;
use armada_core::{Clock, SystemClock};
use armada_storage::{AuditLog, RecordStore};
use std::sync::Arc;
use tokio::sync::Notify;

/// Tunables fixed at startup.
pub struct EngineConfig {
    /// Shared secret validated at worker registration
    pub registration_token: String,
    /// Seconds between expected worker check-ins
    pub checkin_interval: u64,
}

pub struct Engine<C: Clock = SystemClock> {
    pub store: Arc<RecordStore>,
    pub content: Arc<ContentStore>,
    pub broker: Arc<LogBroker>,
    pub hub: Arc<NotifyHub>,
    pub audit: Arc<AuditLog>,
    pub cmdb: Arc<dyn CmdbSink>,
    pub review: Arc<dyn ReviewHook>,
    pub sessions: SessionMap,
    pub tracker: LoginTracker,
    pub config: EngineConfig,
    clock: C,
    dispatch_notify: Notify,
    local_notify: Notify,
}

impl<C: Clock> Engine<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<RecordStore>,
        content: Arc<ContentStore>,
        broker: Arc<LogBroker>,
        hub: Arc<NotifyHub>,
        audit: Arc<AuditLog>,
        cmdb: Arc<dyn CmdbSink>,
        review: Arc<dyn ReviewHook>,
        config: EngineConfig,
        clock: C,
    ) -> Self {
        Self {
            store,
            content,
            broker,
            hub,
            audit,
            cmdb,
            review,
            sessions: SessionMap::default(),
            tracker: LoginTracker::default(),
            config,
            clock,
            dispatch_notify: Notify::new(),
            local_notify: Notify::new(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    /// Wake the dispatcher task: the pending queue or worker availability
    /// changed.
    pub fn poke_dispatch(&self) {
        self.dispatch_notify.notify_one();
    }

    pub(crate) async fn dispatch_notified(&self) {
        self.dispatch_notify.notified().await;
    }

    /// Wake the local executor: a job was assigned to `__local__`.
    pub fn poke_local(&self) {
        self.local_notify.notify_one();
    }

    pub(crate) async fn local_notified(&self) {
        self.local_notify.notified().await;
    }

    /// Emit an audit entry (best-effort).
    pub fn audit_entry(&self, entry: armada_core::AuditEntry) {
        self.audit.append(&entry);
    }
}
