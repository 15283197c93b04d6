// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification hub: push channels for workers and the UI.
//!
//! Workers join the workers topic over the socket endpoint and receive
//! `sync_available` on every content commit; delivery is best-effort since
//! workers also poll. UI events (job completion, review-ready) fan out on a
//! separate topic.

use armada_wire::{SocketFrame, UiEvent};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

pub struct NotifyHub {
    workers: broadcast::Sender<SocketFrame>,
    events: broadcast::Sender<UiEvent>,
}

impl NotifyHub {
    pub fn new() -> Self {
        let (workers, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { workers, events }
    }

    /// Announce a new content revision to every connected worker.
    pub fn notify_sync(&self, revision: &str) {
        let frame = SocketFrame::SyncAvailable {
            revision: revision.to_string(),
            short_revision: armada_core::short(revision, 7).to_string(),
        };
        let receivers = self.workers.send(frame).unwrap_or(0);
        tracing::debug!(revision = %armada_core::short(revision, 7), receivers, "sync notification");
    }

    pub fn subscribe_workers(&self) -> broadcast::Receiver<SocketFrame> {
        self.workers.subscribe()
    }

    pub fn publish_event(&self, event: UiEvent) {
        let _ = self.events.send(event);
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
