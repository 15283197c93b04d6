// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync notification subscriber.
//!
//! Keeps a WebSocket to the primary's workers topic and raises the
//! sync-pending flag when a `sync_available` frame arrives for a revision
//! we do not already hold. A polling fallback covers the periods where the
//! socket cannot stay connected.

use crate::client::PrimaryClient;
use armada_wire::SocketFrame;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

const RECONNECT_MIN: Duration = Duration::from_secs(1);
const RECONNECT_MAX: Duration = Duration::from_secs(30);

/// Default interval for the HTTP polling fallback.
pub const POLL_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Shared flag raised by the notifier and consumed by the main loop.
#[derive(Clone, Default)]
pub struct SyncPending(Arc<AtomicBool>);

impl SyncPending {
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Consume the flag, returning whether it was raised.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Run the WebSocket subscriber until cancelled, reconnecting with capped
/// backoff.
pub async fn run_subscriber(
    url: String,
    pending: SyncPending,
    local_revision: Arc<Mutex<Option<String>>>,
    cancel: CancellationToken,
) {
    let mut backoff = RECONNECT_MIN;
    loop {
        if cancel.is_cancelled() {
            break;
        }
        match tokio_tungstenite::connect_async(&url).await {
            Ok((mut socket, _)) => {
                tracing::info!(%url, "sync notification channel connected");
                backoff = RECONNECT_MIN;

                let join = serde_json::to_string(&SocketFrame::JoinWorkers).unwrap_or_default();
                if let Err(err) = socket.send(Message::text(join)).await {
                    tracing::warn!(error = %err, "join_workers send failed");
                }

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            let _ = socket.close(None).await;
                            return;
                        }
                        frame = socket.next() => match frame {
                            Some(Ok(Message::Text(text))) => {
                                handle_frame(&text, &pending, &local_revision);
                            }
                            Some(Ok(Message::Ping(payload))) => {
                                let _ = socket.send(Message::Pong(payload)).await;
                            }
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(err)) => {
                                tracing::warn!(error = %err, "sync notification read failed");
                                break;
                            }
                        }
                    }
                }
                tracing::info!("sync notification channel disconnected");
            }
            Err(err) => {
                tracing::debug!(error = %err, "sync notification connect failed");
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(backoff) => {}
        }
        backoff = (backoff * 2).min(RECONNECT_MAX);
    }
}

fn handle_frame(
    text: &str,
    pending: &SyncPending,
    local_revision: &Arc<Mutex<Option<String>>>,
) {
    match serde_json::from_str::<SocketFrame>(text) {
        Ok(SocketFrame::SyncAvailable { revision, short_revision }) => {
            // A notification for the revision we already hold is a no-op.
            if local_revision.lock().as_deref() == Some(revision.as_str()) {
                tracing::debug!(revision = %short_revision, "already at notified revision");
                return;
            }
            tracing::info!(revision = %short_revision, "sync notification received");
            pending.raise();
        }
        Ok(SocketFrame::JoinWorkers) => {}
        Err(err) => {
            tracing::debug!(error = %err, "ignoring malformed notification frame");
        }
    }
}

/// HTTP polling fallback: compares the server revision with ours on an
/// interval and raises the flag on mismatch.
pub async fn run_polling_fallback(
    client: Arc<PrimaryClient>,
    pending: SyncPending,
    local_revision: Arc<Mutex<Option<String>>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        match client.revision().await {
            Ok(info) => {
                let stale = local_revision.lock().as_deref() != Some(info.revision.as_str());
                if stale {
                    tracing::debug!(
                        revision = %info.short_revision,
                        "revision change detected by polling fallback"
                    );
                    pending.raise();
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "sync poll failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
