// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket endpoints: the workers notification topic and the UI event
//! stream.

use super::SharedEngine;
use armada_core::JobId;
use armada_wire::{SocketFrame, UiEvent};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

/// Workers join here and receive `sync_available` on every content commit.
pub async fn workers_socket(
    State(engine): State<SharedEngine>,
    upgrade: WebSocketUpgrade,
) -> Response {
    upgrade.on_upgrade(move |socket| workers_loop(engine, socket))
}

async fn workers_loop(engine: SharedEngine, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();
    let mut frames = engine.hub.subscribe_workers();
    tracing::debug!("worker socket connected");

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(frame) => {
                    let Ok(text) = serde_json::to_string(&frame) else { continue };
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Sync frames are idempotent; the worker still polls.
                    tracing::debug!(skipped, "worker socket lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<SocketFrame>(&text) {
                        Ok(SocketFrame::JoinWorkers) => {
                            tracing::debug!("worker joined workers topic");
                        }
                        _ => {}
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }
    tracing::debug!("worker socket disconnected");
}

#[derive(Deserialize)]
pub struct EventsQuery {
    /// Subscribe to one job's log topic instead of the global event feed
    #[serde(default)]
    pub job: Option<String>,
}

/// UI event stream. With `?job=<id>` the subscriber receives the full
/// current log artifact as its first message, then live chunks, then the
/// completion event.
pub async fn events_socket(
    State(engine): State<SharedEngine>,
    Query(query): Query<EventsQuery>,
    upgrade: WebSocketUpgrade,
) -> Response {
    upgrade.on_upgrade(move |socket| events_loop(engine, query.job, socket))
}

async fn events_loop(engine: SharedEngine, job: Option<String>, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();

    let mut events = match &job {
        Some(job_id) => {
            let id = JobId::from(job_id.as_str());
            let final_name = engine.store.get_job(job_id).and_then(|j| j.log_file);
            let (catch_up, receiver) = engine.broker.subscribe(&id, final_name.as_deref());
            // Catch-up is delivered before any live chunk, with append=false
            // so the viewer starts from a clean slate.
            let first = UiEvent::LogChunk { job_id: id, content: catch_up, append: false };
            if let Ok(text) = serde_json::to_string(&first) {
                if sink.send(Message::Text(text)).await.is_err() {
                    return;
                }
            }
            receiver
        }
        None => engine.hub.subscribe_events(),
    };

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else { continue };
                    let done = matches!(event, UiEvent::JobCompleted { .. }) && job.is_some();
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                    if done {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event socket lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }
}
