// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP listener: one module per resource, thin translation onto the
//! engine. Public endpoints (login, session probe, health) are the only
//! routes that skip the guard.

mod auth_routes;
mod cluster;
mod jobs;
mod playbooks;
mod sync_routes;
mod workers;
mod ws;

use crate::engine::Engine;
use armada_core::SystemClock;
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;

/// The engine as shared by every handler.
pub type SharedEngine = Arc<Engine<SystemClock>>;

/// Build the full API router.
pub fn router(engine: SharedEngine) -> Router {
    Router::new()
        // Public
        .route("/api/health", get(cluster::health))
        .route("/api/auth/login", post(auth_routes::login))
        .route("/api/auth/logout", post(auth_routes::logout))
        .route("/api/auth/session", get(auth_routes::session))
        // Users, roles, tokens
        .route("/api/users", get(auth_routes::list_users).post(auth_routes::create_user))
        .route(
            "/api/users/:username",
            get(auth_routes::get_user)
                .put(auth_routes::update_user)
                .delete(auth_routes::delete_user),
        )
        .route("/api/roles", get(auth_routes::list_roles).post(auth_routes::create_role))
        .route("/api/roles/:id", put(auth_routes::update_role).delete(auth_routes::delete_role))
        .route("/api/tokens", get(auth_routes::list_tokens).post(auth_routes::create_token))
        .route("/api/tokens/:id", delete(auth_routes::delete_token))
        // Playbooks
        .route("/api/playbooks", get(playbooks::list))
        // Jobs
        .route("/api/jobs", get(jobs::list).post(jobs::submit))
        .route("/api/jobs/cleanup", post(jobs::cleanup))
        .route("/api/jobs/:id", get(jobs::get_job))
        .route("/api/jobs/:id/status", post(jobs::update_status))
        .route("/api/jobs/:id/cancel", post(jobs::cancel))
        .route("/api/jobs/:id/log", get(jobs::log))
        .route("/api/jobs/:id/start", post(jobs::start))
        .route("/api/jobs/:id/log/stream", post(jobs::stream_log))
        .route("/api/jobs/:id/complete", post(jobs::complete))
        // Workers
        .route("/api/workers", get(workers::list))
        .route("/api/workers/register", post(workers::register))
        .route("/api/workers/:id", get(workers::get_worker).delete(workers::delete_worker))
        .route("/api/workers/:id/checkin", post(workers::checkin))
        .route("/api/workers/:id/jobs", get(workers::jobs))
        // Content sync
        .route("/api/sync/revision", get(sync_routes::revision))
        .route("/api/sync/manifest", get(sync_routes::manifest))
        .route("/api/sync/archive", get(sync_routes::archive))
        .route("/api/sync/file/*path", get(sync_routes::file))
        .route("/api/content/commit", post(sync_routes::commit))
        // Cluster
        .route("/api/cluster/status", get(cluster::status))
        // Sockets
        .route("/api/ws/workers", get(ws::workers_socket))
        .route("/api/ws/events", get(ws::events_socket))
        .with_state(engine)
}
