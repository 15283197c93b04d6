// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and shutdown.
//!
//! Startup order: storage, content store, log broker, built-in role seed,
//! local worker record, bootstrap admin, background tasks, HTTP listener.
//! Shutdown cancels the background tasks and drains the listener.

use crate::content::ContentStore;
use crate::engine::{
    run_dispatcher, run_local_executor, run_sweep, Engine, EngineConfig,
};
use crate::env::{self, ConfigError};
use crate::external::{CmdbSink, HttpCmdb, HttpReviewHook, NoopExternal, ReviewHook};
use crate::listener;
use crate::logs::LogBroker;
use crate::notify::NotifyHub;
use armada_core::{SystemClock, Worker, WorkerStatus, LOCAL_WORKER_ID};
use armada_storage::{AuditLog, RecordStore, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("content store error: {0}")]
    Content(#[from] crate::content::ContentError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the engine from the environment.
pub fn build_engine() -> Result<listener::SharedEngine, StartupError> {
    let state_dir = env::state_dir()?;
    std::fs::create_dir_all(&state_dir)?;

    let store = Arc::new(RecordStore::open(state_dir.join("records"))?);
    let content = Arc::new(ContentStore::open(env::content_dir(&state_dir))?);
    let broker = Arc::new(LogBroker::new(env::logs_dir(&state_dir))?);
    let audit = Arc::new(AuditLog::new(&state_dir));
    let hub = Arc::new(NotifyHub::new());

    let cmdb: Arc<dyn CmdbSink> = match env::cmdb_url() {
        Some(url) => Arc::new(HttpCmdb::new(url)),
        None => Arc::new(NoopExternal),
    };
    let review: Arc<dyn ReviewHook> = match env::review_webhook_url() {
        Some(url) => Arc::new(HttpReviewHook::new(url)),
        None => Arc::new(NoopExternal),
    };

    let config = EngineConfig {
        registration_token: env::registration_token()?,
        checkin_interval: env::checkin_interval(),
    };

    let engine = Arc::new(Engine::new(
        store, content, broker, hub, audit, cmdb, review, config, SystemClock,
    ));
    seed_records(&engine)?;
    Ok(engine)
}

/// Seed built-in roles, the local worker, and (on an empty user table) the
/// bootstrap admin.
fn seed_records(engine: &listener::SharedEngine) -> Result<(), StartupError> {
    engine.store.seed_builtin_roles(armada_core::builtin_roles())?;

    let now = engine.now_ms();
    match engine.store.get_worker(LOCAL_WORKER_ID) {
        Some(_) => {
            // Back online after a restart; any jobs it held are gone.
            engine.store.update_worker(LOCAL_WORKER_ID, |w| {
                w.status = WorkerStatus::Online;
                w.last_checkin = now;
                w.current_jobs.clear();
            })?;
        }
        None => {
            engine.store.upsert_worker(Worker::local(now))?;
        }
    }

    if engine.store.users().is_empty() {
        if let Some((username, password_hash)) = env::bootstrap_admin() {
            let mut admin = armada_core::User::new(&username, vec!["admin".to_string()], now);
            admin.password_hash = password_hash;
            engine.store.insert_user(admin)?;
            tracing::info!(%username, "bootstrap admin created");
        } else {
            tracing::warn!("no users exist and no bootstrap admin configured");
        }
    }
    Ok(())
}

/// Run the daemon until the cancellation token fires.
pub async fn run(
    engine: listener::SharedEngine,
    cancel: CancellationToken,
) -> Result<(), StartupError> {
    let addr = env::listen_addr()?;

    tokio::spawn(run_dispatcher(engine.clone(), cancel.child_token()));
    tokio::spawn(run_sweep(engine.clone(), cancel.child_token()));
    tokio::spawn(run_local_executor(engine.clone(), cancel.child_token()));

    let app = listener::router(engine.clone());
    let tcp = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "armadad listening");

    let shutdown = cancel.clone();
    axum::serve(tcp, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("armadad stopped");
    Ok(())
}
