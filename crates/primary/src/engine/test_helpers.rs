// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use super::{Engine, EngineConfig};
use crate::content::ContentStore;
use crate::external::NoopExternal;
use crate::logs::LogBroker;
use crate::notify::NotifyHub;
use armada_core::{Clock, FakeClock};
use armada_storage::{AuditLog, RecordStore};
use std::collections::BTreeSet;
use std::sync::Arc;

pub(crate) const TEST_TOKEN: &str = "test-registration-token";

pub(crate) struct TestEngine {
    pub engine: Engine<FakeClock>,
    pub clock: FakeClock,
    // Held for the lifetime of the fixture
    _dir: tempfile::TempDir,
}

pub(crate) fn test_engine() -> TestEngine {
    let dir = tempfile::tempdir().unwrap();
    let state_dir = dir.path().join("state");
    std::fs::create_dir_all(&state_dir).unwrap();

    let store = Arc::new(RecordStore::open(state_dir.join("records")).unwrap());
    let content = Arc::new(ContentStore::open(state_dir.join("content")).unwrap());
    let broker = Arc::new(LogBroker::new(state_dir.join("logs")).unwrap());
    let clock = FakeClock::new();

    store.seed_builtin_roles(armada_core::builtin_roles()).unwrap();
    store.upsert_worker(armada_core::Worker::local(clock.epoch_ms())).unwrap();

    let engine = Engine::new(
        store,
        content,
        broker,
        Arc::new(NotifyHub::new()),
        Arc::new(AuditLog::new(&state_dir)),
        Arc::new(NoopExternal),
        Arc::new(NoopExternal),
        EngineConfig { registration_token: TEST_TOKEN.into(), checkin_interval: 60 },
        clock.clone(),
    );

    TestEngine { engine, clock, _dir: dir }
}

pub(crate) fn tags(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn register(engine: &Engine<FakeClock>, name: &str, tag_names: &[&str]) -> armada_core::WorkerId {
    let response = engine
        .register_worker(&armada_wire::RegisterRequest {
            name: name.to_string(),
            tags: tags(tag_names),
            token: TEST_TOKEN.to_string(),
            max_concurrent: Some(1),
        })
        .unwrap();
    response.worker_id
}
