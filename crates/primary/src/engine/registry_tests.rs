// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::engine::test_helpers::{register, tags, test_engine, TEST_TOKEN};
use crate::error::ApiError;
use armada_core::{Clock, JobStatus, WorkerStats, WorkerStatus, LOCAL_WORKER_ID};
use armada_wire::{CheckinRequest, RegisterRequest};

#[test]
fn register_creates_worker_online() {
    let fixture = test_engine();
    let id = register(&fixture.engine, "node-a", &["gpu"]);

    let worker = fixture.engine.store.get_worker(id.as_str()).unwrap();
    assert_eq!(worker.name, "node-a");
    assert_eq!(worker.status, WorkerStatus::Online);
    assert_eq!(worker.priority_boost, 0);
    assert!(worker.tags.contains("gpu"));
}

#[test]
fn register_rejects_bad_token() {
    let fixture = test_engine();
    let err = fixture
        .engine
        .register_worker(&RegisterRequest {
            name: "node-a".into(),
            tags: tags(&[]),
            token: "wrong".into(),
            max_concurrent: None,
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated));
}

#[test]
fn reregistration_keeps_id_and_registered_at() {
    let fixture = test_engine();
    let first = register(&fixture.engine, "node-a", &["gpu"]);
    let registered_at = fixture.engine.store.get_worker(first.as_str()).unwrap().registered_at;

    fixture.clock.advance(std::time::Duration::from_secs(500));
    let second = register(&fixture.engine, "node-a", &["cpu"]);

    assert_eq!(first, second);
    let worker = fixture.engine.store.get_worker(first.as_str()).unwrap();
    assert_eq!(worker.registered_at, registered_at);
    assert!(worker.tags.contains("cpu"));
    assert!(!worker.tags.contains("gpu"));
    assert_eq!(worker.last_checkin, fixture.clock.epoch_ms());
}

#[test]
fn reserved_names_rejected() {
    let fixture = test_engine();
    for name in ["local", LOCAL_WORKER_ID] {
        let err = fixture
            .engine
            .register_worker(&RegisterRequest {
                name: name.into(),
                tags: tags(&[]),
                token: TEST_TOKEN.into(),
                max_concurrent: None,
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }
}

#[test]
fn checkin_updates_fields_present() {
    let fixture = test_engine();
    let id = register(&fixture.engine, "node-a", &[]);
    fixture.clock.advance(std::time::Duration::from_secs(30));

    let response = fixture
        .engine
        .checkin_worker(
            id.as_str(),
            &CheckinRequest {
                sync_revision: Some("rev-1".into()),
                stats: Some(WorkerStats { load_1m: 0.5, cpu_percent: 12.0, ..Default::default() }),
                status: Some(WorkerStatus::Busy),
                active_jobs: None,
                max_concurrent: Some(4),
            },
        )
        .unwrap();

    assert_eq!(response.next_checkin_seconds, 60);
    // Reported revision differs from the (empty-bundle) current revision
    assert!(response.sync_needed);

    let worker = fixture.engine.store.get_worker(id.as_str()).unwrap();
    assert_eq!(worker.sync_revision.as_deref(), Some("rev-1"));
    assert_eq!(worker.status, WorkerStatus::Busy);
    assert_eq!(worker.max_concurrent, 4);
    assert!((worker.stats.load_1m - 0.5).abs() < f64::EPSILON);
    assert_eq!(worker.last_checkin, fixture.clock.epoch_ms());
}

#[test]
fn checkin_preserves_primary_counters() {
    let fixture = test_engine();
    let id = register(&fixture.engine, "node-a", &[]);
    fixture
        .engine
        .store
        .update_worker(id.as_str(), |w| w.stats.record_completion(true, 10.0, 1))
        .unwrap();

    fixture
        .engine
        .checkin_worker(
            id.as_str(),
            &CheckinRequest { stats: Some(WorkerStats::default()), ..Default::default() },
        )
        .unwrap();

    let worker = fixture.engine.store.get_worker(id.as_str()).unwrap();
    assert_eq!(worker.stats.jobs_completed, 1);
    assert!((worker.stats.avg_job_duration - 10.0).abs() < f64::EPSILON);
}

#[test]
fn checkin_sync_needed_false_when_current() {
    let fixture = test_engine();
    let id = register(&fixture.engine, "node-a", &[]);
    let current = fixture.engine.content.current_revision();

    let response = fixture
        .engine
        .checkin_worker(
            id.as_str(),
            &CheckinRequest { sync_revision: Some(current.clone()), ..Default::default() },
        )
        .unwrap();

    assert!(!response.sync_needed);
    assert_eq!(response.current_revision, current);
}

#[test]
fn checkin_unknown_worker_is_not_found() {
    let fixture = test_engine();
    let err = fixture.engine.checkin_worker("ghost", &CheckinRequest::default()).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn delete_refuses_local_worker() {
    let fixture = test_engine();
    let err = fixture.engine.delete_worker(LOCAL_WORKER_ID, "admin").unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[test]
fn delete_refuses_worker_with_active_jobs() {
    let fixture = test_engine();
    let id = register(&fixture.engine, "node-a", &[]);
    fixture
        .engine
        .store
        .insert_job(
            armada_core::Job::builder()
                .status(JobStatus::Running)
                .assigned_worker(id.clone())
                .build(),
        )
        .unwrap();

    let err = fixture.engine.delete_worker(id.as_str(), "admin").unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[test]
fn delete_removes_idle_worker() {
    let fixture = test_engine();
    let id = register(&fixture.engine, "node-a", &[]);
    fixture.engine.delete_worker(id.as_str(), "admin").unwrap();
    assert!(fixture.engine.store.get_worker(id.as_str()).is_none());
}
