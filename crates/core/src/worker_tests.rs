// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_worker_defaults() {
    let tags: BTreeSet<String> = ["gpu".to_string()].into();
    let worker = Worker::new("node-a", tags, 5_000);

    assert_eq!(worker.name, "node-a");
    assert_eq!(worker.status, WorkerStatus::Online);
    assert_eq!(worker.priority_boost, 0);
    assert!(!worker.is_local());
    assert!(worker.has_capacity());
    assert_eq!(worker.registered_at, 5_000);
    assert_eq!(worker.last_checkin, 5_000);
}

#[test]
fn local_worker_is_marked() {
    let local = Worker::local(1_000);
    assert_eq!(local.id, LOCAL_WORKER_ID);
    assert!(local.is_local());
    assert_eq!(local.priority_boost, LOCAL_PRIORITY_BOOST);
}

#[test]
fn capacity_accounts_for_current_jobs() {
    let mut worker = Worker::builder().max_concurrent(2).build();
    assert!(worker.has_capacity());

    worker.current_jobs.insert(JobId::from("j-1"));
    assert!(worker.has_capacity());

    worker.current_jobs.insert(JobId::from("j-2"));
    assert!(!worker.has_capacity());
}

#[test]
fn record_completion_running_mean() {
    let mut stats = WorkerStats::default();

    stats.record_completion(true, 10.0, 1);
    assert_eq!(stats.jobs_completed, 1);
    assert!((stats.avg_job_duration - 10.0).abs() < f64::EPSILON);

    stats.record_completion(false, 20.0, 2);
    assert_eq!(stats.jobs_failed, 1);
    assert!((stats.avg_job_duration - 15.0).abs() < f64::EPSILON);

    stats.record_completion(true, 30.0, 3);
    assert!((stats.avg_job_duration - 20.0).abs() < 1e-9);
    assert_eq!(stats.last_job_completed, Some(3));
}

#[test]
fn status_serde_snake_case() {
    assert_eq!(serde_json::to_string(&WorkerStatus::Stale).unwrap(), "\"stale\"");
    let s: WorkerStatus = serde_json::from_str("\"busy\"").unwrap();
    assert_eq!(s, WorkerStatus::Busy);
}

#[test]
fn worker_record_roundtrips_with_missing_optional_fields() {
    // Records written by older primaries may lack stats and sync fields.
    let json = r#"{
        "id": "w-1",
        "name": "node-a",
        "status": "online",
        "registered_at": 1,
        "last_checkin": 2
    }"#;
    let worker: Worker = serde_json::from_str(json).unwrap();
    assert_eq!(worker.max_concurrent, 1);
    assert!(worker.sync_revision.is_none());
    assert!(worker.current_jobs.is_empty());
}
