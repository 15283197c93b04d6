// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::SslVerify;
use std::collections::BTreeSet;
use std::path::PathBuf;

fn test_config(dir: &std::path::Path) -> WorkerConfig {
    WorkerConfig {
        worker_name: "node-a".into(),
        server_url: "http://127.0.0.1:9".into(),
        registration_token: "s3cret".into(),
        tags: BTreeSet::new(),
        checkin_interval: 60,
        sync_interval: 300,
        poll_interval: 5,
        max_concurrent_jobs: 2,
        content_dir: dir.join("content"),
        logs_dir: dir.join("logs"),
        ssl_verify: SslVerify::Enabled,
    }
}

#[test]
fn service_starts_in_starting_state() {
    let dir = tempfile::tempdir().unwrap();
    let service = WorkerService::new(test_config(dir.path())).unwrap();
    assert_eq!(service.state(), WorkerState::Starting);
}

#[test]
fn reported_status_follows_active_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let service = WorkerService::new(test_config(dir.path())).unwrap();
    assert_eq!(service.reported_status(), WorkerStatus::Online);

    service.active.lock().insert("j-1".into(), "2026-01-01T00:00:00Z".into());
    assert_eq!(service.reported_status(), WorkerStatus::Busy);
}

#[test]
fn checkin_body_carries_active_job_summaries() {
    let dir = tempfile::tempdir().unwrap();
    let service = WorkerService::new(test_config(dir.path())).unwrap();
    service.active.lock().insert("j-1".into(), "2026-01-01T00:00:00Z".into());

    let body = service.checkin_body(WorkerStatus::Busy);
    assert_eq!(body.status, Some(WorkerStatus::Busy));
    assert_eq!(body.max_concurrent, Some(2));
    let jobs = body.active_jobs.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].job_id, "j-1");
    assert_eq!(jobs[0].status, "running");
    // No sync has happened yet
    assert!(body.sync_revision.is_none());
    assert!(body.stats.is_some());
}

#[test]
fn backoff_doubles_and_caps() {
    let mut backoff = BACKOFF_MIN;
    let mut sequence = Vec::new();
    for _ in 0..7 {
        sequence.push(backoff.as_secs());
        backoff = next_backoff(backoff);
    }
    assert_eq!(sequence, vec![2, 4, 8, 16, 32, 60, 60]);
}

#[test]
fn state_display_is_lowercase() {
    assert_eq!(WorkerState::Starting.to_string(), "starting");
    assert_eq!(WorkerState::Busy.to_string(), "busy");
    assert_eq!(WorkerState::Stopping.to_string(), "stopping");
}

#[test]
fn worker_config_paths_are_respected() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    assert_eq!(config.content_dir, PathBuf::from(dir.path()).join("content"));
}
