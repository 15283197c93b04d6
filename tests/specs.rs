// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level scenario tests exercising the primary's coordination
//! subsystem end to end (registry → queue → dispatcher → completion),
//! without real playbook subprocesses.

use armada_core::{
    builtin_roles, check_permission, Clock, FakeClock, JobSpec, JobStatus, Role, User, Worker,
    WorkerStatus, LOCAL_WORKER_ID,
};
use armada_primary::content::ContentStore;
use armada_primary::engine::{Engine, EngineConfig};
use armada_primary::external::NoopExternal;
use armada_primary::logs::LogBroker;
use armada_primary::notify::NotifyHub;
use armada_storage::{AuditLog, RecordStore};
use armada_wire::{CompleteJobRequest, RegisterRequest, StartJobRequest, StreamLogRequest};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

const TOKEN: &str = "cluster-registration-token";

struct Cluster {
    engine: Engine<FakeClock>,
    clock: FakeClock,
    _dir: tempfile::TempDir,
}

fn cluster() -> Cluster {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RecordStore::open(dir.path().join("records")).unwrap());
    let content = Arc::new(ContentStore::open(dir.path().join("content")).unwrap());
    let broker = Arc::new(LogBroker::new(dir.path().join("logs")).unwrap());
    let clock = FakeClock::new();

    store.seed_builtin_roles(builtin_roles()).unwrap();
    store.upsert_worker(Worker::local(clock.epoch_ms())).unwrap();

    let engine = Engine::new(
        store,
        content,
        broker,
        Arc::new(NotifyHub::new()),
        Arc::new(AuditLog::new(dir.path())),
        Arc::new(NoopExternal),
        Arc::new(NoopExternal),
        EngineConfig { registration_token: TOKEN.into(), checkin_interval: 60 },
        clock.clone(),
    );
    Cluster { engine, clock, _dir: dir }
}

fn register(cluster: &Cluster, name: &str, tags: &[&str]) -> armada_core::WorkerId {
    cluster
        .engine
        .register_worker(&RegisterRequest {
            name: name.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            token: TOKEN.into(),
            max_concurrent: Some(1),
        })
        .unwrap()
        .worker_id
}

fn spec(playbook: &str, priority: u8, required: &[&str]) -> JobSpec {
    JobSpec {
        playbook: playbook.into(),
        priority,
        required_tags: required.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}

#[test]
fn pending_queue_orders_by_priority_then_submission_age() {
    let c = cluster();
    c.clock.set_epoch_ms(1_000); // 10:00
    c.engine.submit_job(spec("a", 25, &[]), "alice").unwrap();
    c.clock.set_epoch_ms(3_000); // 11:00
    c.engine.submit_job(spec("b", 90, &[]), "alice").unwrap();
    c.clock.set_epoch_ms(2_000); // 10:30
    c.engine.submit_job(spec("c", 50, &[]), "alice").unwrap();

    let pending = c.engine.store.pending_jobs();
    let playbooks: Vec<&str> = pending.iter().map(|j| j.playbook.as_str()).collect();
    assert_eq!(playbooks, ["b", "c", "a"]);
}

#[test]
fn required_tags_route_jobs_to_matching_workers() {
    let c = cluster();
    let w1 = register(&c, "w1", &["gpu", "net-a"]);
    let w2 = register(&c, "w2", &["cpu", "net-b"]);

    let j1 = c.engine.submit_job(spec("j1", 0, &["gpu"]), "alice").unwrap();
    let j2 = c.engine.submit_job(spec("j2", 0, &["cpu"]), "alice").unwrap();
    c.engine.dispatch_once();

    assert_eq!(c.engine.store.get_job(j1.id.as_str()).unwrap().assigned_worker, Some(w1.clone()));
    assert_eq!(c.engine.store.get_job(j2.id.as_str()).unwrap().assigned_worker, Some(w2.clone()));
    assert!(c.engine.store.get_worker(w1.as_str()).unwrap().current_jobs.contains(&j1.id));
    assert!(c.engine.store.get_worker(w2.as_str()).unwrap().current_jobs.contains(&j2.id));
}

// The local worker only receives work when every remote is full.
#[test]
fn local_executor_is_the_last_resort() {
    let c = cluster();
    let remote = register(&c, "r1", &[]);

    let first = c.engine.submit_job(spec("one", 0, &[]), "alice").unwrap();
    c.engine.dispatch_once();
    assert_eq!(
        c.engine.store.get_job(first.id.as_str()).unwrap().assigned_worker,
        Some(remote)
    );

    let second = c.engine.submit_job(spec("two", 0, &[]), "alice").unwrap();
    c.engine.dispatch_once();
    let assigned = c.engine.store.get_job(second.id.as_str()).unwrap().assigned_worker.unwrap();
    assert_eq!(assigned.as_str(), LOCAL_WORKER_ID);
}

// A quiet worker goes stale and its running job is recovered.
#[test]
fn stale_worker_jobs_are_requeued() {
    let c = cluster();
    let worker = register(&c, "w", &[]);
    let job = c.engine.submit_job(spec("x", 0, &[]), "alice").unwrap();
    c.engine.dispatch_once();
    c.engine
        .start_job(
            job.id.as_str(),
            &StartJobRequest { worker_id: worker.clone(), log_file: "x.log".into() },
        )
        .unwrap();

    c.clock.advance(Duration::from_secs(3600));
    c.engine.sweep_stale_workers();

    assert_eq!(c.engine.store.get_worker(worker.as_str()).unwrap().status, WorkerStatus::Stale);
    let recovered = c.engine.store.get_job(job.id.as_str()).unwrap();
    assert_eq!(recovered.status, JobStatus::Queued);
    assert!(recovered.assigned_worker.is_none());
    assert!(recovered.error_message.unwrap_or_default().contains("stale"));
}

// The full register → dispatch → start → stream → complete flow,
// with log persistence and stats.
#[tokio::test]
async fn full_execution_flow_on_the_primary() {
    let c = cluster();
    let worker = register(&c, "w", &[]);
    let initial = c.engine.store.get_worker(worker.as_str()).unwrap().stats.jobs_completed;

    let job = c.engine.submit_job(spec("hello", 0, &[]), "alice").unwrap();
    c.engine.dispatch_once();
    c.engine
        .start_job(
            job.id.as_str(),
            &StartJobRequest { worker_id: worker.clone(), log_file: "hello_x_1.log".into() },
        )
        .unwrap();
    c.engine
        .stream_log(
            job.id.as_str(),
            &StreamLogRequest {
                worker_id: worker.clone(),
                content: "Worker: w (abc)\n".into(),
                append: false,
            },
        )
        .unwrap();

    let response = c
        .engine
        .complete_job(
            job.id.as_str(),
            &CompleteJobRequest {
                worker_id: worker.clone(),
                exit_code: 0,
                log_file: "hello_x_1.log".into(),
                log_content: Some("Worker: w (abc)\nPLAY RECAP\n".into()),
                error_message: None,
                duration_seconds: 4.2,
                cmdb_facts: None,
                checkin: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(response.status, "completed");
    let finished = c.engine.store.get_job(job.id.as_str()).unwrap();
    assert_eq!(finished.status, JobStatus::Completed);
    assert_eq!(finished.exit_code, Some(0));
    assert_eq!(finished.log_file.as_deref(), Some("hello_x_1.log"));

    let record = c.engine.store.get_worker(worker.as_str()).unwrap();
    assert_eq!(record.stats.jobs_completed, initial + 1);

    let log = c.engine.broker.read_log("hello_x_1.log").unwrap();
    assert!(log.starts_with("Worker: w"));
}

// Hierarchical permissions with intentional reverse-prefix matching.
#[test]
fn permission_hierarchy_is_bidirectional() {
    let defs: HashMap<String, Role> = [(
        "srv".to_string(),
        Role {
            id: "srv".into(),
            name: "srv".into(),
            description: String::new(),
            permissions: vec!["playbooks.servers:*".into()],
            inherits: vec![],
            builtin: false,
        },
    )]
    .into();
    let user = User::new("u", vec!["srv".into()], 0);

    assert!(check_permission(&user, "playbooks.servers:run", &defs));
    assert!(!check_permission(&user, "playbooks.network:run", &defs));
    assert!(check_permission(&user, "playbooks:view", &defs));
}

// Registering the same name twice yields the same id and registered_at.
#[test]
fn reregistration_is_idempotent() {
    let c = cluster();
    let first = register(&c, "node", &["a"]);
    let before = c.engine.store.get_worker(first.as_str()).unwrap().registered_at;

    c.clock.advance(Duration::from_secs(100));
    let second = register(&c, "node", &["b"]);
    assert_eq!(first, second);
    assert_eq!(c.engine.store.get_worker(first.as_str()).unwrap().registered_at, before);
}

// Content commits are content-addressed.
#[test]
fn committing_identical_content_keeps_the_revision() {
    let c = cluster();
    use armada_primary::content::Change;

    let r1 = c
        .engine
        .content
        .commit(vec![("playbooks/a.yml".into(), Change::Write(b"- hosts: all\n".to_vec()))])
        .unwrap();
    let r2 = c
        .engine
        .content
        .commit(vec![("playbooks/a.yml".into(), Change::Write(b"- hosts: all\n".to_vec()))])
        .unwrap();
    assert_eq!(r1, r2);
}

// The local worker can never be deleted, even when idle.
#[test]
fn local_worker_is_permanent() {
    let c = cluster();
    assert!(c.engine.delete_worker(LOCAL_WORKER_ID, "admin").is_err());
    let local = c.engine.store.get_worker(LOCAL_WORKER_ID).unwrap();
    assert!(local.is_local());
    assert_eq!(local.priority_boost, armada_core::LOCAL_PRIORITY_BOOST);
}

// Invariant 1: active jobs and worker bookkeeping always agree.
#[test]
fn active_jobs_cross_reference_workers() {
    let c = cluster();
    register(&c, "w1", &[]);
    register(&c, "w2", &["gpu"]);
    for i in 0..4u8 {
        c.engine.submit_job(spec(&format!("p{i}"), i * 10, &[]), "alice").unwrap();
    }
    c.engine.dispatch_once();

    for job in c.engine.store.jobs() {
        if job.is_active() {
            let worker_id = job.assigned_worker.clone().unwrap();
            let worker = c.engine.store.get_worker(worker_id.as_str()).unwrap();
            assert!(worker.current_jobs.contains(&job.id));
        }
    }

    let mut seen: BTreeSet<String> = BTreeSet::new();
    for worker in c.engine.store.workers() {
        for job_id in &worker.current_jobs {
            assert!(seen.insert(job_id.to_string()), "job held by two workers");
            let job = c.engine.store.get_job(job_id.as_str()).unwrap();
            assert!(job.is_active());
        }
    }
}
