// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use armada_core::Job;

fn runner(dir: &Path) -> JobRunner {
    JobRunner::new(
        WorkerId::from("worker-0001-long-id"),
        "test-worker",
        dir.join("content"),
        dir.join("logs"),
    )
}

#[test]
fn resolve_prefers_yml_then_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let playbooks = dir.path().join("content/playbooks");
    std::fs::create_dir_all(&playbooks).unwrap();
    let runner = runner(dir.path());

    std::fs::write(playbooks.join("deploy.yml"), b"x").unwrap();
    std::fs::write(playbooks.join("deploy.yaml"), b"x").unwrap();
    assert_eq!(runner.resolve_playbook("deploy"), playbooks.join("deploy.yml"));

    std::fs::write(playbooks.join("status.yaml"), b"x").unwrap();
    assert_eq!(runner.resolve_playbook("status"), playbooks.join("status.yaml"));
}

#[test]
fn resolve_explicit_extension_used_as_is() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(dir.path());
    assert_eq!(
        runner.resolve_playbook("deploy.yaml"),
        dir.path().join("content/playbooks/deploy.yaml")
    );
}

#[test]
fn resolve_missing_falls_back_to_as_given() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(dir.path());
    assert_eq!(
        runner.resolve_playbook("ghost"),
        dir.path().join("content/playbooks/ghost")
    );
}

#[test]
fn build_command_minimal() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(dir.path());
    let job = Job::builder().playbook("site").target("all").build();

    let cmd = runner.build_command(&job);
    assert_eq!(cmd[0], "ansible-playbook");
    assert!(cmd[1].ends_with("content/playbooks/site"));
    assert_eq!(cmd[2], "-i");
    assert!(cmd[3].ends_with("content/inventory/hosts"));
    assert_eq!(cmd.len(), 4);
}

#[test]
fn build_command_with_target_and_extra_vars() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(dir.path());
    let mut extra = std::collections::HashMap::new();
    extra.insert("version".to_string(), serde_json::json!("1.2.3"));
    let job = Job::builder().playbook("site").target("webservers").extra_vars(extra).build();

    let cmd = runner.build_command(&job);
    let limit = cmd.iter().position(|a| a == "-l").unwrap();
    assert_eq!(cmd[limit + 1], "webservers");
    let evars = cmd.iter().position(|a| a == "-e").unwrap();
    assert!(cmd[evars + 1].contains("\"version\":\"1.2.3\""));
}

#[test]
fn log_filename_shape() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(dir.path());
    let job = Job::builder().id("abcdef1234567890").playbook("deploy-app").build();

    let name = runner.log_filename(&job);
    assert!(name.starts_with("deploy-app_abcdef12_"));
    assert!(name.ends_with(".log"));
}

#[tokio::test]
async fn run_captures_output_and_reports_completion() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("content/playbooks")).unwrap();
    // `echo` prints its arguments and exits 0.
    let runner = runner(dir.path()).with_program("echo");
    let control = RecordingControl::new();
    let job = Job::builder().id("job-echo-1").playbook("noop").build();

    let result = runner.run(&job, control.clone()).await;

    assert_eq!(result.exit_code, 0);
    assert!(result.error_message.is_none());
    assert!(result.duration_seconds >= 0.0);

    let calls = control.calls.lock();
    assert!(matches!(&calls[0], RecordedCall::Started { log_file } if log_file.ends_with(".log")));
    // Header is the first streamed chunk with append=false.
    let RecordedCall::Chunk { content, append } = &calls[1] else {
        panic!("expected header chunk, got {:?}", calls[1]);
    };
    assert!(!append);
    assert!(content.starts_with("Worker: test-worker"));
    assert!(content.contains("Job ID: job-echo-1"));
    assert!(content.contains("Playbook: noop"));
    // The final call reports completion with the full log attached.
    assert!(matches!(
        calls.last().unwrap(),
        RecordedCall::Completed { report_exit: 0, had_content: true }
    ));

    // Local log file exists and carries header, output, and footer.
    let log = std::fs::read_to_string(dir.path().join("logs").join(&result.log_file)).unwrap();
    assert!(log.starts_with("Worker: test-worker"));
    assert!(log.contains("Exit Code: 0"));
}

#[tokio::test]
async fn trailing_output_streams_before_the_footer() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("content")).unwrap();
    // Two lines stay below the flush threshold until process exit.
    let script = dir.path().join("short.sh");
    std::fs::write(&script, b"#!/bin/sh\necho first line\necho last line\n").unwrap();
    make_executable(&script);
    let runner = runner(dir.path()).with_program(script.display().to_string());
    let control = RecordingControl::new();
    let job = Job::builder().playbook("noop").build();

    runner.run(&job, control.clone()).await;

    let chunks: Vec<String> = control
        .calls
        .lock()
        .iter()
        .filter_map(|c| match c {
            RecordedCall::Chunk { content, .. } => Some(content.clone()),
            _ => None,
        })
        .collect();
    let output_at = chunks.iter().position(|c| c.contains("last line")).unwrap();
    let footer_at = chunks.iter().position(|c| c.contains("Exit Code")).unwrap();
    assert!(output_at < footer_at, "buffered output must be streamed before the footer");
    // The footer is the final chunk on the wire.
    assert_eq!(footer_at, chunks.len() - 1);
}

#[tokio::test]
async fn missing_program_maps_to_127() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("content")).unwrap();
    let runner = runner(dir.path()).with_program("/definitely/not/ansible-playbook");
    let control = RecordingControl::new();
    let job = Job::builder().playbook("noop").build();

    let result = runner.run(&job, control).await;
    assert_eq!(result.exit_code, 127);
    assert_eq!(result.error_message.as_deref(), Some("ansible-playbook not found"));
}

#[tokio::test]
async fn non_executable_program_maps_to_126() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("content")).unwrap();
    let plain_file = dir.path().join("not-executable");
    std::fs::write(&plain_file, b"#!/bin/sh\n").unwrap();
    let runner = runner(dir.path()).with_program(plain_file.display().to_string());
    let control = RecordingControl::new();
    let job = Job::builder().playbook("noop").build();

    let result = runner.run(&job, control).await;
    assert_eq!(result.exit_code, 126);
    assert!(result.error_message.unwrap_or_default().starts_with("Permission denied"));
}

#[tokio::test]
async fn failing_program_exit_code_propagates() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("content")).unwrap();
    let script = dir.path().join("fail.sh");
    std::fs::write(&script, b"#!/bin/sh\necho boom >&2\nexit 3\n").unwrap();
    make_executable(&script);
    let runner = runner(dir.path()).with_program(script.display().to_string());
    let control = RecordingControl::new();
    let job = Job::builder().playbook("noop").build();

    let result = runner.run(&job, control.clone()).await;
    assert_eq!(result.exit_code, 3);

    // stderr lines travel through the same stream as stdout.
    let streamed: String = control
        .calls
        .lock()
        .iter()
        .filter_map(|c| match c {
            RecordedCall::Chunk { content, .. } => Some(content.clone()),
            _ => None,
        })
        .collect();
    assert!(streamed.contains("boom"));
}

fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).unwrap();
}
