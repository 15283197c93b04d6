// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn checkin_request_fields_are_all_optional() {
    let req: CheckinRequest = serde_json::from_str("{}").unwrap();
    assert!(req.sync_revision.is_none());
    assert!(req.stats.is_none());
    assert!(req.status.is_none());
    assert!(req.active_jobs.is_none());
}

#[test]
fn checkin_request_skips_absent_fields_on_the_wire() {
    let req = CheckinRequest { sync_revision: Some("abc".into()), ..Default::default() };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json, serde_json::json!({"sync_revision": "abc"}));
}

#[test]
fn register_request_wire_shape() {
    let json = r#"{"name": "node-a", "tags": ["gpu", "net-a"], "token": "s3cret"}"#;
    let req: RegisterRequest = serde_json::from_str(json).unwrap();
    assert_eq!(req.name, "node-a");
    assert!(req.tags.contains("gpu"));
    assert!(req.max_concurrent.is_none());
}

#[test]
fn complete_request_minimal_body() {
    let json = r#"{
        "worker_id": "w-1",
        "exit_code": 0,
        "log_file": "hello_abc123_20260101.log",
        "duration_seconds": 12.5
    }"#;
    let req: CompleteJobRequest = serde_json::from_str(json).unwrap();
    assert_eq!(req.exit_code, 0);
    assert!(req.log_content.is_none());
    assert!(req.cmdb_facts.is_none());
    assert!(req.checkin.is_none());
}

#[test]
fn stream_log_append_defaults_false() {
    let json = r#"{"worker_id": "w-1", "content": "header"}"#;
    let req: StreamLogRequest = serde_json::from_str(json).unwrap();
    assert!(!req.append);
}
