// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn job_id_display() {
    let id = JobId::from("test-job");
    assert_eq!(id.to_string(), "test-job");
}

#[test]
fn job_id_equality() {
    let id1 = JobId::from("job-1");
    let id2 = JobId::from("job-1");
    let id3 = JobId::from("job-2");

    assert_eq!(id1, id2);
    assert_ne!(id1, id3);
}

#[test]
fn generated_ids_are_unique() {
    let a = JobId::new();
    let b = JobId::new();
    assert_ne!(a, b);
}

#[test]
fn job_id_serde_transparent() {
    let id = JobId::from("my-job");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"my-job\"");

    let parsed: JobId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn short_truncates() {
    let id = JobId::from("abcdefghij");
    assert_eq!(id.short(8), "abcdefgh");
    assert_eq!(id.short(100), "abcdefghij");
}

#[test]
fn short_helper_on_exact_length() {
    assert_eq!(short("abc", 3), "abc");
    assert_eq!(short("abc", 2), "ab");
}

#[test]
fn worker_id_borrow_str_lookup() {
    use std::collections::HashMap;

    let mut map: HashMap<WorkerId, u32> = HashMap::new();
    map.insert(WorkerId::from("w-1"), 1);
    assert_eq!(map.get("w-1"), Some(&1));
}
