// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn append_writes_one_line_per_entry() {
    let dir = tempfile::tempdir().unwrap();
    let log = AuditLog::new(dir.path());

    log.append(&AuditEntry::new(1, "alice", "login"));
    log.append(&AuditEntry::new(2, "bob", "job.submit").outcome("denied"));

    let content = std::fs::read_to_string(dir.path().join("audit.jsonl")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: AuditEntry = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first.username, "alice");
    assert_eq!(first.outcome, "success");

    let second: AuditEntry = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second.outcome, "denied");
}
