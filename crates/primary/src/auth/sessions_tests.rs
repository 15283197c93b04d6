// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn user() -> User {
    User::new("alice", vec!["operator".into()], 0)
}

#[test]
fn create_and_validate() {
    let map = SessionMap::default();
    let id = map.create(&user(), 1_000);

    let entry = map.validate(&id, 2_000).unwrap();
    assert_eq!(entry.username, "alice");
}

#[test]
fn expired_session_is_removed() {
    let map = SessionMap::new(Duration::from_secs(10));
    let id = map.create(&user(), 0);

    assert!(map.validate(&id, 9_000).is_some());
    // Validation touched the session at 9s; expiry counts from there.
    assert!(map.validate(&id, 25_000).is_none());
    // Gone for good, even within a fresh window.
    assert!(map.validate(&id, 25_500).is_none());
}

#[test]
fn destroy_removes_session() {
    let map = SessionMap::default();
    let id = map.create(&user(), 0);
    assert!(map.destroy(&id));
    assert!(!map.destroy(&id));
    assert!(map.validate(&id, 1).is_none());
}

#[test]
fn cleanup_sweeps_expired_only() {
    let map = SessionMap::new(Duration::from_secs(10));
    let stale = map.create(&user(), 0);
    let fresh = map.create(&user(), 20_000);

    map.cleanup(25_000);
    assert!(map.validate(&stale, 25_000).is_none());
    assert!(map.validate(&fresh, 25_000).is_some());
}
