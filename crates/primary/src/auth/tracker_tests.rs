// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const MIN: u64 = 60_000;

fn tracker() -> LoginTracker {
    LoginTracker::new(5, Duration::from_secs(15 * 60))
}

#[test]
fn locks_after_max_attempts() {
    let t = tracker();
    for i in 0..4 {
        assert!(!t.record_failure("alice", i * 1_000));
        assert!(!t.is_locked("alice", i * 1_000));
    }
    assert!(t.record_failure("alice", 5_000));
    assert!(t.is_locked("alice", 5_000));
}

#[test]
fn lockout_expires() {
    let t = tracker();
    for i in 0..5 {
        t.record_failure("alice", i);
    }
    assert!(t.is_locked("alice", 10 * MIN));
    assert!(!t.is_locked("alice", 16 * MIN));
}

#[test]
fn old_failures_fall_out_of_window() {
    let t = tracker();
    // Four failures early in the window
    for i in 0..4 {
        t.record_failure("alice", i);
    }
    // A fifth failure after the first four expired must not lock
    assert!(!t.record_failure("alice", 20 * MIN));
    assert!(!t.is_locked("alice", 20 * MIN));
}

#[test]
fn success_resets_everything() {
    let t = tracker();
    for i in 0..5 {
        t.record_failure("alice", i);
    }
    assert!(t.is_locked("alice", 100));

    t.record_success("alice");
    assert!(!t.is_locked("alice", 100));
    assert_eq!(t.remaining_attempts("alice", 100), 5);
}

#[test]
fn usernames_are_tracked_independently() {
    let t = tracker();
    for i in 0..5 {
        t.record_failure("alice", i);
    }
    assert!(t.is_locked("alice", 100));
    assert!(!t.is_locked("bob", 100));
    assert_eq!(t.remaining_attempts("bob", 100), 5);
}

#[test]
fn remaining_attempts_counts_down() {
    let t = tracker();
    assert_eq!(t.remaining_attempts("alice", 0), 5);
    t.record_failure("alice", 1);
    t.record_failure("alice", 2);
    assert_eq!(t.remaining_attempts("alice", 3), 3);
}

#[test]
fn lockout_remaining_reports_seconds() {
    let t = tracker();
    for i in 0..5 {
        t.record_failure("alice", i);
    }
    let remaining = t.lockout_remaining("alice", 4 + 1_000).unwrap();
    assert!(remaining <= 15 * 60);
    assert!(remaining >= 14 * 60);
    assert!(t.lockout_remaining("bob", 0).is_none());
}
