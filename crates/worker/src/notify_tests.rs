// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn pending_flag_take_consumes() {
    let pending = SyncPending::default();
    assert!(!pending.take());

    pending.raise();
    assert!(pending.take());
    assert!(!pending.take());
}

#[test]
fn sync_available_raises_flag() {
    let pending = SyncPending::default();
    let revision = Arc::new(Mutex::new(Some("old-rev".to_string())));

    handle_frame(
        r#"{"event":"sync_available","revision":"new-rev","short_revision":"new-rev"}"#,
        &pending,
        &revision,
    );
    assert!(pending.take());
}

#[test]
fn notification_for_held_revision_is_discarded() {
    let pending = SyncPending::default();
    let revision = Arc::new(Mutex::new(Some("same-rev".to_string())));

    handle_frame(
        r#"{"event":"sync_available","revision":"same-rev","short_revision":"same-re"}"#,
        &pending,
        &revision,
    );
    assert!(!pending.take());
}

#[test]
fn malformed_frames_are_ignored() {
    let pending = SyncPending::default();
    let revision = Arc::new(Mutex::new(None));

    handle_frame("not json at all", &pending, &revision);
    handle_frame(r#"{"event":"unknown_event"}"#, &pending, &revision);
    assert!(!pending.take());
}
