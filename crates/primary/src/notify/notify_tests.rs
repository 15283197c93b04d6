// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn sync_notification_reaches_subscribers() {
    let hub = NotifyHub::new();
    let mut rx = hub.subscribe_workers();

    hub.notify_sync("abcdef0123456789");

    let frame = rx.try_recv().unwrap();
    assert_eq!(
        frame,
        SocketFrame::SyncAvailable {
            revision: "abcdef0123456789".into(),
            short_revision: "abcdef0".into()
        }
    );
}

#[test]
fn notify_without_subscribers_is_fine() {
    let hub = NotifyHub::new();
    hub.notify_sync("abc");
    hub.publish_event(UiEvent::ReviewReady { job_id: "j-1".into() });
}
