// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory session registry.
//!
//! Sessions are opaque bearer ids handed to the UI host at login; the core
//! never sets cookies itself. Process-local: sessions do not survive a
//! primary restart.

use armada_core::User;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

pub const SESSION_TIMEOUT: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub user_id: String,
    pub username: String,
    pub created_ms: u64,
    pub last_active_ms: u64,
}

pub struct SessionMap {
    timeout_ms: u64,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionMap {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout_ms: timeout.as_millis() as u64, sessions: Mutex::new(HashMap::new()) }
    }

    /// Create a session for a user, returning the opaque id.
    pub fn create(&self, user: &User, now_ms: u64) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.sessions.lock().insert(
            id.clone(),
            SessionEntry {
                user_id: user.id.clone(),
                username: user.username.clone(),
                created_ms: now_ms,
                last_active_ms: now_ms,
            },
        );
        id
    }

    /// Validate and touch a session. Expired sessions are removed.
    pub fn validate(&self, session_id: &str, now_ms: u64) -> Option<SessionEntry> {
        let mut sessions = self.sessions.lock();
        let entry = sessions.get_mut(session_id)?;
        if now_ms.saturating_sub(entry.last_active_ms) > self.timeout_ms {
            sessions.remove(session_id);
            return None;
        }
        entry.last_active_ms = now_ms;
        Some(entry.clone())
    }

    pub fn destroy(&self, session_id: &str) -> bool {
        self.sessions.lock().remove(session_id).is_some()
    }

    /// Drop every expired session.
    pub fn cleanup(&self, now_ms: u64) {
        self.sessions
            .lock()
            .retain(|_, e| now_ms.saturating_sub(e.last_active_ms) <= self.timeout_ms);
    }
}

impl Default for SessionMap {
    fn default() -> Self {
        Self::new(SESSION_TIMEOUT)
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
