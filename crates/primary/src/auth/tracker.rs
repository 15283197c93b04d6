// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Login attempt tracking and account lockout.
//!
//! Process-local by design: the primary is single-instance and horizontal
//! scaling of the auth path is out of scope.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: usize = 5;
pub const DEFAULT_LOCKOUT: Duration = Duration::from_secs(15 * 60);

struct TrackerState {
    /// username → failure timestamps (ms) within the sliding window
    attempts: HashMap<String, Vec<u64>>,
    /// username → lockout expiry (ms)
    lockouts: HashMap<String, u64>,
}

pub struct LoginTracker {
    max_attempts: usize,
    lockout_ms: u64,
    state: Mutex<TrackerState>,
}

impl LoginTracker {
    pub fn new(max_attempts: usize, lockout: Duration) -> Self {
        Self {
            max_attempts,
            lockout_ms: lockout.as_millis() as u64,
            state: Mutex::new(TrackerState { attempts: HashMap::new(), lockouts: HashMap::new() }),
        }
    }

    /// True while the username sits inside a lockout window. An expired
    /// lockout is cleared on observation.
    pub fn is_locked(&self, username: &str, now_ms: u64) -> bool {
        let mut state = self.state.lock();
        match state.lockouts.get(username) {
            Some(&until) if now_ms < until => true,
            Some(_) => {
                state.lockouts.remove(username);
                false
            }
            None => false,
        }
    }

    /// Seconds until the lockout expires, if locked.
    pub fn lockout_remaining(&self, username: &str, now_ms: u64) -> Option<u64> {
        let state = self.state.lock();
        state
            .lockouts
            .get(username)
            .filter(|&&until| now_ms < until)
            .map(|&until| (until - now_ms).div_ceil(1000))
    }

    /// Record a failed attempt. Returns true when this failure tripped the
    /// lockout.
    pub fn record_failure(&self, username: &str, now_ms: u64) -> bool {
        let mut state = self.state.lock();
        let cutoff = now_ms.saturating_sub(self.lockout_ms);
        let attempts = state.attempts.entry(username.to_string()).or_default();
        attempts.retain(|&ts| ts >= cutoff);
        attempts.push(now_ms);

        if attempts.len() >= self.max_attempts {
            state.lockouts.insert(username.to_string(), now_ms + self.lockout_ms);
            true
        } else {
            false
        }
    }

    /// A successful login resets both the window and any lockout.
    pub fn record_success(&self, username: &str) {
        let mut state = self.state.lock();
        state.attempts.remove(username);
        state.lockouts.remove(username);
    }

    /// Attempts left before lockout trips.
    pub fn remaining_attempts(&self, username: &str, now_ms: u64) -> usize {
        if self.is_locked(username, now_ms) {
            return 0;
        }
        let state = self.state.lock();
        let cutoff = now_ms.saturating_sub(self.lockout_ms);
        let used = state
            .attempts
            .get(username)
            .map(|a| a.iter().filter(|&&ts| ts >= cutoff).count())
            .unwrap_or(0);
        self.max_attempts.saturating_sub(used)
    }
}

impl Default for LoginTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_LOCKOUT)
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
