// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access guard: principal resolution and permission checks.
//!
//! Every non-public endpoint resolves a principal in a fixed order
//! (session bearer, API token, worker identity, anonymous) and then names
//! one required permission. Worker identity is accepted only on the
//! worker-facing endpoints and, as in the original deployment, amounts to
//! presence of a known worker id plus the job-assignment checks on each
//! call; per-worker credentials are future hardening.

mod sessions;
mod tracker;

pub use sessions::{SessionEntry, SessionMap, SESSION_TIMEOUT};
pub use tracker::{LoginTracker, DEFAULT_LOCKOUT, DEFAULT_MAX_ATTEMPTS};

use crate::engine::Engine;
use crate::error::ApiError;
use armada_core::{check_permission, hash_token, Clock, User, WorkerId};
use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

/// Session cookie name used by browser clients.
pub const SESSION_COOKIE: &str = "ansible_session";
/// Header carrying a raw API token.
pub const TOKEN_HEADER: &str = "x-api-token";
/// Header carrying a worker id on worker-authenticated endpoints.
pub const WORKER_HEADER: &str = "x-worker-id";

/// The resolved caller of a request.
#[derive(Debug, Clone)]
pub enum Principal {
    User(User),
    WorkerNode(WorkerId),
    Anonymous,
}

impl Principal {
    pub fn username(&self) -> &str {
        match self {
            Principal::User(user) => &user.username,
            Principal::WorkerNode(id) => id.as_str(),
            Principal::Anonymous => "anonymous",
        }
    }
}

impl<C: Clock> Engine<C> {
    /// Resolve the principal for a request: session bearer first, then API
    /// token, then worker identity, then anonymous.
    pub fn resolve_principal(&self, headers: &HeaderMap) -> Principal {
        let now = self.now_ms();

        if let Some(session_id) = session_from_headers(headers) {
            if let Some(entry) = self.sessions.validate(&session_id, now) {
                if let Some(user) = self.store.get_user(&entry.user_id) {
                    if user.enabled {
                        return Principal::User(user);
                    }
                }
            }
        }

        if let Some(raw) = header_str(headers, TOKEN_HEADER) {
            if let Some(user) = self.user_for_token(raw, now) {
                return Principal::User(user);
            }
        }

        if let Some(worker_id) = header_str(headers, WORKER_HEADER) {
            if self.store.get_worker(worker_id).is_some() {
                return Principal::WorkerNode(WorkerId::from(worker_id));
            }
        }

        Principal::Anonymous
    }

    /// Look up a user through a raw API token. Expired tokens and tokens
    /// of disabled users resolve to nothing.
    fn user_for_token(&self, raw: &str, now: u64) -> Option<User> {
        let token = self.store.find_token_by_hash(&hash_token(raw))?;
        if token.is_expired(now) {
            return None;
        }
        let user = self.store.get_user(&token.user_id)?;
        if !user.enabled {
            return None;
        }
        if let Err(err) = self.store.touch_token(token.id.as_str(), now) {
            tracing::debug!(error = %err, "token touch failed");
        }
        Some(user)
    }

    /// The guard proper: 401 for no principal, 423 for a locked account,
    /// 403 when the required permission is not held.
    pub fn require(&self, principal: &Principal, permission: &str) -> Result<User, ApiError> {
        let user = match principal {
            Principal::User(user) => user,
            Principal::WorkerNode(_) | Principal::Anonymous => {
                return Err(ApiError::Unauthenticated);
            }
        };
        let now = self.now_ms();
        if self.tracker.is_locked(&user.username, now) {
            let retry_after_seconds =
                self.tracker.lockout_remaining(&user.username, now).unwrap_or(0);
            return Err(ApiError::Locked { retry_after_seconds });
        }
        if !check_permission(user, permission, &self.store.role_map()) {
            return Err(ApiError::Forbidden { required_permission: permission.to_string() });
        }
        Ok(user.clone())
    }

    /// Worker identity for worker-only endpoints: accepted from the header
    /// or from the request body's `worker_id` field.
    pub fn require_worker(
        &self,
        principal: &Principal,
        body_worker_id: Option<&WorkerId>,
    ) -> Result<WorkerId, ApiError> {
        if let Principal::WorkerNode(id) = principal {
            return Ok(id.clone());
        }
        if let Some(id) = body_worker_id {
            if self.store.get_worker(id.as_str()).is_some() {
                return Ok(id.clone());
            }
        }
        Err(ApiError::Unauthenticated)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).filter(|s| !s.is_empty())
}

/// Extract the session bearer: `Authorization: Bearer <id>` or the
/// `ansible_session` cookie.
fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = header_str(headers, "authorization") {
        if let Some(bearer) = auth.strip_prefix("Bearer ") {
            return Some(bearer.trim().to_string());
        }
    }
    let cookies = header_str(headers, "cookie")?;
    for pair in cookies.split(';') {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        if name == SESSION_COOKIE {
            return Some(value.to_string());
        }
    }
    None
}

/// Password verification for the login endpoint.
///
/// The core ships a `sha256$<hex>` scheme; deployments with stronger
/// hashing wire their verifier in at the host layer and store hashes the
/// core treats as opaque.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match stored_hash.split_once('$') {
        Some(("sha256", hex)) => {
            let mut hasher = Sha256::new();
            hasher.update(password.as_bytes());
            format!("{:x}", hasher.finalize()) == hex
        }
        _ => false,
    }
}

/// Produce a stored hash in the core's scheme.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("sha256${:x}", hasher.finalize())
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
