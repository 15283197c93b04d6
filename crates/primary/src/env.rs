// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the primary.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ARMADA_REGISTRATION_TOKEN environment variable is required")]
    NoRegistrationToken,
    #[error("cannot resolve a state directory (set ARMADA_STATE_DIR or HOME)")]
    NoStateDir,
    #[error("invalid ARMADA_LISTEN_ADDR: {0}")]
    BadListenAddr(String),
}

/// Resolve state directory: ARMADA_STATE_DIR > XDG_STATE_HOME/armada > ~/.local/state/armada
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("ARMADA_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("armada"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/armada"))
}

/// Content bundle root; defaults to `<state_dir>/content`.
pub fn content_dir(state_dir: &std::path::Path) -> PathBuf {
    std::env::var("ARMADA_CONTENT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir.join("content"))
}

/// Final and partial job logs; defaults to `<state_dir>/logs`.
pub fn logs_dir(state_dir: &std::path::Path) -> PathBuf {
    std::env::var("ARMADA_LOGS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir.join("logs"))
}

pub fn listen_addr() -> Result<SocketAddr, ConfigError> {
    let raw = std::env::var("ARMADA_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
    raw.parse().map_err(|_| ConfigError::BadListenAddr(raw))
}

/// Shared secret gating worker registration. Refusing to start without one
/// is deliberate: an open registration endpoint would admit any host.
pub fn registration_token() -> Result<String, ConfigError> {
    std::env::var("ARMADA_REGISTRATION_TOKEN")
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::NoRegistrationToken)
}

/// Seconds between expected worker check-ins (default 60, min 10).
pub fn checkin_interval() -> u64 {
    std::env::var("ARMADA_CHECKIN_INTERVAL")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(|v| v.max(10))
        .unwrap_or(60)
}

/// Base URL of the external CMDB fact store, if configured.
pub fn cmdb_url() -> Option<String> {
    std::env::var("ARMADA_CMDB_URL").ok().filter(|s| !s.is_empty())
}

/// URL of the external log-review agent webhook, if configured.
pub fn review_webhook_url() -> Option<String> {
    std::env::var("ARMADA_REVIEW_WEBHOOK_URL").ok().filter(|s| !s.is_empty())
}

/// Bootstrap admin credentials: `ARMADA_ADMIN_USER` plus
/// `ARMADA_ADMIN_PASSWORD_HASH`. Created only when the user table is empty.
pub fn bootstrap_admin() -> Option<(String, String)> {
    let user = std::env::var("ARMADA_ADMIN_USER").ok().filter(|s| !s.is_empty())?;
    let hash = std::env::var("ARMADA_ADMIN_PASSWORD_HASH").ok().filter(|s| !s.is_empty())?;
    Some((user, hash))
}
