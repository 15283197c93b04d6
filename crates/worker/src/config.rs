// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker configuration from environment variables.

use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("{0} must be a positive integer")]
    BadNumber(&'static str),
    #[error("CHECKIN_INTERVAL must be at least 10 seconds")]
    CheckinTooShort,
    #[error("MAX_CONCURRENT_JOBS must be at least 1")]
    NoConcurrency,
}

/// TLS verification towards the primary: on, off, or a CA bundle path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SslVerify {
    #[default]
    Enabled,
    Disabled,
    CaBundle(PathBuf),
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub worker_name: String,
    pub server_url: String,
    pub registration_token: String,
    pub tags: BTreeSet<String>,
    /// Seconds between check-ins (≥ 10)
    pub checkin_interval: u64,
    /// Seconds between periodic sync checks
    pub sync_interval: u64,
    /// Seconds between job polls
    pub poll_interval: u64,
    pub max_concurrent_jobs: u32,
    pub content_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub ssl_verify: SslVerify,
}

impl WorkerConfig {
    /// Load from the environment. Missing required variables and
    /// out-of-range values are configuration errors, fatal at startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        let worker_name = required("WORKER_NAME")?;
        let server_url = required("SERVER_URL")?.trim_end_matches('/').to_string();
        let registration_token = required("REGISTRATION_TOKEN")?;

        let tags = std::env::var("WORKER_TAGS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        let config = Self {
            worker_name,
            server_url,
            registration_token,
            tags,
            checkin_interval: numeric("CHECKIN_INTERVAL", 600)?,
            sync_interval: numeric("SYNC_INTERVAL", 300)?,
            poll_interval: numeric("POLL_INTERVAL", 5)?,
            max_concurrent_jobs: numeric("MAX_CONCURRENT_JOBS", 2)? as u32,
            content_dir: PathBuf::from(
                std::env::var("CONTENT_DIR").unwrap_or_else(|_| "/app".to_string()),
            ),
            logs_dir: PathBuf::from(
                std::env::var("LOGS_DIR").unwrap_or_else(|_| "/app/logs".to_string()),
            ),
            ssl_verify: parse_ssl_verify(std::env::var("SSL_VERIFY").ok().as_deref()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_name.is_empty() {
            return Err(ConfigError::Missing("WORKER_NAME"));
        }
        if self.server_url.is_empty() {
            return Err(ConfigError::Missing("SERVER_URL"));
        }
        if self.registration_token.is_empty() {
            return Err(ConfigError::Missing("REGISTRATION_TOKEN"));
        }
        if self.checkin_interval < 10 {
            return Err(ConfigError::CheckinTooShort);
        }
        if self.max_concurrent_jobs < 1 {
            return Err(ConfigError::NoConcurrency);
        }
        Ok(())
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).ok().filter(|v| !v.is_empty()).ok_or(ConfigError::Missing(name))
}

fn numeric(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::BadNumber(name)),
        Err(_) => Ok(default),
    }
}

fn parse_ssl_verify(raw: Option<&str>) -> SslVerify {
    match raw {
        None | Some("true") | Some("") => SslVerify::Enabled,
        Some("false") => SslVerify::Disabled,
        Some(path) => SslVerify::CaBundle(PathBuf::from(path)),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
