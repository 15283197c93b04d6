// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External collaborators reached from the completion pipeline.
//!
//! The CMDB fact store and the log-review agent live outside the core and
//! are addressed through these traits. Both calls are fire-and-forget with
//! short timeouts: a failing collaborator never affects the job's state
//! transition.

use armada_core::JobId;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Write interface to the external CMDB host-fact store.
#[async_trait]
pub trait CmdbSink: Send + Sync {
    async fn store_facts(
        &self,
        job_id: &JobId,
        playbook: &str,
        collected_at: u64,
        facts: &HashMap<String, serde_json::Value>,
    ) -> Result<(), String>;
}

/// Trigger for the external log-review agent.
#[async_trait]
pub trait ReviewHook: Send + Sync {
    async fn job_finished(&self, job_id: &JobId, exit_code: i32) -> Result<(), String>;
}

/// HTTP implementation posting facts to the configured CMDB base URL.
pub struct HttpCmdb {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCmdb {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl CmdbSink for HttpCmdb {
    async fn store_facts(
        &self,
        job_id: &JobId,
        playbook: &str,
        collected_at: u64,
        facts: &HashMap<String, serde_json::Value>,
    ) -> Result<(), String> {
        let url = format!("{}/api/cmdb/facts", self.base_url.trim_end_matches('/'));
        for (host, host_facts) in facts {
            let body = json!({
                "host": host,
                "facts": host_facts,
                "job_id": job_id,
                "playbook": playbook,
                "collected_at": collected_at,
            });
            self.client
                .post(&url)
                .timeout(WEBHOOK_TIMEOUT)
                .json(&body)
                .send()
                .await
                .map_err(|e| e.to_string())?
                .error_for_status()
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

/// HTTP implementation posting the log-review webhook.
pub struct HttpReviewHook {
    client: reqwest::Client,
    url: String,
}

impl HttpReviewHook {
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into() }
    }
}

#[async_trait]
impl ReviewHook for HttpReviewHook {
    async fn job_finished(&self, job_id: &JobId, exit_code: i32) -> Result<(), String> {
        let body = json!({ "job_id": job_id, "exit_code": exit_code });
        self.client
            .post(&self.url)
            .timeout(WEBHOOK_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Disabled collaborator: accepts everything and does nothing.
pub struct NoopExternal;

#[async_trait]
impl CmdbSink for NoopExternal {
    async fn store_facts(
        &self,
        _job_id: &JobId,
        _playbook: &str,
        _collected_at: u64,
        _facts: &HashMap<String, serde_json::Value>,
    ) -> Result<(), String> {
        Ok(())
    }
}

#[async_trait]
impl ReviewHook for NoopExternal {
    async fn job_finished(&self, _job_id: &JobId, _exit_code: i32) -> Result<(), String> {
        Ok(())
    }
}
