// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the primary server API.

use crate::config::SslVerify;
use armada_core::{JobId, WorkerId};
use armada_wire::{
    AssignedJobsResponse, CheckinRequest, CheckinResponse, CompleteJobRequest, CompleteJobResponse,
    ErrorBody, ManifestResponse, RegisterRequest, RegisterResponse, RevisionInfo, StartJobRequest,
    StreamLogRequest,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const ARCHIVE_TIMEOUT: Duration = Duration::from_secs(120);
const STREAM_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TLS configuration error: {0}")]
    Tls(String),
}

impl ClientError {
    /// Whether the failure is worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::Io(_) => true,
            ClientError::Api { status, .. } => *status >= 500,
            ClientError::Tls(_) => false,
        }
    }
}

pub struct PrimaryClient {
    client: reqwest::Client,
    server_url: String,
}

impl PrimaryClient {
    pub fn new(server_url: impl Into<String>, ssl_verify: &SslVerify) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT);
        match ssl_verify {
            SslVerify::Enabled => {}
            SslVerify::Disabled => {
                builder = builder.danger_accept_invalid_certs(true);
            }
            SslVerify::CaBundle(path) => {
                let pem = std::fs::read(path)?;
                let cert = reqwest::Certificate::from_pem(&pem)
                    .map_err(|e| ClientError::Tls(e.to_string()))?;
                builder = builder.add_root_certificate(cert);
            }
        }
        let client = builder.build().map_err(ClientError::Transport)?;
        Ok(Self { client, server_url: server_url.into().trim_end_matches('/').to_string() })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.server_url)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            Err(ClientError::Api { status: status.as_u16(), message })
        }
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, ClientError> {
        let response =
            self.client.post(self.url(endpoint)).timeout(timeout).json(body).send().await?;
        Self::decode(response).await
    }

    // === Registration and check-in ===

    pub async fn register(
        &self,
        name: &str,
        tags: &BTreeSet<String>,
        token: &str,
        max_concurrent: u32,
    ) -> Result<RegisterResponse, ClientError> {
        let body = RegisterRequest {
            name: name.to_string(),
            tags: tags.clone(),
            token: token.to_string(),
            max_concurrent: Some(max_concurrent),
        };
        self.post_json("/api/workers/register", &body, DEFAULT_TIMEOUT).await
    }

    pub async fn checkin(
        &self,
        worker_id: &WorkerId,
        body: &CheckinRequest,
    ) -> Result<CheckinResponse, ClientError> {
        self.post_json(&format!("/api/workers/{worker_id}/checkin"), body, DEFAULT_TIMEOUT).await
    }

    // === Jobs ===

    pub async fn assigned_jobs(
        &self,
        worker_id: &WorkerId,
    ) -> Result<AssignedJobsResponse, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/api/workers/{worker_id}/jobs")))
            .query(&[("status", "assigned")])
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn start_job(
        &self,
        job_id: &JobId,
        worker_id: &WorkerId,
        log_file: &str,
    ) -> Result<(), ClientError> {
        let body =
            StartJobRequest { worker_id: worker_id.clone(), log_file: log_file.to_string() };
        let _: serde_json::Value =
            self.post_json(&format!("/api/jobs/{job_id}/start"), &body, DEFAULT_TIMEOUT).await?;
        Ok(())
    }

    pub async fn stream_log(
        &self,
        job_id: &JobId,
        worker_id: &WorkerId,
        content: &str,
        append: bool,
    ) -> Result<(), ClientError> {
        let body = StreamLogRequest {
            worker_id: worker_id.clone(),
            content: content.to_string(),
            append,
        };
        let _: serde_json::Value =
            self.post_json(&format!("/api/jobs/{job_id}/log/stream"), &body, STREAM_TIMEOUT).await?;
        Ok(())
    }

    pub async fn complete_job(
        &self,
        job_id: &JobId,
        body: &CompleteJobRequest,
    ) -> Result<CompleteJobResponse, ClientError> {
        self.post_json(&format!("/api/jobs/{job_id}/complete"), body, DEFAULT_TIMEOUT).await
    }

    // === Content sync ===

    pub async fn revision(&self) -> Result<RevisionInfo, ClientError> {
        let response = self.client.get(self.url("/api/sync/revision")).send().await?;
        Self::decode(response).await
    }

    pub async fn manifest(&self) -> Result<ManifestResponse, ClientError> {
        let response = self.client.get(self.url("/api/sync/manifest")).send().await?;
        Self::decode(response).await
    }

    /// Stream the bundle archive to a file on disk.
    pub async fn download_archive(&self, output: &Path) -> Result<(), ClientError> {
        let response = self
            .client
            .get(self.url("/api/sync/archive"))
            .timeout(ARCHIVE_TIMEOUT)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: "archive download failed".to_string(),
            });
        }
        let mut file = tokio::fs::File::create(output).await?;
        let mut stream = response.bytes_stream();
        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        Ok(())
    }

    /// Download a single bundle file to a local path.
    pub async fn download_file(&self, rel: &str, output: &Path) -> Result<(), ClientError> {
        let response = self.client.get(self.url(&format!("/api/sync/file/{rel}"))).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: format!("download of {rel} failed"),
            });
        }
        let bytes = response.bytes().await?;
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, &bytes).await?;
        Ok(())
    }

    // === Health ===

    /// Whether the primary answers at all.
    pub async fn health_check(&self) -> bool {
        let request = self.client.get(self.url("/api/health")).timeout(HEALTH_TIMEOUT);
        matches!(request.send().await, Ok(r) if r.status().is_success())
    }

    /// The primary's WebSocket endpoint for sync notifications.
    pub fn notify_url(&self) -> String {
        let ws_base = if let Some(rest) = self.server_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.server_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("ws://{}", self.server_url)
        };
        format!("{ws_base}/api/ws/workers")
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
