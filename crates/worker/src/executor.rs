// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job playbook execution.
//!
//! Each job runs as its own task owning the `ansible-playbook` subprocess
//! and its log streaming; the worker's main loop is never blocked by
//! subprocess output. Streaming is best-effort: a failed chunk upload is
//! logged and execution continues.
//!
//! The [`ControlPlane`] trait is the seam back to the primary. Remote
//! workers drive it over HTTP; the primary drives it in-process for its
//! co-located `__local__` executor.

use crate::client::PrimaryClient;
use armada_core::{Job, JobId, WorkerId};
use async_trait::async_trait;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

/// Flush the stream buffer after this many lines…
const STREAM_BUFFER_LINES: usize = 10;
/// …or after this much time since the last flush.
const STREAM_INTERVAL: Duration = Duration::from_secs(2);

const HEADER_RULE: &str =
    "============================================================";

/// Callbacks into the primary over the life of one job.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn job_started(&self, job_id: &JobId, log_file: &str) -> Result<(), String>;
    async fn stream_chunk(&self, job_id: &JobId, content: &str, append: bool)
        -> Result<(), String>;
    async fn job_completed(&self, job_id: &JobId, report: CompletionReport) -> Result<(), String>;
}

/// Everything the completion endpoint needs, minus the worker identity
/// (the control plane knows who it is).
#[derive(Debug, Clone)]
pub struct CompletionReport {
    pub exit_code: i32,
    pub log_file: String,
    pub log_content: Option<String>,
    pub error_message: Option<String>,
    pub duration_seconds: f64,
}

/// Outcome handed to the service's completion callback.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub job_id: JobId,
    pub exit_code: i32,
    pub log_file: String,
    pub duration_seconds: f64,
    pub error_message: Option<String>,
}

pub struct JobRunner {
    worker_id: WorkerId,
    worker_name: String,
    content_dir: PathBuf,
    logs_dir: PathBuf,
    /// Overridable for tests; `ansible-playbook` in production.
    program: String,
}

impl JobRunner {
    pub fn new(
        worker_id: WorkerId,
        worker_name: impl Into<String>,
        content_dir: impl Into<PathBuf>,
        logs_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            worker_id,
            worker_name: worker_name.into(),
            content_dir: content_dir.into(),
            logs_dir: logs_dir.into(),
            program: "ansible-playbook".to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Resolve a playbook name to a path under the content directory.
    ///
    /// The UI stores playbook names without extension; the files carry
    /// `.yml` or `.yaml`. Tries as-given, then `.yml`, then `.yaml`, and
    /// finally falls back to as-given so the runner surfaces a precise
    /// error for a missing file.
    pub fn resolve_playbook(&self, playbook: &str) -> PathBuf {
        let playbooks_dir = self.content_dir.join("playbooks");
        if playbook.ends_with(".yml") || playbook.ends_with(".yaml") {
            return playbooks_dir.join(playbook);
        }
        let yml = playbooks_dir.join(format!("{playbook}.yml"));
        if yml.exists() {
            return yml;
        }
        let yaml = playbooks_dir.join(format!("{playbook}.yaml"));
        if yaml.exists() {
            return yaml;
        }
        playbooks_dir.join(playbook)
    }

    /// Build the `ansible-playbook` argv for a job.
    pub fn build_command(&self, job: &Job) -> Vec<String> {
        let playbook_path = self.resolve_playbook(&job.playbook);
        let inventory_path = self.content_dir.join("inventory").join("hosts");

        let mut cmd = vec![
            self.program.clone(),
            playbook_path.display().to_string(),
            "-i".to_string(),
            inventory_path.display().to_string(),
        ];
        if !job.target.is_empty() && job.target != "all" {
            cmd.push("-l".to_string());
            cmd.push(job.target.clone());
        }
        if !job.extra_vars.is_empty() {
            cmd.push("-e".to_string());
            cmd.push(serde_json::to_string(&job.extra_vars).unwrap_or_default());
        }
        cmd
    }

    /// Unique log filename for a job run.
    pub fn log_filename(&self, job: &Job) -> String {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let stem = Path::new(&job.playbook)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| job.playbook.clone());
        format!("{stem}_{}_{timestamp}.log", job.id.short(8))
    }

    fn header(&self, job: &Job, cmd: &[String]) -> String {
        format!(
            "Worker: {} ({})\nJob ID: {}\nPlaybook: {}\nTarget: {}\nStarted: {}\nCommand: {}\n{}\n\n",
            self.worker_name,
            self.worker_id.short(8),
            job.id,
            job.playbook,
            job.target,
            Local::now().to_rfc3339(),
            cmd.join(" "),
            HEADER_RULE,
        )
    }

    /// Execute one job to completion and report the outcome.
    pub async fn run(&self, job: &Job, control: Arc<dyn ControlPlane>) -> JobResult {
        let started = Instant::now();
        let cmd = self.build_command(job);
        let log_file = self.log_filename(job);
        let log_path = self.logs_dir.join(&log_file);

        if let Err(err) = tokio::fs::create_dir_all(&self.logs_dir).await {
            tracing::error!(error = %err, "cannot create logs directory");
        }

        if let Err(err) = control.job_started(&job.id, &log_file).await {
            tracing::warn!(job = %job.id.short(8), error = %err, "start notification failed");
        }

        let mut sink = LogSink::new(&job.id, &log_path, control.clone());
        let header = self.header(job, &cmd);
        sink.write(&header, false).await;

        let (exit_code, error_message) = self.execute(&cmd, &mut sink).await;

        // Drain buffered output lines first so no subscriber ever sees the
        // exit-code block ahead of trailing playbook output.
        sink.flush().await;
        let footer = format!(
            "\n{}\nCompleted: {}\nExit Code: {}\n",
            HEADER_RULE,
            Local::now().to_rfc3339(),
            exit_code,
        );
        sink.write(&footer, true).await;

        let duration_seconds = started.elapsed().as_secs_f64();
        let log_content = tokio::fs::read_to_string(&log_path).await.ok();

        let report = CompletionReport {
            exit_code,
            log_file: log_file.clone(),
            log_content,
            error_message: error_message.clone(),
            duration_seconds,
        };
        if let Err(err) = control.job_completed(&job.id, report).await {
            tracing::warn!(job = %job.id.short(8), error = %err, "completion report failed");
        }

        tracing::info!(
            job = %job.id.short(8),
            exit_code,
            duration_s = format!("{duration_seconds:.1}"),
            "job finished"
        );
        JobResult { job_id: job.id.clone(), exit_code, log_file, duration_seconds, error_message }
    }

    /// Spawn the subprocess and pump its output through the sink.
    async fn execute(&self, cmd: &[String], sink: &mut LogSink) -> (i32, Option<String>) {
        let Some((program, args)) = cmd.split_first() else {
            return (1, Some("empty command".to_string()));
        };

        let spawned = tokio::process::Command::new(program)
            .args(args)
            .current_dir(&self.content_dir)
            .env("ANSIBLE_FORCE_COLOR", "false")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                return match err.kind() {
                    std::io::ErrorKind::NotFound => {
                        (127, Some("ansible-playbook not found".to_string()))
                    }
                    std::io::ErrorKind::PermissionDenied => {
                        (126, Some(format!("Permission denied: {err}")))
                    }
                    _ => (1, Some(format!("Execution error: {err}"))),
                };
            }
        };

        // Interleave stdout and stderr line-by-line onto one channel.
        let (line_tx, mut line_rx) = mpsc::channel::<String>(256);
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump_lines(stdout, line_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump_lines(stderr, line_tx));
        } else {
            drop(line_tx);
        }

        loop {
            match tokio::time::timeout(STREAM_INTERVAL, line_rx.recv()).await {
                Ok(Some(line)) => sink.push_line(line).await,
                Ok(None) => break,
                Err(_) => sink.flush().await,
            }
        }

        match child.wait().await {
            Ok(status) => (status.code().unwrap_or(1), None),
            Err(err) => (1, Some(format!("Execution error: {err}"))),
        }
    }
}

async fn pump_lines<R: AsyncRead + Unpin>(reader: R, tx: mpsc::Sender<String>) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
            break;
        }
    }
}

/// Writes log output to the local file immediately and streams it to the
/// primary in buffered chunks.
struct LogSink {
    job_id: JobId,
    path: PathBuf,
    control: Arc<dyn ControlPlane>,
    buffer: Vec<String>,
    last_flush: Instant,
    initialized: bool,
}

impl LogSink {
    fn new(job_id: &JobId, path: &Path, control: Arc<dyn ControlPlane>) -> Self {
        Self {
            job_id: job_id.clone(),
            path: path.to_path_buf(),
            control,
            buffer: Vec::new(),
            last_flush: Instant::now(),
            initialized: false,
        }
    }

    /// Write a block straight through: to the local file and as one chunk.
    async fn write(&mut self, content: &str, append: bool) {
        self.write_local(content, append || self.initialized).await;
        self.stream(content, append || self.initialized).await;
        self.initialized = true;
    }

    /// Queue one output line, flushing when the buffer fills.
    async fn push_line(&mut self, line: String) {
        let with_newline = format!("{line}\n");
        self.write_local(&with_newline, true).await;
        self.buffer.push(with_newline);
        if self.buffer.len() >= STREAM_BUFFER_LINES
            || self.last_flush.elapsed() >= STREAM_INTERVAL
        {
            self.flush().await;
        }
    }

    /// Send any buffered lines as one chunk.
    async fn flush(&mut self) {
        if self.buffer.is_empty() {
            self.last_flush = Instant::now();
            return;
        }
        let content: String = self.buffer.drain(..).collect();
        self.stream(&content, true).await;
        self.last_flush = Instant::now();
    }

    async fn write_local(&self, content: &str, append: bool) {
        use tokio::io::AsyncWriteExt;
        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(append)
                .write(true)
                .truncate(!append)
                .open(&self.path)
                .await?;
            file.write_all(content.as_bytes()).await?;
            file.flush().await
        }
        .await;
        if let Err(err) = result {
            tracing::warn!(job = %self.job_id.short(8), error = %err, "local log write failed");
        }
    }

    async fn stream(&self, content: &str, append: bool) {
        if let Err(err) = self.control.stream_chunk(&self.job_id, content, append).await {
            tracing::warn!(job = %self.job_id.short(8), error = %err, "log stream failed");
        }
    }
}

/// HTTP control plane used by remote workers.
pub struct HttpControlPlane {
    pub client: Arc<PrimaryClient>,
    pub worker_id: WorkerId,
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn job_started(&self, job_id: &JobId, log_file: &str) -> Result<(), String> {
        self.client
            .start_job(job_id, &self.worker_id, log_file)
            .await
            .map_err(|e| e.to_string())
    }

    async fn stream_chunk(
        &self,
        job_id: &JobId,
        content: &str,
        append: bool,
    ) -> Result<(), String> {
        self.client
            .stream_log(job_id, &self.worker_id, content, append)
            .await
            .map_err(|e| e.to_string())
    }

    async fn job_completed(&self, job_id: &JobId, report: CompletionReport) -> Result<(), String> {
        let body = armada_wire::CompleteJobRequest {
            worker_id: self.worker_id.clone(),
            exit_code: report.exit_code,
            log_file: report.log_file,
            log_content: report.log_content,
            error_message: report.error_message,
            duration_seconds: report.duration_seconds,
            cmdb_facts: None,
            checkin: None,
        };
        self.client.complete_job(job_id, &body).await.map(|_| ()).map_err(|e| e.to_string())
    }
}

/// Test double recording every control-plane call.
#[cfg(test)]
pub(crate) struct RecordingControl {
    pub calls: parking_lot::Mutex<Vec<RecordedCall>>,
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) enum RecordedCall {
    Started { log_file: String },
    Chunk { content: String, append: bool },
    Completed { report_exit: i32, had_content: bool },
}

#[cfg(test)]
impl RecordingControl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { calls: parking_lot::Mutex::new(Vec::new()) })
    }
}

#[cfg(test)]
#[async_trait]
impl ControlPlane for RecordingControl {
    async fn job_started(&self, _job_id: &JobId, log_file: &str) -> Result<(), String> {
        self.calls.lock().push(RecordedCall::Started { log_file: log_file.to_string() });
        Ok(())
    }

    async fn stream_chunk(
        &self,
        _job_id: &JobId,
        content: &str,
        append: bool,
    ) -> Result<(), String> {
        self.calls.lock().push(RecordedCall::Chunk { content: content.to_string(), append });
        Ok(())
    }

    async fn job_completed(&self, _job_id: &JobId, report: CompletionReport) -> Result<(), String> {
        self.calls.lock().push(RecordedCall::Completed {
            report_exit: report.exit_code,
            had_content: report.log_content.is_some(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
