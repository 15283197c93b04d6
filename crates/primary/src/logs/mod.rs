// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log broker: streaming chunks in, fan-out to subscribers, persistence.
//!
//! While a job runs its log accumulates in `partial-<job_id>.log`; on
//! completion the content moves to the final `<playbook>_<short>_<ts>.log`
//! name. A subscriber joining mid-stream receives the entire current
//! artifact as its first payload, then live chunks; the topics lock
//! orders the snapshot against concurrent appends so there is no gap or
//! overlap.

use armada_core::{JobId, JobStatus};
use armada_wire::UiEvent;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

const TOPIC_CAPACITY: usize = 256;

pub struct LogBroker {
    logs_dir: PathBuf,
    topics: Mutex<HashMap<JobId, broadcast::Sender<UiEvent>>>,
}

impl LogBroker {
    pub fn new(logs_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let logs_dir = logs_dir.into();
        fs::create_dir_all(&logs_dir)?;
        Ok(Self { logs_dir, topics: Mutex::new(HashMap::new()) })
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    fn partial_path(&self, job_id: &JobId) -> PathBuf {
        self.logs_dir.join(format!("partial-{job_id}.log"))
    }

    /// Accept a streamed chunk: append (or reset) the partial artifact and
    /// publish to the job topic.
    pub fn append_chunk(
        &self,
        job_id: &JobId,
        content: &str,
        append: bool,
    ) -> std::io::Result<()> {
        let mut topics = self.topics.lock();
        let path = self.partial_path(job_id);
        if append {
            let mut file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
            file.write_all(content.as_bytes())?;
        } else {
            fs::write(&path, content.as_bytes())?;
        }
        if let Some(sender) = topics.get(job_id) {
            let _ = sender.send(UiEvent::LogChunk {
                job_id: job_id.clone(),
                content: content.to_string(),
                append,
            });
        } else {
            // Create the topic lazily so chunks arriving before any
            // subscriber still establish ordering for later joins.
            let (sender, _) = broadcast::channel(TOPIC_CAPACITY);
            topics.insert(job_id.clone(), sender);
        }
        Ok(())
    }

    /// Join a job's topic. Returns the catch-up payload (the full current
    /// partial or final artifact) and a live receiver. The two are taken
    /// under one lock acquisition so the subscriber sees every byte exactly
    /// once.
    pub fn subscribe(
        &self,
        job_id: &JobId,
        final_name: Option<&str>,
    ) -> (String, broadcast::Receiver<UiEvent>) {
        let mut topics = self.topics.lock();
        let receiver = topics
            .entry(job_id.clone())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe();

        let partial = self.partial_path(job_id);
        let catch_up = if partial.is_file() {
            fs::read_to_string(&partial).unwrap_or_default()
        } else if let Some(name) = final_name.and_then(|n| safe_log_name(n)) {
            fs::read_to_string(self.logs_dir.join(name)).unwrap_or_default()
        } else {
            String::new()
        };
        (catch_up, receiver)
    }

    /// Persist the final log and drop the partial artifact.
    ///
    /// When the completion payload carries the full log content it wins
    /// (the worker's copy is authoritative); otherwise the partial is
    /// renamed in place. Returns whether a final artifact exists.
    pub fn finalize(
        &self,
        job_id: &JobId,
        final_name: &str,
        content: Option<&str>,
    ) -> std::io::Result<bool> {
        let Some(name) = safe_log_name(final_name) else {
            return Err(std::io::Error::other(format!("unsafe log name: {final_name}")));
        };
        let _topics = self.topics.lock();
        let final_path = self.logs_dir.join(name);
        let partial = self.partial_path(job_id);

        let stored = match content {
            Some(text) => {
                fs::write(&final_path, text.as_bytes())?;
                if partial.exists() {
                    fs::remove_file(&partial)?;
                }
                true
            }
            None if partial.exists() => {
                fs::rename(&partial, &final_path)?;
                true
            }
            None => final_path.is_file(),
        };
        Ok(stored)
    }

    /// Publish the terminal event for a job and retire its topic.
    pub fn publish_completed(&self, job_id: &JobId, status: JobStatus, exit_code: Option<i32>) {
        let mut topics = self.topics.lock();
        if let Some(sender) = topics.remove(job_id) {
            let _ = sender.send(UiEvent::JobCompleted { job_id: job_id.clone(), status, exit_code });
        }
    }

    /// Read a stored log by its final basename.
    pub fn read_log(&self, name: &str) -> std::io::Result<String> {
        let Some(name) = safe_log_name(name) else {
            return Err(std::io::Error::other(format!("unsafe log name: {name}")));
        };
        fs::read_to_string(self.logs_dir.join(name))
    }

    /// Read the live partial artifact for a running job, if any.
    pub fn read_partial(&self, job_id: &JobId) -> Option<String> {
        fs::read_to_string(self.partial_path(job_id)).ok()
    }

    /// Delete a final log file, tolerating absence.
    pub fn remove_log(&self, name: &str) {
        if let Some(name) = safe_log_name(name) {
            let _ = fs::remove_file(self.logs_dir.join(name));
        }
    }
}

/// Log names are bare basenames produced by the worker; anything with a
/// path separator is refused.
fn safe_log_name(name: &str) -> Option<&str> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.starts_with("..") {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
