// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-record JSON persistence helpers.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors from the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate {kind} '{key}'")]
    Duplicate { kind: &'static str, key: String },
    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },
}

/// Write a record atomically: serialize to `<id>.json.tmp`, then rename over
/// the final path so readers never observe a torn document.
pub(crate) fn write_record<T: Serialize>(
    dir: &Path,
    id: &str,
    record: &T,
) -> Result<(), StorageError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{id}.json"));
    let tmp = dir.join(format!("{id}.json.tmp"));
    fs::write(&tmp, serde_json::to_vec_pretty(record)?)?;
    fs::rename(&tmp, &path)?;
    Ok(())
}

pub(crate) fn remove_record(dir: &Path, id: &str) -> Result<(), StorageError> {
    let path = dir.join(format!("{id}.json"));
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Load every `*.json` record in a directory, keyed by a function of the
/// record. Unreadable documents are logged and skipped rather than failing
/// the whole startup.
pub(crate) fn load_dir<T, K, F>(dir: &Path, key: F) -> Result<HashMap<K, T>, StorageError>
where
    T: DeserializeOwned,
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut records = HashMap::new();
    if !dir.is_dir() {
        return Ok(records);
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let bytes = fs::read(&path)?;
        match serde_json::from_slice::<T>(&bytes) {
            Ok(record) => {
                records.insert(key(&record), record);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable record");
            }
        }
    }
    Ok(records)
}
