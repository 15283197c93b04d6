// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Revisioned content bundle store.
//!
//! The bundle is the union of the four content directories plus the fixed
//! top-level files. The revision is the SHA-256 of the sorted per-file
//! manifest, so it is content-addressed: committing identical content
//! always yields the identical revision string.

mod paths;

pub use paths::safe_rel_path;

use armada_wire::FileEntry;
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directories distributed to every worker.
pub const SYNC_DIRS: [&str; 4] = ["playbooks", "inventory", "library", "callback_plugins"];
/// Top-level files distributed alongside them.
pub const SYNC_FILES: [&str; 1] = ["ansible.cfg"];

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("path '{0}' escapes the content root")]
    UnsafePath(String),
    #[error("file '{0}' not found")]
    NotFound(String),
}

/// One change in a [`ContentStore::commit`] call: write bytes, or delete.
pub enum Change {
    Write(Vec<u8>),
    Delete,
}

struct ContentState {
    revision: String,
    manifest: BTreeMap<String, FileEntry>,
}

pub struct ContentStore {
    root: PathBuf,
    state: Mutex<ContentState>,
}

impl ContentStore {
    /// Open the store, creating the bundle directories and computing the
    /// initial revision from what is on disk.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ContentError> {
        let root = root.into();
        for dir in SYNC_DIRS {
            fs::create_dir_all(root.join(dir))?;
        }
        let manifest = build_manifest(&root)?;
        let revision = revision_of(&manifest);
        tracing::info!(revision = %armada_core::short(&revision, 7), files = manifest.len(), "content store opened");
        Ok(Self { root, state: Mutex::new(ContentState { revision, manifest }) })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current_revision(&self) -> String {
        self.state.lock().revision.clone()
    }

    /// Current revision plus the per-file manifest.
    pub fn manifest(&self) -> (String, BTreeMap<String, FileEntry>) {
        let state = self.state.lock();
        (state.revision.clone(), state.manifest.clone())
    }

    /// Assemble the bundle as a gzipped tarball.
    pub fn archive(&self) -> Result<Vec<u8>, ContentError> {
        let state = self.state.lock();
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for rel in state.manifest.keys() {
            let path = self.root.join(rel);
            let mut file = fs::File::open(&path)?;
            builder.append_file(rel, &mut file)?;
        }
        let encoder = builder.into_inner()?;
        Ok(encoder.finish()?)
    }

    /// Read a single bundle file. Rejects any path that would escape the
    /// content root.
    pub fn file(&self, rel: &str) -> Result<Vec<u8>, ContentError> {
        let safe = safe_rel_path(rel).ok_or_else(|| ContentError::UnsafePath(rel.to_string()))?;
        let path = self.root.join(safe);
        if !path.is_file() {
            return Err(ContentError::NotFound(rel.to_string()));
        }
        Ok(fs::read(path)?)
    }

    /// Apply a set of changes and swap to the new revision.
    ///
    /// Readers are held off by the state lock for the duration, so archive
    /// and manifest calls never observe a half-applied commit.
    pub fn commit(
        &self,
        changes: Vec<(String, Change)>,
    ) -> Result<String, ContentError> {
        let mut state = self.state.lock();
        for (rel, change) in &changes {
            let safe =
                safe_rel_path(rel).ok_or_else(|| ContentError::UnsafePath(rel.clone()))?;
            let path = self.root.join(safe);
            match change {
                Change::Write(bytes) => {
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&path, bytes)?;
                }
                Change::Delete => {
                    if path.exists() {
                        fs::remove_file(&path)?;
                    }
                }
            }
        }
        state.manifest = build_manifest(&self.root)?;
        state.revision = revision_of(&state.manifest);
        tracing::info!(
            revision = %armada_core::short(&state.revision, 7),
            changes = changes.len(),
            "content committed"
        );
        Ok(state.revision.clone())
    }
}

/// Walk the bundle directories and files, hashing every regular file.
/// Hidden files and directories are skipped, matching the worker side.
fn build_manifest(root: &Path) -> Result<BTreeMap<String, FileEntry>, ContentError> {
    let mut manifest = BTreeMap::new();

    for dir in SYNC_DIRS {
        let dir_path = root.join(dir);
        if !dir_path.is_dir() {
            continue;
        }
        for entry in walkdir::WalkDir::new(&dir_path)
            .into_iter()
            .filter_entry(|e| !is_hidden(e.file_name()))
        {
            let entry = entry.map_err(std::io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| std::io::Error::other(e.to_string()))?
                .to_string_lossy()
                .replace('\\', "/");
            manifest.insert(rel, hash_file(entry.path())?);
        }
    }

    for name in SYNC_FILES {
        let path = root.join(name);
        if path.is_file() {
            manifest.insert(name.to_string(), hash_file(&path)?);
        }
    }

    Ok(manifest)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn hash_file(path: &Path) -> Result<FileEntry, ContentError> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    let mut size = 0u64;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        size += n as u64;
        hasher.update(&buf[..n]);
    }
    Ok(FileEntry { sha256: format!("{:x}", hasher.finalize()), size })
}

/// Content-addressed revision: SHA-256 over the sorted manifest entries.
fn revision_of(manifest: &BTreeMap<String, FileEntry>) -> String {
    let mut hasher = Sha256::new();
    for (path, entry) in manifest {
        hasher.update(path.as_bytes());
        hasher.update([0]);
        hasher.update(entry.sha256.as_bytes());
        hasher.update([0]);
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
#[path = "content_tests.rs"]
mod tests;
