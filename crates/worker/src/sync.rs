// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content synchronization with the primary.
//!
//! Full sync replaces the four content directories from the bundle archive
//! (with a backup to roll back to); incremental sync transfers only the
//! manifest diff. Both are serialized within a worker: the main loop is the
//! only caller and a sync in progress suppresses further triggers.

use crate::client::{ClientError, PrimaryClient};
use armada_wire::FileEntry;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directories distributed from the primary.
pub const SYNC_DIRS: [&str; 4] = ["playbooks", "inventory", "library", "callback_plugins"];
/// Top-level files distributed alongside them.
pub const SYNC_FILES: [&str; 1] = ["ansible.cfg"];

const ARCHIVE_NAME: &str = ".sync-archive.tar.gz";
const BACKUP_NAME: &str = ".sync-backup";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("unsafe archive member: {0}")]
    UnsafeMember(String),
    #[error("{failed} of {attempted} file transfers failed: {detail}")]
    PartialTransfer { failed: usize, attempted: usize, detail: String },
}

/// Outcome of a sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub revision: Option<String>,
    pub files_synced: usize,
}

pub struct ContentSync {
    content_dir: PathBuf,
    local_revision: Option<String>,
}

impl ContentSync {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self { content_dir: content_dir.into(), local_revision: None }
    }

    pub fn local_revision(&self) -> Option<&str> {
        self.local_revision.as_deref()
    }

    /// Ensure all sync directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in SYNC_DIRS {
            fs::create_dir_all(self.content_dir.join(dir))?;
        }
        Ok(())
    }

    /// Compare the local revision with the server's.
    pub async fn check_sync_needed(
        &self,
        client: &PrimaryClient,
    ) -> Result<(bool, String), SyncError> {
        let info = client.revision().await?;
        let needs = self.local_revision.as_deref() != Some(info.revision.as_str());
        Ok((needs, info.revision))
    }

    /// Sync, preferring incremental once a baseline exists. An incremental
    /// failure falls back to a full sync within the same call.
    pub async fn sync(&mut self, client: &PrimaryClient, force_full: bool) -> Result<SyncOutcome, SyncError> {
        let (needs_sync, server_revision) = self.check_sync_needed(client).await?;
        if !needs_sync && !force_full {
            return Ok(SyncOutcome { revision: self.local_revision.clone(), files_synced: 0 });
        }

        if self.local_revision.is_none() || force_full {
            return self.full_sync(client, server_revision).await;
        }

        match self.incremental_sync(client).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                tracing::warn!(error = %err, "incremental sync failed, falling back to full sync");
                self.full_sync(client, server_revision).await
            }
        }
    }

    /// Download the archive and replace the content directories wholesale.
    /// On any failure the previous content is restored from the backup.
    pub async fn full_sync(
        &mut self,
        client: &PrimaryClient,
        server_revision: String,
    ) -> Result<SyncOutcome, SyncError> {
        fs::create_dir_all(&self.content_dir)?;
        let archive_path = self.content_dir.join(ARCHIVE_NAME);
        client.download_archive(&archive_path).await?;

        let backup_dir = self.content_dir.join(BACKUP_NAME);
        let result = self.replace_from_archive(&archive_path, &backup_dir);

        let _ = fs::remove_file(&archive_path);
        match result {
            Ok(files_synced) => {
                let _ = fs::remove_dir_all(&backup_dir);
                self.local_revision = Some(server_revision.clone());
                tracing::info!(
                    revision = %armada_core::short(&server_revision, 7),
                    files_synced,
                    "full sync complete"
                );
                Ok(SyncOutcome { revision: Some(server_revision), files_synced })
            }
            Err(err) => {
                restore_backup(&backup_dir, &self.content_dir);
                Err(err)
            }
        }
    }

    fn replace_from_archive(
        &self,
        archive_path: &Path,
        backup_dir: &Path,
    ) -> Result<usize, SyncError> {
        // Snapshot current dirs, then clear them for extraction.
        let _ = fs::remove_dir_all(backup_dir);
        fs::create_dir_all(backup_dir)?;
        for dir in SYNC_DIRS {
            let src = self.content_dir.join(dir);
            if src.is_dir() {
                fs::rename(&src, backup_dir.join(dir))?;
            }
            fs::create_dir_all(&src)?;
        }

        let file = fs::File::open(archive_path)?;
        let files_synced = safe_extract(file, &self.content_dir)?;
        Ok(files_synced)
    }

    /// Transfer only the manifest diff. Per-file errors are collected and
    /// reported at the end so one bad file does not abort the rest; any
    /// error makes the whole pass fail so the caller falls back to a full
    /// sync.
    pub async fn incremental_sync(
        &mut self,
        client: &PrimaryClient,
    ) -> Result<SyncOutcome, SyncError> {
        let manifest = client.manifest().await?;
        let local = build_local_manifest(&self.content_dir)?;
        let (new_files, modified, deleted) = diff_manifests(&manifest.files, &local);

        let mut files_synced = 0;
        let mut errors = Vec::new();
        let to_download: Vec<&String> = new_files.iter().chain(modified.iter()).collect();
        let attempted = to_download.len();

        for rel in to_download {
            let Some(safe) = safe_rel_path(rel) else {
                errors.push(format!("{rel}: unsafe path"));
                continue;
            };
            match client.download_file(rel, &self.content_dir.join(safe)).await {
                Ok(()) => files_synced += 1,
                Err(err) => errors.push(format!("{rel}: {err}")),
            }
        }

        for rel in &deleted {
            let Some(safe) = safe_rel_path(rel) else {
                continue;
            };
            let path = self.content_dir.join(safe);
            if path.exists() {
                if let Err(err) = fs::remove_file(&path) {
                    errors.push(format!("delete {rel}: {err}"));
                }
            }
        }

        if !errors.is_empty() {
            return Err(SyncError::PartialTransfer {
                failed: errors.len(),
                attempted,
                detail: errors.join("; "),
            });
        }

        self.local_revision = Some(manifest.revision.clone());
        if files_synced > 0 || !deleted.is_empty() {
            tracing::info!(
                revision = %armada_core::short(&manifest.revision, 7),
                files_synced,
                deleted = deleted.len(),
                "incremental sync complete"
            );
        }
        Ok(SyncOutcome { revision: Some(manifest.revision), files_synced })
    }
}

fn restore_backup(backup_dir: &Path, content_dir: &Path) {
    for dir in SYNC_DIRS {
        let saved = backup_dir.join(dir);
        if !saved.is_dir() {
            continue;
        }
        let dst = content_dir.join(dir);
        let _ = fs::remove_dir_all(&dst);
        if let Err(err) = fs::rename(&saved, &dst) {
            tracing::error!(dir, error = %err, "backup restore failed");
        }
    }
    let _ = fs::remove_dir_all(backup_dir);
}

/// Classify server manifest entries against the local manifest.
/// Returns (new, modified, deleted) relative paths.
pub fn diff_manifests(
    server: &BTreeMap<String, FileEntry>,
    local: &BTreeMap<String, FileEntry>,
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut new_files = Vec::new();
    let mut modified = Vec::new();
    for (path, entry) in server {
        match local.get(path) {
            None => new_files.push(path.clone()),
            Some(have) if have.sha256 != entry.sha256 => modified.push(path.clone()),
            Some(_) => {}
        }
    }
    let deleted = local.keys().filter(|p| !server.contains_key(*p)).cloned().collect();
    (new_files, modified, deleted)
}

/// Hash every regular file under the sync directories plus the fixed
/// top-level files. Hidden entries are skipped.
pub fn build_local_manifest(content_dir: &Path) -> std::io::Result<BTreeMap<String, FileEntry>> {
    let mut manifest = BTreeMap::new();

    for dir in SYNC_DIRS {
        let dir_path = content_dir.join(dir);
        if !dir_path.is_dir() {
            continue;
        }
        for entry in walkdir::WalkDir::new(&dir_path)
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'))
        {
            let entry = entry.map_err(std::io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(content_dir)
                .map_err(|e| std::io::Error::other(e.to_string()))?
                .to_string_lossy()
                .replace('\\', "/");
            manifest.insert(rel, hash_file(entry.path())?);
        }
    }

    for name in SYNC_FILES {
        let path = content_dir.join(name);
        if path.is_file() {
            manifest.insert(name.to_string(), hash_file(&path)?);
        }
    }

    Ok(manifest)
}

fn hash_file(path: &Path) -> std::io::Result<FileEntry> {
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

/// Extract a gzipped tarball into `dest`, rejecting any member whose
/// normalized destination is not strictly inside it: absolute paths, `..`
/// segments, and link targets pointing outside. Returns the number of
/// files extracted.
pub fn safe_extract<R: Read>(reader: R, dest: &Path) -> Result<usize, SyncError> {
    let decoder = flate2::read::GzDecoder::new(reader);
    let mut archive = tar::Archive::new(decoder);
    let mut extracted = 0;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let raw_path = entry.path()?.into_owned();
        let display = raw_path.display().to_string();
        if safe_rel_path(&display).is_none() {
            return Err(SyncError::UnsafeMember(display));
        }

        let entry_type = entry.header().entry_type();
        if entry_type.is_symlink() || entry_type.is_hard_link() {
            let target = entry
                .link_name()?
                .ok_or_else(|| SyncError::UnsafeMember(display.clone()))?;
            if !link_target_is_safe(&raw_path, &target) {
                return Err(SyncError::UnsafeMember(display));
            }
        }

        // unpack_in applies its own containment check as a second layer.
        if entry.unpack_in(dest)? && entry_type.is_file() {
            extracted += 1;
        }
    }
    Ok(extracted)
}

/// Normalize a relative path, rejecting anything that could leave the
/// destination: absolute paths, prefixes, or `..` segments.
fn safe_rel_path(raw: &str) -> Option<PathBuf> {
    if raw.is_empty() {
        return None;
    }
    let mut clean = PathBuf::new();
    for component in Path::new(raw).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if clean.as_os_str().is_empty() {
        return None;
    }
    Some(clean)
}

/// A link member is safe when its target, resolved against the member's own
/// directory, stays inside the extraction root.
fn link_target_is_safe(member: &Path, target: &Path) -> bool {
    if target.is_absolute() {
        return false;
    }
    let mut depth: i32 = member.components().count() as i32 - 1;
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
