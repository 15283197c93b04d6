// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Playbook catalogue over the content store, scoped by permissions.
//!
//! Playbooks live under `playbooks/` in the bundle; a first-level
//! subdirectory acts as the playbook's tag (`playbooks/servers/deploy.yml`
//! carries the `servers` tag). A user sees a tagged playbook when their
//! permissions grant that tag; untagged playbooks only require the base
//! `playbooks:view`.

use super::Engine;
use armada_core::{accessible_tags, Clock, TagAccess, User};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybookEntry {
    /// Name as used at submission (no extension)
    pub name: String,
    /// Bundle-relative path
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub size: u64,
}

impl<C: Clock> Engine<C> {
    /// List the playbooks visible to a user.
    pub fn list_playbooks(&self, user: &User) -> Vec<PlaybookEntry> {
        let (_, manifest) = self.content.manifest();
        let access = accessible_tags(user, "playbooks", &self.store.role_map());

        manifest
            .iter()
            .filter_map(|(path, entry)| parse_playbook_path(path).map(|(name, tag)| PlaybookEntry {
                name,
                path: path.clone(),
                tag,
                size: entry.size,
            }))
            .filter(|playbook| match (&access, &playbook.tag) {
                (TagAccess::Unlimited, _) => true,
                (TagAccess::Tags(_), None) => true,
                (TagAccess::Tags(tags), Some(tag)) => tags.contains(tag),
            })
            .collect()
    }
}

/// Split a manifest path into (playbook name, tag). Non-playbook paths and
/// non-YAML files return `None`.
fn parse_playbook_path(path: &str) -> Option<(String, Option<String>)> {
    let rest = path.strip_prefix("playbooks/")?;
    if !(rest.ends_with(".yml") || rest.ends_with(".yaml")) {
        return None;
    }
    let mut parts = rest.split('/');
    let first = parts.next()?;
    match parts.next() {
        // playbooks/<tag>/<file>; deeper nesting keeps the first-level tag
        Some(_) => {
            let file = rest.rsplit('/').next()?;
            Some((stem(file), Some(first.to_string())))
        }
        None => Some((stem(first), None)),
    }
}

fn stem(file: &str) -> String {
    file.trim_end_matches(".yaml").trim_end_matches(".yml").to_string()
}

#[cfg(test)]
#[path = "playbooks_tests.rs"]
mod tests;
