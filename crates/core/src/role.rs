// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Role definitions and write-time validation.
//!
//! Built-in roles are seeded at primary startup and can be neither edited
//! nor deleted. Custom roles may inherit from any role; the inheritance
//! graph must stay a DAG.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// A named bundle of permissions, optionally inheriting other roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub inherits: Vec<String>,
    /// Built-in roles are immutable
    #[serde(default)]
    pub builtin: bool,
}

/// Errors rejected when writing a role definition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("role id '{0}' collides with a built-in role")]
    BuiltinCollision(String),
    #[error("built-in role '{0}' cannot be modified")]
    BuiltinImmutable(String),
    #[error("role '{0}' would create an inheritance cycle")]
    InheritanceCycle(String),
}

fn builtin(id: &str, name: &str, description: &str, permissions: &[&str]) -> Role {
    Role {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        inherits: Vec::new(),
        builtin: true,
    }
}

/// The built-in roles created on first run.
pub fn builtin_roles() -> Vec<Role> {
    vec![
        builtin("admin", "Administrator", "Full access to all resources", &["*:*"]),
        builtin(
            "operator",
            "Operator",
            "Run playbooks, manage schedules, view logs",
            &[
                "playbooks:*",
                "schedules:*",
                "jobs:*",
                "logs:view",
                "inventory:view",
                "workers:view",
                "cmdb:view",
                "agent:view",
                "agent:generate",
                "agent:analyze",
            ],
        ),
        builtin(
            "monitor",
            "Monitor",
            "Read-only access for monitoring",
            &[
                "playbooks:view",
                "logs:view",
                "jobs:view",
                "workers:view",
                "cmdb:view",
                "schedules:view",
                "inventory:view",
                "agent:view",
            ],
        ),
        builtin(
            "servers_admin",
            "Server Administrator",
            "Full access to server resources",
            &[
                "playbooks.servers:*",
                "inventory.servers:*",
                "schedules:*",
                "logs:view",
                "jobs:view",
                "cmdb:view",
            ],
        ),
        builtin(
            "servers_operator",
            "Server Operator",
            "Run server playbooks only",
            &[
                "playbooks.servers:run",
                "playbooks.servers:view",
                "logs:view",
                "inventory.servers:view",
                "jobs:view",
                "cmdb:view",
            ],
        ),
        builtin(
            "network_admin",
            "Network Administrator",
            "Full access to network resources",
            &[
                "playbooks.network:*",
                "inventory.network:*",
                "schedules:*",
                "logs:view",
                "jobs:view",
                "cmdb:view",
            ],
        ),
        builtin(
            "network_operator",
            "Network Operator",
            "Run network playbooks only",
            &[
                "playbooks.network:run",
                "playbooks.network:view",
                "logs:view",
                "inventory.network:view",
                "jobs:view",
                "cmdb:view",
            ],
        ),
        builtin(
            "developer",
            "Developer",
            "Create/edit playbooks, test inventory",
            &[
                "playbooks:edit",
                "playbooks:view",
                "inventory:view",
                "schedules.own:*",
                "jobs:view",
                "logs:view",
                "agent:view",
                "agent:generate",
            ],
        ),
        builtin("auditor", "Auditor", "Read-only access including audit logs", &["*:view", "audit:view"]),
    ]
}

/// Validate a custom role write against the existing role set.
///
/// Rejects id collisions with built-in roles and inheritance cycles.
/// Unknown inherited ids are tolerated; they simply contribute no
/// permissions at resolution time.
pub fn validate_role(role: &Role, existing: &HashMap<String, Role>) -> Result<(), RoleError> {
    if let Some(current) = existing.get(&role.id) {
        if current.builtin {
            return Err(RoleError::BuiltinCollision(role.id.clone()));
        }
    }

    // Cycle check: walk inherits from the candidate over the graph with the
    // candidate's own edges substituted in.
    let mut stack = vec![role.id.clone()];
    let mut visited = HashSet::new();
    while let Some(current) = stack.pop() {
        let edges = if current == role.id {
            &role.inherits
        } else {
            match existing.get(&current) {
                Some(r) => &r.inherits,
                None => continue,
            }
        };
        for parent in edges {
            if *parent == role.id {
                return Err(RoleError::InheritanceCycle(role.id.clone()));
            }
            if visited.insert(parent.clone()) {
                stack.push(parent.clone());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "role_tests.rs"]
mod tests;
