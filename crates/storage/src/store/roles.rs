// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Role collection.

use super::RecordStore;
use crate::records::StorageError;
use armada_core::Role;
use std::collections::HashMap;

impl RecordStore {
    /// Seed any built-in roles that are missing. Existing definitions are
    /// left untouched so records survive version upgrades.
    pub fn seed_builtin_roles(&self, builtins: Vec<Role>) -> Result<(), StorageError> {
        for role in builtins {
            if self.state.lock().roles.contains_key(&role.id) {
                continue;
            }
            self.upsert_role(role)?;
        }
        Ok(())
    }

    pub fn upsert_role(&self, role: Role) -> Result<(), StorageError> {
        self.persist("roles", &role.id, &role)?;
        self.state.lock().roles.insert(role.id.clone(), role);
        Ok(())
    }

    pub fn get_role(&self, id: &str) -> Option<Role> {
        self.state.lock().roles.get(id).cloned()
    }

    pub fn delete_role(&self, id: &str) -> Result<bool, StorageError> {
        let removed = self.state.lock().roles.remove(id);
        if removed.is_some() {
            self.unlink("roles", id)?;
        }
        Ok(removed.is_some())
    }

    pub fn roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.state.lock().roles.values().cloned().collect();
        roles.sort_by(|a, b| a.id.cmp(&b.id));
        roles
    }

    /// Full id → role map for permission resolution.
    pub fn role_map(&self) -> HashMap<String, Role> {
        self.state.lock().roles.clone()
    }
}
