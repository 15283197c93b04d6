// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User collection with username uniqueness.

use super::RecordStore;
use crate::records::StorageError;
use armada_core::User;

impl RecordStore {
    pub fn insert_user(&self, user: User) -> Result<(), StorageError> {
        {
            let state = self.state.lock();
            if state.users.values().any(|u| u.username == user.username) {
                return Err(StorageError::Duplicate { kind: "user", key: user.username });
            }
        }
        self.persist("users", &user.id.clone(), &user)?;
        self.state.lock().users.insert(user.id.clone(), user);
        Ok(())
    }

    pub fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.state.lock().users.values().find(|u| u.username == username).cloned()
    }

    pub fn get_user(&self, id: &str) -> Option<User> {
        self.state.lock().users.get(id).cloned()
    }

    pub fn update_user<R>(
        &self,
        username: &str,
        f: impl FnOnce(&mut User) -> R,
    ) -> Result<Option<R>, StorageError> {
        let mut state = self.state.lock();
        let Some(user) = state.users.values_mut().find(|u| u.username == username) else {
            return Ok(None);
        };
        let result = f(user);
        let snapshot = user.clone();
        drop(state);
        self.persist("users", &snapshot.id, &snapshot)?;
        Ok(Some(result))
    }

    pub fn delete_user(&self, username: &str) -> Result<bool, StorageError> {
        let mut state = self.state.lock();
        let Some(id) = state
            .users
            .values()
            .find(|u| u.username == username)
            .map(|u| u.id.clone())
        else {
            return Ok(false);
        };
        state.users.remove(&id);
        drop(state);
        self.unlink("users", &id)?;
        Ok(true)
    }

    pub fn users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.state.lock().users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }
}
