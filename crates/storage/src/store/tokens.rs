// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! API token collection.

use super::RecordStore;
use crate::records::StorageError;
use armada_core::ApiToken;

impl RecordStore {
    pub fn insert_token(&self, token: ApiToken) -> Result<(), StorageError> {
        self.persist("tokens", token.id.as_str(), &token)?;
        self.state.lock().tokens.insert(token.id.clone(), token);
        Ok(())
    }

    /// Look up a token record by the hash of its raw value.
    pub fn find_token_by_hash(&self, token_hash: &str) -> Option<ApiToken> {
        self.state
            .lock()
            .tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned()
    }

    /// Record the moment a token was last used.
    pub fn touch_token(&self, id: &str, epoch_ms: u64) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        let Some(token) = state.tokens.get_mut(id) else {
            return Ok(());
        };
        token.last_used = Some(epoch_ms);
        let snapshot = token.clone();
        drop(state);
        self.persist("tokens", snapshot.id.as_str(), &snapshot)
    }

    pub fn delete_token(&self, id: &str) -> Result<bool, StorageError> {
        let removed = self.state.lock().tokens.remove(id);
        if removed.is_some() {
            self.unlink("tokens", id)?;
        }
        Ok(removed.is_some())
    }

    pub fn tokens(&self) -> Vec<ApiToken> {
        let mut tokens: Vec<ApiToken> = self.state.lock().tokens.values().cloned().collect();
        tokens.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        tokens
    }
}
