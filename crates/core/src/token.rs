// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! API token records.
//!
//! The raw token value is shown exactly once at creation; only its SHA-256
//! hex digest is persisted. A token inherits the owning user's roles, and
//! tokens of a disabled user are rejected at resolution time.

use crate::id::TokenId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiToken {
    pub id: TokenId,
    pub user_id: String,
    /// Human-assigned label
    pub name: String,
    pub token_hash: String,
    pub created_at: u64,
    #[serde(default)]
    pub expires_at: Option<u64>,
    #[serde(default)]
    pub last_used: Option<u64>,
}

impl ApiToken {
    /// Create a token record plus its one-time raw value.
    pub fn generate(
        user_id: impl Into<String>,
        name: impl Into<String>,
        expires_at: Option<u64>,
        epoch_ms: u64,
    ) -> (Self, String) {
        let raw = format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        );
        let token = Self {
            id: TokenId::new(),
            user_id: user_id.into(),
            name: name.into(),
            token_hash: hash_token(&raw),
            created_at: epoch_ms,
            expires_at,
            last_used: None,
        };
        (token, raw)
    }

    pub fn is_expired(&self, epoch_ms: u64) -> bool {
        matches!(self.expires_at, Some(expiry) if epoch_ms >= expiry)
    }
}

/// Hex SHA-256 digest of a raw token value.
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
