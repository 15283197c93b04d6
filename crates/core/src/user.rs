// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User record shape.
//!
//! Password hashing and session mechanics belong to the hosting layer; the
//! cluster core only reads `roles` and `enabled`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Unique login name; also the value matched against `submitted_by`
    /// and `created_by` for ownership checks
    pub username: String,
    /// Opaque to the core
    #[serde(default)]
    pub password_hash: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: u64,
    #[serde(default)]
    pub last_login: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

impl User {
    pub fn new(username: impl Into<String>, roles: Vec<String>, epoch_ms: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            password_hash: String::new(),
            roles,
            enabled: true,
            email: None,
            created_at: epoch_ms,
            last_login: None,
        }
    }
}
