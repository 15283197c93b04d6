// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Login, session probe, and user/role/token management.

use super::SharedEngine;
use crate::auth::{hash_password, verify_password, Principal};
use crate::error::ApiError;
use armada_core::{validate_role, ApiToken, AuditEntry, Role, User};
use armada_wire::{
    CreateRoleRequest, CreateTokenRequest, CreateTokenResponse, CreateUserRequest, LoginRequest,
    LoginResponse, SessionInfo, TokenEntry, UpdateUserRequest, UserEntry,
};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

// === Sessions ===

pub async fn login(
    State(engine): State<SharedEngine>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let now = engine.now_ms();

    if engine.tracker.is_locked(&body.username, now) {
        let retry_after_seconds =
            engine.tracker.lockout_remaining(&body.username, now).unwrap_or(0);
        return Err(ApiError::Locked { retry_after_seconds });
    }

    let user = engine.store.find_user_by_username(&body.username);
    let verified = user
        .as_ref()
        .is_some_and(|u| u.enabled && verify_password(&body.password, &u.password_hash));

    if !verified {
        engine.tracker.record_failure(&body.username, now);
        engine.audit_entry(
            AuditEntry::new(now, &body.username, "login").outcome("failure"),
        );
        // A lockout tripped by this attempt surfaces immediately.
        if engine.tracker.is_locked(&body.username, now) {
            let retry_after_seconds =
                engine.tracker.lockout_remaining(&body.username, now).unwrap_or(0);
            return Err(ApiError::Locked { retry_after_seconds });
        }
        return Err(ApiError::Unauthenticated);
    }

    // `verified` implies the lookup succeeded.
    let Some(user) = user else {
        return Err(ApiError::Internal("user lookup lost a verified user".into()));
    };
    engine.tracker.record_success(&user.username);
    let _ = engine.store.update_user(&user.username, |u| u.last_login = Some(now));

    let session = engine.sessions.create(&user, now);
    engine.audit_entry(AuditEntry::new(now, &user.username, "login"));
    Ok(Json(LoginResponse { session, username: user.username, roles: user.roles }))
}

pub async fn logout(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    if let Some(session) = bearer(&headers) {
        engine.sessions.destroy(&session);
    }
    Json(serde_json::json!({ "logged_out": true }))
}

pub async fn session(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
) -> Json<SessionInfo> {
    match engine.resolve_principal(&headers) {
        Principal::User(user) => Json(SessionInfo {
            authenticated: true,
            username: Some(user.username),
            roles: user.roles,
        }),
        _ => Json(SessionInfo::default()),
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_string())
}

// === Users ===

pub async fn list_users(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserEntry>>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    engine.require(&principal, "users:view")?;
    Ok(Json(engine.store.users().iter().map(UserEntry::from).collect()))
}

pub async fn get_user(
    State(engine): State<SharedEngine>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<Json<UserEntry>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    engine.require(&principal, "users:view")?;
    engine
        .store
        .find_user_by_username(&username)
        .map(|u| Json(UserEntry::from(&u)))
        .ok_or_else(|| ApiError::NotFound(format!("user {username}")))
}

pub async fn create_user(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<UserEntry>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    let actor = engine.require(&principal, "users:create")?;
    if body.username.is_empty() {
        return Err(ApiError::BadRequest("username is required".into()));
    }
    if body.password.is_empty() {
        return Err(ApiError::BadRequest("password is required".into()));
    }

    let mut user = User::new(&body.username, body.roles, engine.now_ms());
    user.password_hash = hash_password(&body.password);
    user.email = body.email;
    engine.store.insert_user(user.clone()).map_err(|err| match err {
        armada_storage::StorageError::Duplicate { .. } => {
            ApiError::Conflict(format!("user '{}' already exists", body.username))
        }
        other => ApiError::Storage(other),
    })?;

    engine.audit_entry(
        AuditEntry::new(engine.now_ms(), &actor.username, "user.create").resource(&body.username),
    );
    Ok(Json(UserEntry::from(&user)))
}

pub async fn update_user(
    State(engine): State<SharedEngine>,
    Path(username): Path<String>,
    headers: HeaderMap,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserEntry>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    let actor = engine.require(&principal, "users:edit")?;

    let updated = engine
        .store
        .update_user(&username, |u| {
            if let Some(password) = body.password.as_deref().filter(|p| !p.is_empty()) {
                u.password_hash = hash_password(password);
            }
            if let Some(roles) = &body.roles {
                u.roles = roles.clone();
            }
            if let Some(enabled) = body.enabled {
                u.enabled = enabled;
            }
            if let Some(email) = &body.email {
                u.email = Some(email.clone());
            }
            u.clone()
        })?
        .ok_or_else(|| ApiError::NotFound(format!("user {username}")))?;

    engine.audit_entry(
        AuditEntry::new(engine.now_ms(), &actor.username, "user.update").resource(&username),
    );
    Ok(Json(UserEntry::from(&updated)))
}

pub async fn delete_user(
    State(engine): State<SharedEngine>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    let actor = engine.require(&principal, "users:delete")?;
    if actor.username == username {
        return Err(ApiError::Conflict("cannot delete your own account".into()));
    }
    if !engine.store.delete_user(&username)? {
        return Err(ApiError::NotFound(format!("user {username}")));
    }
    engine.audit_entry(
        AuditEntry::new(engine.now_ms(), &actor.username, "user.delete").resource(&username),
    );
    Ok(Json(serde_json::json!({ "deleted": username })))
}

// === Roles ===

pub async fn list_roles(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
) -> Result<Json<Vec<Role>>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    engine.require(&principal, "roles:view")?;
    Ok(Json(engine.store.roles()))
}

pub async fn create_role(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Json(body): Json<CreateRoleRequest>,
) -> Result<Json<Role>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    let actor = engine.require(&principal, "roles:create")?;

    let role: Role = body.into();
    if engine.store.get_role(&role.id).is_some() {
        return Err(ApiError::Conflict(format!("role '{}' already exists", role.id)));
    }
    validate_role(&role, &engine.store.role_map())
        .map_err(|err| ApiError::Conflict(err.to_string()))?;
    engine.store.upsert_role(role.clone())?;

    engine.audit_entry(
        AuditEntry::new(engine.now_ms(), &actor.username, "role.create").resource(&role.id),
    );
    Ok(Json(role))
}

pub async fn update_role(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<CreateRoleRequest>,
) -> Result<Json<Role>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    let actor = engine.require(&principal, "roles:edit")?;

    let existing =
        engine.store.get_role(&id).ok_or_else(|| ApiError::NotFound(format!("role {id}")))?;
    if existing.builtin {
        return Err(ApiError::Conflict(format!("built-in role '{id}' cannot be modified")));
    }

    let mut role: Role = body.into();
    role.id = id.clone();
    validate_role(&role, &engine.store.role_map())
        .map_err(|err| ApiError::Conflict(err.to_string()))?;
    engine.store.upsert_role(role.clone())?;

    engine
        .audit_entry(AuditEntry::new(engine.now_ms(), &actor.username, "role.update").resource(&id));
    Ok(Json(role))
}

pub async fn delete_role(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let principal = engine.resolve_principal(&headers);
    let actor = engine.require(&principal, "roles:delete")?;

    let existing =
        engine.store.get_role(&id).ok_or_else(|| ApiError::NotFound(format!("role {id}")))?;
    if existing.builtin {
        return Err(ApiError::Conflict(format!("built-in role '{id}' cannot be deleted")));
    }
    engine.store.delete_role(&id)?;

    engine
        .audit_entry(AuditEntry::new(engine.now_ms(), &actor.username, "role.delete").resource(&id));
    Ok(Json(serde_json::json!({ "deleted": id })))
}

// === API tokens ===

/// Token management needs authentication only; every user manages their
/// own tokens.
fn require_user(engine: &SharedEngine, headers: &HeaderMap) -> Result<User, ApiError> {
    match engine.resolve_principal(headers) {
        Principal::User(user) => Ok(user),
        _ => Err(ApiError::Unauthenticated),
    }
}

pub async fn list_tokens(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
) -> Result<Json<Vec<TokenEntry>>, ApiError> {
    let user = require_user(&engine, &headers)?;
    let tokens = engine
        .store
        .tokens()
        .iter()
        .filter(|t| t.user_id == user.id)
        .map(TokenEntry::from)
        .collect();
    Ok(Json(tokens))
}

pub async fn create_token(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Json(body): Json<CreateTokenRequest>,
) -> Result<Json<CreateTokenResponse>, ApiError> {
    let user = require_user(&engine, &headers)?;
    if body.name.is_empty() {
        return Err(ApiError::BadRequest("token name is required".into()));
    }

    let now = engine.now_ms();
    let expires_at = body.expires_days.map(|days| now + u64::from(days) * DAY_MS);
    let (token, raw) = ApiToken::generate(&user.id, &body.name, expires_at, now);
    engine.store.insert_token(token.clone())?;

    engine.audit_entry(
        AuditEntry::new(now, &user.username, "token.create").resource(token.id.as_str()),
    );
    Ok(Json(CreateTokenResponse { token: raw, record: TokenEntry::from(&token) }))
}

pub async fn delete_token(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(&engine, &headers)?;
    let owned = engine.store.tokens().iter().any(|t| t.id == id.as_str() && t.user_id == user.id);
    if !owned {
        return Err(ApiError::NotFound(format!("token {id}")));
    }
    engine.store.delete_token(&id)?;
    engine.audit_entry(
        AuditEntry::new(engine.now_ms(), &user.username, "token.delete").resource(&id),
    );
    Ok(Json(serde_json::json!({ "deleted": id })))
}
