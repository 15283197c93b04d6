// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn user_entry_strips_password_hash() {
    let mut user = armada_core::User::new("alice", vec!["operator".into()], 1_000);
    user.password_hash = "hunter2-hashed".into();

    let entry = UserEntry::from(&user);
    let json = serde_json::to_value(&entry).unwrap();
    assert!(json.get("password_hash").is_none());
    assert_eq!(json["username"], "alice");
}

#[test]
fn token_entry_strips_hash() {
    let (token, _raw) = armada_core::ApiToken::generate("u-1", "ci", None, 1_000);
    let entry = TokenEntry::from(&token);
    let json = serde_json::to_value(&entry).unwrap();
    assert!(json.get("token_hash").is_none());
}

#[test]
fn create_user_request_carries_plaintext_password() {
    let req: CreateUserRequest =
        serde_json::from_str(r#"{"username": "alice", "password": "hunter2"}"#).unwrap();
    assert_eq!(req.password, "hunter2");

    // An omitted password deserializes empty; the primary rejects it.
    let bare: CreateUserRequest = serde_json::from_str(r#"{"username": "alice"}"#).unwrap();
    assert!(bare.password.is_empty());
}

#[test]
fn update_user_request_password_is_optional() {
    let req: UpdateUserRequest = serde_json::from_str(r#"{"enabled": false}"#).unwrap();
    assert!(req.password.is_none());
    assert_eq!(req.enabled, Some(false));

    let with_password: UpdateUserRequest =
        serde_json::from_str(r#"{"password": "new-secret"}"#).unwrap();
    assert_eq!(with_password.password.as_deref(), Some("new-secret"));
}

#[test]
fn create_role_request_is_never_builtin() {
    let req = CreateRoleRequest {
        id: "team".into(),
        name: "Team".into(),
        description: String::new(),
        permissions: vec!["jobs:view".into()],
        inherits: vec![],
    };
    let role: armada_core::Role = req.into();
    assert!(!role.builtin);
}

#[test]
fn error_body_shape() {
    let body = ErrorBody { error: "Permission denied".into(), required_permission: Some("jobs:submit".into()) };
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["error"], "Permission denied");
    assert_eq!(json["required_permission"], "jobs:submit");
}
