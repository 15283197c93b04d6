// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn role(id: &str, inherits: &[&str]) -> Role {
    Role {
        id: id.into(),
        name: id.into(),
        description: String::new(),
        permissions: vec![],
        inherits: inherits.iter().map(|s| s.to_string()).collect(),
        builtin: false,
    }
}

fn existing(roles: Vec<Role>) -> HashMap<String, Role> {
    roles.into_iter().map(|r| (r.id.clone(), r)).collect()
}

#[test]
fn nine_builtin_roles() {
    let roles = builtin_roles();
    assert_eq!(roles.len(), 9);
    assert!(roles.iter().all(|r| r.builtin));

    let admin = roles.iter().find(|r| r.id == "admin").unwrap();
    assert_eq!(admin.permissions, vec!["*:*"]);
}

#[test]
fn custom_role_accepted() {
    let defs = existing(builtin_roles());
    let candidate = role("deploy-team", &["operator"]);
    assert_eq!(validate_role(&candidate, &defs), Ok(()));
}

#[test]
fn builtin_id_collision_rejected() {
    let defs = existing(builtin_roles());
    let candidate = role("admin", &[]);
    assert_eq!(
        validate_role(&candidate, &defs),
        Err(RoleError::BuiltinCollision("admin".into()))
    );
}

#[test]
fn self_inheritance_rejected() {
    let defs = existing(vec![]);
    let candidate = role("a", &["a"]);
    assert_eq!(validate_role(&candidate, &defs), Err(RoleError::InheritanceCycle("a".into())));
}

#[test]
fn indirect_cycle_rejected() {
    // b inherits c, c inherits a; writing a → b closes the loop.
    let defs = existing(vec![role("b", &["c"]), role("c", &["a"])]);
    let candidate = role("a", &["b"]);
    assert_eq!(validate_role(&candidate, &defs), Err(RoleError::InheritanceCycle("a".into())));
}

#[test]
fn diamond_inheritance_is_fine() {
    let defs = existing(vec![role("left", &["base"]), role("right", &["base"]), role("base", &[])]);
    let candidate = role("top", &["left", "right"]);
    assert_eq!(validate_role(&candidate, &defs), Ok(()));
}

#[test]
fn unknown_inherit_tolerated() {
    let defs = existing(vec![]);
    let candidate = role("a", &["nonexistent"]);
    assert_eq!(validate_role(&candidate, &defs), Ok(()));
}

#[test]
fn updating_existing_custom_role_allowed() {
    let defs = existing(vec![role("team", &[])]);
    let candidate = role("team", &["monitor"]);
    assert_eq!(validate_role(&candidate, &defs), Ok(()));
}
