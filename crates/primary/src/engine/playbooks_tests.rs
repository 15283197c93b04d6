// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{parse_playbook_path, PlaybookEntry};
use crate::engine::test_helpers::test_engine;
use crate::content::Change;
use armada_core::{Role, User};
use yare::parameterized;

fn seed_playbooks(fixture: &crate::engine::test_helpers::TestEngine) {
    fixture
        .engine
        .content
        .commit(vec![
            ("playbooks/site.yml".into(), Change::Write(b"- hosts: all\n".to_vec())),
            ("playbooks/servers/deploy.yml".into(), Change::Write(b"- hosts: web\n".to_vec())),
            ("playbooks/network/switches.yaml".into(), Change::Write(b"- hosts: sw\n".to_vec())),
        ])
        .unwrap();
}

fn user_with_role(fixture: &crate::engine::test_helpers::TestEngine, permissions: &[&str]) -> User {
    fixture
        .engine
        .store
        .upsert_role(Role {
            id: "probe".into(),
            name: "probe".into(),
            description: String::new(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            inherits: vec![],
            builtin: false,
        })
        .unwrap();
    User::new("probe-user", vec!["probe".into()], 0)
}

fn names(entries: &[PlaybookEntry]) -> Vec<&str> {
    entries.iter().map(|p| p.name.as_str()).collect()
}

#[test]
fn admin_sees_everything() {
    let fixture = test_engine();
    seed_playbooks(&fixture);
    let admin = User::new("root", vec!["admin".into()], 0);

    let playbooks = fixture.engine.list_playbooks(&admin);
    assert_eq!(names(&playbooks), ["switches", "deploy", "site"]);
}

#[test]
fn tag_scoped_user_sees_their_tag_plus_untagged() {
    let fixture = test_engine();
    seed_playbooks(&fixture);
    let user = user_with_role(&fixture, &["playbooks.servers:view"]);

    let playbooks = fixture.engine.list_playbooks(&user);
    assert_eq!(names(&playbooks), ["deploy", "site"]);
    assert_eq!(playbooks[0].tag.as_deref(), Some("servers"));
    assert_eq!(playbooks[1].tag, None);
}

#[test]
fn base_view_grant_is_unlimited() {
    // `playbooks:view` matches `playbooks:*` via the action wildcard check,
    // so a base grant sees every tag.
    let fixture = test_engine();
    seed_playbooks(&fixture);
    let user = user_with_role(&fixture, &["playbooks:view"]);

    assert_eq!(fixture.engine.list_playbooks(&user).len(), 3);
}

#[test]
fn no_grants_sees_nothing_tagged() {
    let fixture = test_engine();
    seed_playbooks(&fixture);
    let user = user_with_role(&fixture, &["jobs:view"]);

    let playbooks = fixture.engine.list_playbooks(&user);
    assert_eq!(names(&playbooks), ["site"]);
}

#[parameterized(
    top_level = { "playbooks/site.yml", Some(("site", None)) },
    tagged = { "playbooks/servers/deploy.yml", Some(("deploy", Some("servers"))) },
    nested = { "playbooks/servers/app/web.yml", Some(("web", Some("servers"))) },
    yaml_ext = { "playbooks/network/sw.yaml", Some(("sw", Some("network"))) },
    not_yaml = { "playbooks/README.md", None },
    other_dir = { "inventory/hosts", None },
)]
fn path_parsing(path: &str, expected: Option<(&str, Option<&str>)>) {
    let parsed = parse_playbook_path(path);
    let expected = expected.map(|(name, tag)| (name.to_string(), tag.map(str::to_string)));
    assert_eq!(parsed, expected);
}
