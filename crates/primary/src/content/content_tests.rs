// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn store_with_playbook() -> (tempfile::TempDir, ContentStore) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("playbooks")).unwrap();
    std::fs::write(dir.path().join("playbooks/hello.yml"), b"- hosts: all\n").unwrap();
    let store = ContentStore::open(dir.path()).unwrap();
    (dir, store)
}

#[test]
fn open_creates_bundle_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let _store = ContentStore::open(dir.path()).unwrap();
    for sub in SYNC_DIRS {
        assert!(dir.path().join(sub).is_dir());
    }
}

#[test]
fn manifest_includes_playbook_and_top_level_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("playbooks")).unwrap();
    std::fs::write(dir.path().join("playbooks/site.yml"), b"x").unwrap();
    std::fs::write(dir.path().join("ansible.cfg"), b"[defaults]\n").unwrap();
    std::fs::write(dir.path().join("README.md"), b"not part of the bundle").unwrap();

    let store = ContentStore::open(dir.path()).unwrap();
    let (_, manifest) = store.manifest();

    assert!(manifest.contains_key("playbooks/site.yml"));
    assert!(manifest.contains_key("ansible.cfg"));
    assert!(!manifest.contains_key("README.md"));
}

#[test]
fn hidden_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("playbooks")).unwrap();
    std::fs::write(dir.path().join("playbooks/.hidden.yml"), b"x").unwrap();

    let store = ContentStore::open(dir.path()).unwrap();
    let (_, manifest) = store.manifest();
    assert!(manifest.is_empty());
}

#[test]
fn commit_changes_revision() {
    let (_dir, store) = store_with_playbook();
    let before = store.current_revision();

    let after = store
        .commit(vec![("playbooks/new.yml".into(), Change::Write(b"- hosts: web\n".to_vec()))])
        .unwrap();

    assert_ne!(before, after);
    assert_eq!(store.current_revision(), after);
    let (_, manifest) = store.manifest();
    assert!(manifest.contains_key("playbooks/new.yml"));
}

#[test]
fn identical_content_yields_identical_revision() {
    let (_dir, store) = store_with_playbook();
    let before = store.current_revision();

    // Rewrite the same bytes: the content-addressed revision must not move.
    let after = store
        .commit(vec![("playbooks/hello.yml".into(), Change::Write(b"- hosts: all\n".to_vec()))])
        .unwrap();
    assert_eq!(before, after);
}

#[test]
fn commit_delete_removes_from_manifest() {
    let (_dir, store) = store_with_playbook();
    store.commit(vec![("playbooks/hello.yml".into(), Change::Delete)]).unwrap();
    let (_, manifest) = store.manifest();
    assert!(!manifest.contains_key("playbooks/hello.yml"));
}

#[test]
fn file_rejects_escaping_paths() {
    let (_dir, store) = store_with_playbook();
    assert!(matches!(store.file("../secrets"), Err(ContentError::UnsafePath(_))));
    assert!(matches!(store.file("playbooks/../../x"), Err(ContentError::UnsafePath(_))));
    assert!(store.file("playbooks/hello.yml").is_ok());
}

#[test]
fn archive_roundtrips_through_tar() {
    let (_dir, store) = store_with_playbook();
    let bytes = store.archive().unwrap();

    let decoder = flate2::read::GzDecoder::new(bytes.as_slice());
    let mut archive = tar::Archive::new(decoder);
    let names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["playbooks/hello.yml"]);
}
