// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    plain = { "playbooks/site.yml", Some("playbooks/site.yml") },
    nested = { "library/modules/custom.py", Some("library/modules/custom.py") },
    current_dir = { "./playbooks/site.yml", Some("playbooks/site.yml") },
    parent_escape = { "../etc/passwd", None },
    embedded_parent = { "playbooks/../../etc/passwd", None },
    absolute = { "/etc/passwd", None },
    empty = { "", None },
    dot_only = { ".", None },
)]
fn safe_rel_path_cases(raw: &str, expected: Option<&str>) {
    assert_eq!(safe_rel_path(raw), expected.map(PathBuf::from));
}
