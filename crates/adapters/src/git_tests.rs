// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_probe_returns_seeded_status() {
    use crate::fakes::FakeGitProbe;

    let probe = FakeGitProbe::new();
    probe.seed(
        "/repo",
        GitStatus { branch: "main".into(), staged: 2, unstaged: 1, untracked: 3, commit_count: 42, ..Default::default() },
    );

    let status = probe.status("/repo").await.unwrap();
    assert_eq!(status.branch, "main");
    assert_eq!(status.commit_count, 42);
}

#[tokio::test]
async fn fake_probe_errors_on_unseeded_directory_by_default() {
    use crate::fakes::FakeGitProbe;

    let probe = FakeGitProbe::new();
    let err = probe.status("/no-such-repo").await.unwrap_err();
    assert!(matches!(err, GitError::NotARepo));
}

#[test]
fn parses_staged_unstaged_and_untracked_entries() {
    let output = "1 M. N... 100644 100644 100644 abcd1234 abcd1234 src/lib.rs\n\
                  1 .M N... 100644 100644 100644 abcd1234 abcd1234 README.md\n\
                  ? scratch.txt";
    let (staged, unstaged, untracked, entries) = parse_porcelain_v2(output);

    assert_eq!((staged, unstaged, untracked), (1, 1, 1));
    assert_eq!(
        entries,
        vec![
            ("src/lib.rs".to_string(), FileChangeStatus::Modified),
            ("README.md".to_string(), FileChangeStatus::Modified),
            ("scratch.txt".to_string(), FileChangeStatus::Added),
        ]
    );
}

#[test]
fn parses_added_and_deleted_ordinary_entries() {
    let output = "1 A. N... 000000 100644 100644 0000000 abcd1234 new_file.rs\n\
                  1 .D N... 100644 100644 000000 abcd1234 0000000 old_file.rs";
    let (_, _, _, entries) = parse_porcelain_v2(output);

    assert_eq!(
        entries,
        vec![
            ("new_file.rs".to_string(), FileChangeStatus::Added),
            ("old_file.rs".to_string(), FileChangeStatus::Deleted),
        ]
    );
}

#[test]
fn parses_renamed_entry_using_the_new_path() {
    let output = "2 R. N... 100644 100644 100644 abcd1234 abcd1234 R100 renamed_to.rs\told_name.rs";
    let (_, _, _, entries) = parse_porcelain_v2(output);

    assert_eq!(entries, vec![("renamed_to.rs".to_string(), FileChangeStatus::Modified)]);
}
