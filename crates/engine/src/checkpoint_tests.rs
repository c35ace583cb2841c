// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sv_adapters::fakes::FakeGitProbe;
use tempfile::tempdir;

fn instance(id: &str) -> InstanceId {
    InstanceId::new(id).unwrap()
}

fn ctx() -> CaptureContext {
    CaptureContext { project: "consilio".into(), working_directory: "/repo".into(), hostname: "host-1".into() }
}

#[tokio::test]
async fn capture_populates_git_status_when_probe_succeeds() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();
    let git = FakeGitProbe::new();
    git.seed(
        "/repo",
        GitStatus { branch: "main".into(), staged: 1, unstaged: 2, untracked: 3, commit_count: 40, ..Default::default() },
    );

    let checkpoint =
        capture(&mut store, &git, instance("ps-a"), CheckpointKind::Manual, 42.0, ctx(), Utc::now()).await.unwrap();
    assert_eq!(checkpoint.work_state.git_status.branch, "main");
}

#[tokio::test]
async fn capture_carries_git_probe_files_into_work_state() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();
    let git = FakeGitProbe::new();
    let changed = sv_core::FileChange {
        path: "src/lib.rs".into(),
        status: sv_core::FileChangeStatus::Modified,
        lines_changed: 12,
        last_modified: Utc::now(),
    };
    git.seed(
        "/repo",
        GitStatus { branch: "main".into(), staged: 1, unstaged: 0, untracked: 0, commit_count: 40, files: vec![changed.clone()] },
    );

    let checkpoint =
        capture(&mut store, &git, instance("ps-a"), CheckpointKind::Manual, 42.0, ctx(), Utc::now()).await.unwrap();
    assert_eq!(checkpoint.work_state.files_modified, vec![changed]);
}

#[tokio::test]
async fn capture_degrades_gracefully_when_git_is_unavailable() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();
    let git = FakeGitProbe::new(); // nothing seeded -> GitError::NotARepo

    let checkpoint =
        capture(&mut store, &git, instance("ps-a"), CheckpointKind::Manual, 10.0, ctx(), Utc::now()).await.unwrap();
    assert_eq!(checkpoint.work_state.git_status, GitStatus::default());
}

#[tokio::test]
async fn resume_markdown_mentions_branch_and_epic() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();
    let git = FakeGitProbe::new();
    git.seed(
        "/repo",
        GitStatus { branch: "feature/x".into(), staged: 0, unstaged: 0, untracked: 0, commit_count: 5, ..Default::default() },
    );
    let checkpoint =
        capture(&mut store, &git, instance("ps-a"), CheckpointKind::EpicCompletion, 55.0, ctx(), Utc::now())
            .await
            .unwrap();

    let (_, markdown) = retrieve(&store, &checkpoint.checkpoint_id).unwrap();
    assert!(markdown.contains("feature/x"));
    assert!(markdown.contains("Resume"));
}

#[tokio::test]
async fn list_paginates_newest_first() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();
    let git = FakeGitProbe::new();
    let now = Utc::now();
    let mut ids = Vec::new();
    for i in 0..3 {
        let c = capture(&mut store, &git, instance("ps-a"), CheckpointKind::Manual, i as f64, ctx(), now)
            .await
            .unwrap();
        ids.push(c.checkpoint_id);
    }

    let page = list(&store, &instance("ps-a"), None, 2, 0);
    assert_eq!(page, vec![ids[2].clone(), ids[1].clone()]);
}

#[tokio::test]
async fn cleanup_reports_count_and_estimated_freed_bytes() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();
    let git = FakeGitProbe::new();
    let now = Utc::now();
    let old = now - chrono::Duration::days(45);
    capture(&mut store, &git, instance("ps-a"), CheckpointKind::Manual, 1.0, ctx(), old).await.unwrap();

    let (removed, freed_bytes) = cleanup(&mut store, now, None).unwrap();
    assert_eq!(removed, 1);
    assert!(freed_bytes > 0);
}
