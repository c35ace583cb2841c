// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sv_core::{Environment, GitStatus};

fn work_state(now: DateTime<Utc>) -> WorkState {
    WorkState {
        current_epic: None,
        files_modified: Vec::new(),
        git_status: GitStatus::default(),
        last_commands: Vec::new(),
        prd_status: None,
        environment: Environment {
            project: "consilio".into(),
            working_directory: "/repo".into(),
            hostname: "host-1".into(),
        },
        snapshot_at: now,
    }
}

fn id(instance: &str) -> InstanceId {
    InstanceId::new(instance).unwrap()
}

#[test]
fn create_assigns_monotonic_sequence_per_instance() {
    let now = Utc::now();
    let mut store = CheckpointStore::default();
    let first = store
        .create(id("ps-a"), CheckpointKind::Manual, 10.0, work_state(now), serde_json::json!({}), now)
        .unwrap();
    let second = store
        .create(id("ps-a"), CheckpointKind::ContextWindow, 55.0, work_state(now), serde_json::json!({}), now)
        .unwrap();
    assert_eq!(first.sequence_num, 1);
    assert_eq!(second.sequence_num, 2);
}

#[test]
fn sequence_counters_are_independent_per_instance() {
    let now = Utc::now();
    let mut store = CheckpointStore::default();
    store.create(id("ps-a"), CheckpointKind::Manual, 10.0, work_state(now), serde_json::json!({}), now).unwrap();
    let other = store
        .create(id("ps-b"), CheckpointKind::Manual, 10.0, work_state(now), serde_json::json!({}), now)
        .unwrap();
    assert_eq!(other.sequence_num, 1);
}

#[test]
fn create_rejects_percent_out_of_range() {
    let now = Utc::now();
    let mut store = CheckpointStore::default();
    let err = store
        .create(id("ps-a"), CheckpointKind::Manual, 150.0, work_state(now), serde_json::json!({}), now)
        .unwrap_err();
    assert_eq!(err.kind, sv_core::ErrorKind::Validation);
}

#[test]
fn latest_returns_the_most_recent_checkpoint() {
    let now = Utc::now();
    let mut store = CheckpointStore::default();
    store.create(id("ps-a"), CheckpointKind::Manual, 10.0, work_state(now), serde_json::json!({}), now).unwrap();
    let second = store
        .create(id("ps-a"), CheckpointKind::EpicCompletion, 20.0, work_state(now), serde_json::json!({}), now)
        .unwrap();
    assert_eq!(store.latest(&id("ps-a")).unwrap().checkpoint_id, second.checkpoint_id);
}

#[test]
fn cleanup_removes_only_expired_rows() {
    let now = Utc::now();
    let mut store = CheckpointStore::default();
    let old = now - chrono::Duration::days(45);
    store.create(id("ps-a"), CheckpointKind::Manual, 10.0, work_state(old), serde_json::json!({}), old).unwrap();
    store.create(id("ps-a"), CheckpointKind::Manual, 10.0, work_state(now), serde_json::json!({}), now).unwrap();

    let removed = store.cleanup(now, sv_core::DEFAULT_RETENTION_DAYS);
    assert_eq!(removed, 1);
    assert_eq!(store.list(&id("ps-a")).len(), 1);
}
