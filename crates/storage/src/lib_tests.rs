// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sv_core::{Environment, GitStatus, InstanceType, Session, SessionTransport};
use tempfile::tempdir;

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

fn instance(id: &str) -> InstanceId {
    InstanceId::new(id).unwrap()
}

#[test]
fn mutations_are_visible_immediately_and_journaled() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();
    let now = Utc::now();

    store
        .log_event(instance("ps-a"), "decision", serde_json::json!({"n": 1}), None, now)
        .unwrap();

    assert_eq!(store.state().events.len(), 1);
}

#[test]
fn restart_without_snapshot_replays_the_full_wal() {
    let dir = tempdir().unwrap();
    let now = Utc::now();
    {
        let mut store = Store::open(dir.path()).unwrap();
        store
            .log_event(instance("ps-a"), "decision", serde_json::json!({}), None, now)
            .unwrap();
        store
            .create_checkpoint(instance("ps-a"), CheckpointKind::Manual, 12.0, work_state(now), serde_json::json!({}), now)
            .unwrap();
    }

    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.state().events.len(), 1);
    assert_eq!(store.state().checkpoints.len(), 1);
}

#[test]
fn checkpoint_then_restart_replays_only_the_remaining_tail() {
    let dir = tempdir().unwrap();
    let now = Utc::now();
    {
        let mut store = Store::open(dir.path()).unwrap();
        store
            .log_event(instance("ps-a"), "decision", serde_json::json!({}), None, now)
            .unwrap();
        store.checkpoint(now).unwrap();
        store
            .log_event(instance("ps-a"), "followup", serde_json::json!({}), None, now)
            .unwrap();
    }

    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.state().events.len(), 2);
}

#[test]
fn spawn_sweep_transitions_are_journaled_and_survive_restart() {
    let dir = tempdir().unwrap();
    let now = Utc::now();
    {
        let mut store = Store::open(dir.path()).unwrap();
        store
            .register_spawn(Spawn {
                project: "consilio".into(),
                task_id: "epic-1".into(),
                task_type: "epic".into(),
                description: "thing".into(),
                output_file: "/tmp/out".into(),
                spawn_time: now,
                last_output_change: now,
                status: SpawnStatus::Running,
                exit_code: None,
                error_message: None,
                completed_at: None,
                pid: None,
            })
            .unwrap();
        let later = now + chrono::Duration::seconds(sv_core::STALL_THRESHOLD_SECS as i64 + 1);
        store.sweep_stalled_spawns(later).unwrap();
    }

    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.state().spawns.get("consilio", "epic-1").unwrap().status, SpawnStatus::Stalled);
}

#[test]
fn session_registration_is_not_replayed_across_restart() {
    let dir = tempdir().unwrap();
    let now = Utc::now();
    {
        let mut store = Store::open(dir.path()).unwrap();
        store
            .register_session(
                Session::new(instance("ps-a"), "consilio", InstanceType::Ps, SessionTransport::Cli, "tmux:ps-a", now),
                sv_core::DEFAULT_STALE_TTL_SECS,
            )
            .unwrap();
        assert_eq!(store.state().sessions.len(), 1);
    }

    let store = Store::open(dir.path()).unwrap();
    assert!(store.state().sessions.is_empty());
}

#[test]
fn cleanup_checkpoints_prunes_and_journals_each_expired_row() {
    let dir = tempdir().unwrap();
    let now = Utc::now();
    let old = now - chrono::Duration::days(45);
    {
        let mut store = Store::open(dir.path()).unwrap();
        store
            .create_checkpoint(instance("ps-a"), CheckpointKind::Manual, 10.0, work_state(old), serde_json::json!({}), old)
            .unwrap();
        store
            .create_checkpoint(instance("ps-a"), CheckpointKind::Manual, 10.0, work_state(now), serde_json::json!({}), now)
            .unwrap();
        let removed = store.cleanup_checkpoints(now, sv_core::DEFAULT_RETENTION_DAYS).unwrap();
        assert_eq!(removed, 1);
    }

    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.state().checkpoints.len(), 1);
}

#[test]
fn cleanup_stale_sessions_closes_and_journals_each_stale_row() {
    let dir = tempdir().unwrap();
    let now = Utc::now();
    {
        let mut store = Store::open(dir.path()).unwrap();
        store
            .register_session(
                Session::new(instance("ps-a"), "consilio", InstanceType::Ps, SessionTransport::Cli, "tmux:ps-a", now),
                sv_core::DEFAULT_STALE_TTL_SECS,
            )
            .unwrap();
        let later = now + chrono::Duration::seconds(sv_core::DEFAULT_STALE_TTL_SECS as i64 + 1);
        let closed = store.cleanup_stale_sessions(sv_core::DEFAULT_STALE_TTL_SECS, later).unwrap();
        assert_eq!(closed, 1);
        assert!(store.state().sessions.is_empty());
    }

    let store = Store::open(dir.path()).unwrap();
    assert!(store.state().sessions.is_empty());
}
