// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sv_core::{ErrorKind, InstanceType, SessionTransport};

fn session(instance_id: &str, project: &str, now: DateTime<Utc>) -> Session {
    Session::new(
        InstanceId::new(instance_id).unwrap(),
        project,
        InstanceType::Ps,
        SessionTransport::Cli,
        format!("tmux:{instance_id}"),
        now,
    )
}

#[test]
fn register_rejects_duplicate_instance_id() {
    let now = Utc::now();
    let mut store = SessionStore::default();
    store.register(session("ps-a", "consilio", now), DEFAULT_STALE_TTL_SECS).unwrap();
    let err = store.register(session("ps-a", "other", now), DEFAULT_STALE_TTL_SECS).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[test]
fn register_rejects_second_live_session_for_same_project() {
    let now = Utc::now();
    let mut store = SessionStore::default();
    store.register(session("ps-a", "consilio", now), DEFAULT_STALE_TTL_SECS).unwrap();
    let err = store.register(session("ps-b", "consilio", now), DEFAULT_STALE_TTL_SECS).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[test]
fn register_allows_new_session_once_prior_is_stale() {
    let now = Utc::now();
    let mut store = SessionStore::default();
    store.register(session("ps-a", "consilio", now), DEFAULT_STALE_TTL_SECS).unwrap();
    let later = now + chrono::Duration::seconds(DEFAULT_STALE_TTL_SECS as i64 + 1);
    store.register(session("ps-b", "consilio", later), DEFAULT_STALE_TTL_SECS).unwrap();
    assert_eq!(store.len(), 2);
}

#[test]
fn context_usage_prefers_percent_over_used_total() {
    let now = Utc::now();
    let mut store = SessionStore::default();
    let id = InstanceId::new("ps-a").unwrap();
    store.register(session("ps-a", "consilio", now), DEFAULT_STALE_TTL_SECS).unwrap();

    store.update_context_usage(&id, Some(0.87), Some(1), Some(2), now).unwrap();
    assert_eq!(store.get(&id).unwrap().context_usage, 0.87);

    store.update_context_usage(&id, None, Some(100_000), Some(200_000), now).unwrap();
    assert_eq!(store.get(&id).unwrap().context_usage, 0.5);
}

#[test]
fn reset_context_usage_zeroes_after_handoff() {
    let now = Utc::now();
    let mut store = SessionStore::default();
    let id = InstanceId::new("ps-a").unwrap();
    store.register(session("ps-a", "consilio", now), DEFAULT_STALE_TTL_SECS).unwrap();
    store.update_context_usage(&id, Some(0.9), None, None, now).unwrap();

    store.reset_context_usage(&id).unwrap();
    assert_eq!(store.get(&id).unwrap().context_usage, 0.0);
}

#[test]
fn list_active_excludes_stale_sessions() {
    let now = Utc::now();
    let mut store = SessionStore::default();
    store.register(session("ps-a", "consilio", now), DEFAULT_STALE_TTL_SECS).unwrap();
    let later = now + chrono::Duration::seconds(DEFAULT_STALE_TTL_SECS as i64 + 1);
    assert!(store.list_active(later).is_empty());
    assert_eq!(store.list_active(now).len(), 1);
}

#[test]
fn stale_lists_rows_past_ttl_without_closing_them() {
    let now = Utc::now();
    let mut store = SessionStore::default();
    store.register(session("ps-a", "consilio", now), DEFAULT_STALE_TTL_SECS).unwrap();
    assert!(store.stale(DEFAULT_STALE_TTL_SECS, now).is_empty());

    let later = now + chrono::Duration::seconds(DEFAULT_STALE_TTL_SECS as i64 + 1);
    let stale = store.stale(DEFAULT_STALE_TTL_SECS, later);
    assert_eq!(stale, vec![InstanceId::new("ps-a").unwrap()]);
    assert_eq!(store.len(), 1);
}

#[test]
fn close_removes_and_returns_the_row() {
    let now = Utc::now();
    let mut store = SessionStore::default();
    store.register(session("ps-a", "consilio", now), DEFAULT_STALE_TTL_SECS).unwrap();
    let id = InstanceId::new("ps-a").unwrap();
    let closed = store.close(&id).unwrap();
    assert_eq!(closed.project, "consilio");
    assert!(store.get(&id).is_err());
}
