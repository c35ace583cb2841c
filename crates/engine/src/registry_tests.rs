// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sv_core::{InstanceId, InstanceType, Session, SessionTransport};
use tempfile::tempdir;

#[test]
fn cleanup_stale_closes_rows_past_the_default_ttl() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();
    let now = Utc::now();
    store
        .register_session(
            Session::new(InstanceId::new("ps-a").unwrap(), "consilio", InstanceType::Ps, SessionTransport::Cli, "tmux:ps-a", now),
            DEFAULT_STALE_TTL_SECS,
        )
        .unwrap();

    let later = now + chrono::Duration::seconds(DEFAULT_STALE_TTL_SECS as i64 + 1);
    let closed = cleanup_stale(&mut store, later).unwrap();
    assert_eq!(closed, 1);
    assert!(store.state().sessions.is_empty());
}

#[test]
fn cleanup_stale_is_a_no_op_when_nothing_is_stale() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();
    assert_eq!(cleanup_stale(&mut store, Utc::now()).unwrap(), 0);
}
