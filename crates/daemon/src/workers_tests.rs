// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sv_adapters::fakes::{FakeDockerProbe, FakeProcessProbe, FakeTmuxChannel, FakeTunnelDaemonControl};
use sv_core::{InstanceType, Session, SessionTransport};
use sv_engine::RestartManager;
use tempfile::tempdir;

fn open_store() -> (tempfile::TempDir, Arc<Mutex<Store>>) {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    (dir, Arc::new(Mutex::new(store)))
}

#[tokio::test]
async fn start_and_shutdown_stops_all_workers_promptly() {
    let (_dir, store) = open_store();
    let tmux = FakeTmuxChannel::new();
    let topology = Arc::new(Topology::new(FakeDockerProbe::new(), "cloudflared"));
    let restart = Arc::new(RestartManager::new(FakeTunnelDaemonControl::new(), "proj-a"));

    let workers = start(store, tmux, FakeProcessProbe::new(), topology, restart, Duration::from_secs(600));

    // Cancellation short-circuits every tick-or-cancel select immediately,
    // so shutdown must return well inside the grace period even though
    // each worker's own interval is minutes long.
    tokio::time::timeout(Duration::from_secs(5), workers.shutdown()).await.unwrap();
}

#[tokio::test]
async fn health_monitor_loop_probes_active_sessions_on_tick() {
    let (_dir, store) = open_store();
    let now = Utc::now();
    {
        let mut guard = store.lock();
        let session = Session::new(
            sv_core::InstanceId::new("ps-a").unwrap(),
            "proj-a",
            InstanceType::Ps,
            SessionTransport::Cli,
            "tmux:proj-a",
            now,
        );
        guard.register_session(session, 3600).unwrap();
    }
    let tmux = FakeTmuxChannel::new();
    let cancel = CancellationToken::new();
    let loop_cancel = cancel.clone();
    let tmux_clone = tmux.clone();
    let store_clone = store.clone();
    let handle = tokio::spawn(async move {
        health_monitor_loop(store_clone, tmux_clone, FakeProcessProbe::new(), Duration::from_millis(5), loop_cancel).await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    handle.await.unwrap();

    assert!(tmux.sent("tmux:proj-a").iter().any(|m| m.contains("context window usage")));
}
