// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named background workers (spec §5: "the runtime hosts several long-lived
//! workers... each worker is a named scheduled task with a start/stop
//! lifecycle"):
//!
//! - Health Monitor sweep loop (C6) — spec §4.6's three probes, run once
//!   per active session per tick.
//! - Docker Topology poller (C10) — refreshes [`sv_engine::Topology`]'s
//!   container/network cache every [`sv_engine::TOPOLOGY_POLL_INTERVAL`].
//! - Tunnel health / Restart Manager worker (spec §4.10 + design note "the
//!   tunnel health poller") — probes the tunnel daemon every
//!   [`sv_engine::restart_manager::PROBE_INTERVAL`] and restarts it (with
//!   backoff) through [`sv_engine::RestartManager`] once three consecutive
//!   probes fail. `RestartManager::probe_and_maybe_restart` already owns
//!   the backoff sleep, so the Tunnel Health Monitor loop and the Restart
//!   Manager worker spec §5 names separately are one ticking task here —
//!   the restart itself still runs to completion (including its own
//!   cancellable backoff) inside that task before the next probe fires.
//!
//! Each loop owns a [`CancellationToken`] and stops cleanly when it fires
//! (spec Design Notes: "shutdown waits for all to finish their current
//! iteration up to a fixed grace period").

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use sv_adapters::{DockerProbe, ProcessProbe, TmuxChannel, TunnelDaemonControl};
use sv_core::CheckpointKind;
use sv_engine::{checkpoint, health_monitor, RestartManager, Topology};
use sv_storage::Store;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Grace period `shutdown` waits for a single in-flight tick to finish
/// before abandoning the task (spec Design Notes).
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// A set of named background tasks with a single stop point.
pub struct Workers {
    cancel: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl Workers {
    fn new() -> Self {
        Self { cancel: CancellationToken::new(), handles: Vec::new() }
    }

    fn spawn(&mut self, name: &'static str, fut: impl std::future::Future<Output = ()> + Send + 'static) {
        self.handles.push((name, tokio::spawn(fut)));
    }

    /// Cancel every worker and wait up to [`SHUTDOWN_GRACE`] for each to
    /// observe cancellation and return; stragglers are abandoned (detached,
    /// not forcibly killed — they share no further mutable state once the
    /// daemon stops accepting connections).
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for (name, handle) in self.handles {
            match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
                Ok(Ok(())) => debug!(worker = name, "worker stopped"),
                Ok(Err(err)) => warn!(worker = name, error = %err, "worker task panicked"),
                Err(_) => warn!(worker = name, "worker did not stop within grace period"),
            }
        }
    }
}

/// Tick interval for the health-monitor sweep, the sole interval the spec
/// pins a number to (§4.6: "every 10 min").
pub const HEALTH_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Start all four named background workers and return a handle that can
/// stop them together.
#[allow(clippy::too_many_arguments)]
pub fn start<Doc, T, Pr>(
    store: Arc<Mutex<Store>>,
    tmux: impl TmuxChannel,
    process: Pr,
    topology: Arc<Topology<Doc>>,
    restart: Arc<RestartManager<T>>,
    health_sweep_interval: Duration,
) -> Workers
where
    Doc: DockerProbe,
    T: TunnelDaemonControl,
    Pr: ProcessProbe,
{
    let mut workers = Workers::new();
    let cancel = workers.cancel.clone();

    workers.spawn("health_monitor", health_monitor_loop(store.clone(), tmux, process, health_sweep_interval, cancel.clone()));
    workers.spawn("docker_topology", topology_loop(topology, cancel.clone()));
    workers.spawn("tunnel_restart", tunnel_restart_loop(store, restart, cancel));

    workers
}

/// Health Monitor sweep loop (C6). Every tick, runs the spawn sweep and
/// orphaned-work probes for each active session's project and asks the PS
/// to report its context usage (the context probe itself completes
/// asynchronously when `SessionUpdateContextUsage` arrives back through the
/// dispatcher — spec §4.6 probe 2: "emit a message that causes the PS to
/// report token usage back into the registry").
async fn health_monitor_loop(
    store: Arc<Mutex<Store>>,
    tmux: impl TmuxChannel,
    process: impl ProcessProbe,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            () = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let now = Utc::now();
        let sessions: Vec<_> = store.lock().state().sessions.list_active(now).into_iter().cloned().collect();
        for session in sessions {
            let project = session.project.clone();
            let has_recent_spawn = {
                let guard = store.lock();
                !guard.state().spawns.list(Some(&project)).is_empty()
            };
            let has_current_epic = {
                let guard = store.lock();
                !checkpoint::list(&guard, &session.instance_id, Some(CheckpointKind::EpicCompletion), 1, 0).is_empty()
            };

            if let Err(err) = health_monitor::probe_spawns(&store, &process, &project, now).await {
                warn!(project, error = %err, "spawn sweep failed");
            }
            {
                let mut guard = store.lock();
                if let Err(err) = health_monitor::probe_orphaned_work(&mut guard, &project, has_recent_spawn, has_current_epic, now) {
                    warn!(project, error = %err, "orphaned-work probe failed");
                }
            }

            if session.transport == sv_core::SessionTransport::Cli {
                let prompt = "Please report your current context window usage percentage.";
                if let Err(err) = tmux.send_keys(&session.external_handle, prompt).await {
                    warn!(instance_id = %session.instance_id, error = %err, "failed to send context-usage probe");
                }
            }
        }
    }
}

/// Docker Topology Intel poller (C10, spec §4.9: "polls the container
/// runtime every 60 s").
async fn topology_loop<Doc: DockerProbe>(topology: Arc<Topology<Doc>>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(sv_engine::TOPOLOGY_POLL_INTERVAL);
    loop {
        tokio::select! {
            () = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }
        topology.poll(Utc::now()).await;
    }
}

/// Tunnel health / Restart Manager worker (spec §4.10, §5).
async fn tunnel_restart_loop<T: TunnelDaemonControl>(
    store: Arc<Mutex<Store>>,
    restart: Arc<RestartManager<T>>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(sv_engine::restart_manager::PROBE_INTERVAL);
    loop {
        tokio::select! {
            () = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }
        let mut guard = store.lock();
        if let Err(err) = restart.probe_and_maybe_restart(&mut guard).await {
            warn!(error = %err, "tunnel probe/restart failed");
        }
    }
}

#[cfg(test)]
#[path = "workers_tests.rs"]
mod tests;
