// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tunnel Restart Manager (§4.10): restarts the tunnel daemon on detected
//! unhealth with exponential backoff, holding a mutex so concurrent restart
//! attempts coalesce into one (spec §4.10, §5 "Shared resources").

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use sv_adapters::TunnelDaemonControl;
use sv_core::{CheckStatus, CheckType};
use sv_storage::{Store, StoreError};
use tokio::sync::Notify;
use tracing::{info, warn};

/// Backoff schedule (spec §4.10): index advances on each failed restart,
/// resets to 0 on success, and is capped at the last entry.
const BACKOFF_SCHEDULE: [Duration; 5] = [
    Duration::from_secs(5),
    Duration::from_secs(15),
    Duration::from_secs(30),
    Duration::from_secs(60),
    Duration::from_secs(300),
];

/// Number of consecutive failed probes before a restart is triggered
/// (spec §4.10: "three consecutive failed probes, 30 s apart").
pub const UNHEALTHY_PROBE_THRESHOLD: u32 = 3;
pub const PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Cancellable sleep, pulled out as a trait (same shape as
/// [`crate::handoff::HandoffEnvironment`]) so tests don't wait out the real
/// backoff schedule.
#[async_trait::async_trait]
pub trait BackoffClock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real clock: sleeps for the actual duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBackoffClock;

#[async_trait::async_trait]
impl BackoffClock for SystemBackoffClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestartState {
    pub consecutive_failures: u32,
    pub backoff_index: usize,
}

impl RestartState {
    fn backoff_delay(&self) -> Duration {
        BACKOFF_SCHEDULE[self.backoff_index.min(BACKOFF_SCHEDULE.len() - 1)]
    }
}

/// Coalesces concurrent restart attempts behind one mutex and tracks the
/// backoff index across attempts for a single tunnel daemon.
pub struct RestartManager<T: TunnelDaemonControl, C: BackoffClock = SystemBackoffClock> {
    daemon: T,
    clock: C,
    project: String,
    state: Arc<Mutex<RestartState>>,
    cancel: Arc<Notify>,
}

impl<T: TunnelDaemonControl> RestartManager<T, SystemBackoffClock> {
    pub fn new(daemon: T, project: impl Into<String>) -> Self {
        Self::with_clock(daemon, SystemBackoffClock, project)
    }
}

impl<T: TunnelDaemonControl, C: BackoffClock> RestartManager<T, C> {
    pub fn with_clock(daemon: T, clock: C, project: impl Into<String>) -> Self {
        Self { daemon, clock, project: project.into(), state: Arc::new(Mutex::new(RestartState::default())), cancel: Arc::new(Notify::new()) }
    }

    pub fn state(&self) -> RestartState {
        *self.state.lock()
    }

    /// Wake any in-progress backoff sleep immediately (spec §5: "process
    /// shutdown wakes the worker immediately").
    pub fn cancel(&self) {
        self.cancel.notify_waiters();
    }

    /// Probe `is_active` once; record the outcome against
    /// `state.consecutive_failures` and restart once the unhealthy
    /// threshold is hit. Returns `true` if a restart was attempted.
    pub async fn probe_and_maybe_restart(&self, store: &mut Store) -> Result<bool, StoreError> {
        let active = self.daemon.is_active().await.unwrap_or(false);
        let should_restart = {
            let mut state = self.state.lock();
            if active {
                state.consecutive_failures = 0;
                false
            } else {
                state.consecutive_failures += 1;
                state.consecutive_failures >= UNHEALTHY_PROBE_THRESHOLD
            }
        };
        if !should_restart {
            return Ok(false);
        }
        self.restart(store).await?;
        Ok(true)
    }

    /// Restart with exponential backoff and unlimited retries, cancellable
    /// via [`RestartManager::cancel`]. Concurrent callers coalesce on
    /// `state`'s mutex rather than a separate in-flight flag: the lock is
    /// only held to read/mutate the backoff counters, not across the
    /// `reload()` await, so a second caller simply re-derives the same
    /// decision from the (already advancing) state.
    async fn restart(&self, store: &mut Store) -> Result<(), StoreError> {
        loop {
            let delay = self.state.lock().backoff_delay();
            warn!(project = %self.project, backoff_secs = delay.as_secs(), "tunnel daemon unhealthy, restarting");

            match self.daemon.reload().await {
                Ok(()) => {
                    let mut state = self.state.lock();
                    state.consecutive_failures = 0;
                    state.backoff_index = 0;
                    drop(state);
                    store.record_health_check(
                        self.project.clone(),
                        CheckType::Tunnel,
                        CheckStatus::Ok,
                        serde_json::json!({ "action": "restarted" }),
                        Some("tunnel daemon restarted".to_string()),
                        None,
                        Utc::now(),
                    )?;
                    info!(project = %self.project, "tunnel daemon restart succeeded");
                    return Ok(());
                }
                Err(err) => {
                    let next_delay = {
                        let mut state = self.state.lock();
                        let delay = state.backoff_delay();
                        state.backoff_index = (state.backoff_index + 1).min(BACKOFF_SCHEDULE.len() - 1);
                        delay
                    };
                    store.record_health_check(
                        self.project.clone(),
                        CheckType::Tunnel,
                        CheckStatus::Critical,
                        serde_json::json!({ "action": "restart_failed", "error": err.to_string() }),
                        None,
                        None,
                        Utc::now(),
                    )?;
                    let notified = self.cancel.notified();
                    tokio::select! {
                        () = self.clock.sleep(next_delay) => {}
                        () = notified => {
                            warn!(project = %self.project, "restart backoff cancelled");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "restart_manager_tests.rs"]
mod tests;
