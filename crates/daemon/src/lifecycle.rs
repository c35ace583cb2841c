// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup (lock acquisition, store recovery, socket
//! bind) and graceful shutdown.

use crate::config::Config;
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::File;
use std::io::Write as _;
use std::sync::Arc;
use sv_storage::{Store, StoreError};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(std::path::PathBuf, std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
}

pub struct DaemonState {
    pub config: Config,
    /// Held only to keep the exclusive file lock alive; released on drop.
    #[allow(dead_code)]
    lock_file: File,
    pub store: Arc<Mutex<Store>>,
}

pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Lock-acquisition failures mean another daemon owns these
            // files; don't clean up out from under it.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Acquire the lock before truncating: a failed-to-lock error must leave
    // the running daemon's PID file untouched.
    let lock_file =
        std::fs::OpenOptions::new().write(true).create(true).truncate(false).open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    let store = Store::open(&config.state_dir)?;
    info!(
        sessions = store.state().sessions.len(),
        checkpoints = store.state().checkpoints.len(),
        "recovered store from wal/snapshot"
    );
    let store = Arc::new(Mutex::new(store));

    // Remove any stale socket and bind last, only once every prior
    // validation step has succeeded.
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!("daemon started");
    Ok(StartupResult { daemon: DaemonState { config: config.clone(), lock_file, store }, listener })
}

fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.version_path.exists() {
        let _ = std::fs::remove_file(&config.version_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

impl DaemonState {
    /// Flush and checkpoint the store, then remove the daemon's externally
    /// visible files. The lock is released automatically when `lock_file`
    /// drops.
    pub async fn shutdown(&self) -> Result<(), LifecycleError> {
        info!("shutting down daemon");
        {
            let mut store = self.store.lock();
            if let Err(e) = store.mark_shutdown() {
                warn!(error = %e, "failed to journal shutdown marker");
            }
            if let Err(e) = store.checkpoint(chrono::Utc::now()) {
                warn!(error = %e, "failed to save final checkpoint");
            }
        }

        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!(error = %e, "failed to remove socket file");
            }
        }
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!(error = %e, "failed to remove pid file");
            }
        }
        if self.config.version_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.version_path) {
                warn!(error = %e, "failed to remove version file");
            }
        }

        info!("daemon shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
