// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn config_in(dir: &std::path::Path) -> Config {
    Config {
        socket_path: dir.join("daemon.sock"),
        lock_path: dir.join("daemon.pid"),
        version_path: dir.join("daemon.version"),
        log_path: dir.join("daemon.log"),
        ingress_path: dir.join("ingress.yml"),
        state_dir: dir.to_path_buf(),
    }
}

#[tokio::test]
async fn startup_writes_pid_and_version_then_binds_socket_last() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let result = startup(&config).await.unwrap();

    assert!(config.lock_path.exists());
    assert!(config.version_path.exists());
    assert!(config.socket_path.exists());
    let pid: u32 = std::fs::read_to_string(&config.lock_path).unwrap().trim().parse().unwrap();
    assert_eq!(pid, std::process::id());

    drop(result.listener);
    result.daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_removes_socket_lock_and_version_files() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let result = startup(&config).await.unwrap();
    drop(result.listener);

    result.daemon.shutdown().await.unwrap();
    assert!(!config.socket_path.exists());
    assert!(!config.lock_path.exists());
    assert!(!config.version_path.exists());
}

#[tokio::test]
async fn a_second_startup_against_the_same_state_dir_fails_to_acquire_the_lock() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let first = startup(&config).await.unwrap();

    let second = startup(&config).await;
    assert!(matches!(second.unwrap_err(), LifecycleError::LockFailed(_)));

    // The first daemon's pid file must survive the second's failed attempt.
    assert!(config.lock_path.exists());

    drop(first.listener);
    first.daemon.shutdown().await.unwrap();
}
