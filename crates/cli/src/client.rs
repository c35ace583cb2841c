// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix-socket client for the `svd` daemon's tool dispatch surface: frames
//! a [`sv_wire::Request`], reads back a [`sv_wire::Response`], and knows how
//! to start the daemon in the background when it isn't running yet.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use sv_wire::{Request, Response};
use tokio::net::UnixStream;

/// Resolve the daemon's state directory the same way `sv-daemon::config`
/// does: `SV_STATE_DIR` > `XDG_STATE_HOME/sv` > `~/.local/state/sv`. The
/// two crates don't share a dependency edge (the CLI never links the
/// daemon's engine/storage stack), so this mirrors that resolution rather
/// than importing it.
pub fn state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SV_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("sv"));
    }
    let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
    Ok(home.join(".local/state/sv"))
}

pub fn socket_path() -> Result<PathBuf> {
    Ok(state_dir()?.join("daemon.sock"))
}

pub fn lock_path() -> Result<PathBuf> {
    Ok(state_dir()?.join("daemon.pid"))
}

pub fn log_path() -> Result<PathBuf> {
    Ok(state_dir()?.join("daemon.log"))
}

pub struct DaemonClient {
    stream: UnixStream,
}

impl DaemonClient {
    /// Connect to an already-running daemon. Returns an error (not a
    /// panic) if the socket is absent or refuses the connection — callers
    /// use this to distinguish "not running" from a real I/O failure.
    pub async fn connect() -> Result<Self> {
        let path = socket_path()?;
        let stream = UnixStream::connect(&path)
            .await
            .with_context(|| format!("daemon not running (socket: {})", path.display()))?;
        Ok(Self { stream })
    }

    /// Connect, starting the daemon in the background first if it isn't
    /// already listening.
    pub async fn connect_or_start() -> Result<Self> {
        if let Ok(client) = Self::connect().await {
            return Ok(client);
        }
        start_daemon_background()?;
        wait_for_daemon(Duration::from_secs(10)).await
    }

    pub async fn call(&mut self, request: Request) -> Result<Response> {
        let bytes = sv_wire::encode(&request)?;
        sv_wire::write_message(&mut self.stream, &bytes).await.context("failed to write request")?;
        let reply = sv_wire::read_message(&mut self.stream).await.context("failed to read response")?;
        Ok(sv_wire::decode(&reply)?)
    }

    pub async fn ping(&mut self) -> Result<bool> {
        Ok(matches!(self.call(Request::Ping).await?, Response::Pong))
    }
}

async fn wait_for_daemon(timeout: Duration) -> Result<DaemonClient> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Ok(client) = DaemonClient::connect().await {
            return Ok(client);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(anyhow!("timed out waiting for daemon to start"));
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Locate the `svd` binary: next to the running `sv` binary first (the
/// normal installed-together layout), then fall back to `$PATH`.
fn find_svd_binary() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("could not determine current executable")?;
    if let Some(dir) = exe.parent() {
        let candidate = dir.join("svd");
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    which_svd().ok_or_else(|| anyhow!("could not find svd binary next to sv or on PATH"))
}

fn which_svd() -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).map(|dir| dir.join("svd")).find(|p| p.exists())
}

/// Spawn `svd` detached from this process's stdio, logging to
/// `daemon.log`. Does not wait for it to finish starting — callers poll
/// via [`wait_for_daemon`].
fn start_daemon_background() -> Result<()> {
    let svd_path = find_svd_binary()?;
    let log_path = log_path()?;
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let log_file = std::fs::OpenOptions::new().create(true).append(true).open(&log_path)?;
    let log_file_err = log_file.try_clone()?;

    std::process::Command::new(svd_path)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log_file))
        .stderr(Stdio::from(log_file_err))
        .spawn()
        .context("failed to spawn svd")?;
    Ok(())
}

/// Stop a running daemon by sending SIGTERM to the PID recorded in
/// `daemon.pid`, returning `true` if a process was signalled.
pub fn stop_daemon() -> Result<bool> {
    let path = lock_path()?;
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return Ok(false);
    };
    let Ok(pid) = contents.trim().parse::<i32>() else {
        return Ok(false);
    };
    match nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), nix::sys::signal::Signal::SIGTERM) {
        Ok(()) => Ok(true),
        Err(nix::errno::Errno::ESRCH) => Ok(false),
        Err(e) => Err(anyhow!("failed to signal daemon (pid {pid}): {e}")),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
