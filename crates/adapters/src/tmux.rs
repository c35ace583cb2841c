// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tmux channel adapter: the Handoff Orchestrator's (C7) only way to talk
//! to a PS is by sending keystrokes into its tmux pane and reading it back.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TmuxError {
    #[error("tmux session not found: {0}")]
    SessionNotFound(String),
    #[error("failed to run tmux: {0}")]
    Exec(String),
}

/// One logical channel to a PS's tmux-attached session (spec §5: "one
/// logical channel per PS"; sends are serialized by the caller, never here).
#[async_trait]
pub trait TmuxChannel: Clone + Send + Sync + 'static {
    /// Send literal text followed by Enter.
    async fn send_keys(&self, session: &str, text: &str) -> Result<(), TmuxError>;

    /// Send a raw key name (e.g. "C-c" for interrupt) with no trailing Enter.
    async fn send_raw_key(&self, session: &str, key: &str) -> Result<(), TmuxError>;

    /// Capture the last `lines` lines of the pane.
    async fn capture_pane(&self, session: &str, lines: u32) -> Result<String, TmuxError>;

    /// Kill the session outright (used on registry cleanup).
    async fn kill_session(&self, session: &str) -> Result<(), TmuxError>;
}

/// Real tmux channel, shelling out to the `tmux` binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTmuxChannel;

impl SystemTmuxChannel {
    pub fn new() -> Self {
        Self
    }

    async fn run(args: &[&str]) -> Result<std::process::Output, TmuxError> {
        tokio::process::Command::new("tmux")
            .args(args)
            .output()
            .await
            .map_err(|e| TmuxError::Exec(e.to_string()))
    }
}

#[async_trait]
impl TmuxChannel for SystemTmuxChannel {
    async fn send_keys(&self, session: &str, text: &str) -> Result<(), TmuxError> {
        let output = Self::run(&["send-keys", "-t", session, text, "Enter"]).await?;
        if !output.status.success() {
            return Err(TmuxError::SessionNotFound(session.to_string()));
        }
        Ok(())
    }

    async fn send_raw_key(&self, session: &str, key: &str) -> Result<(), TmuxError> {
        let output = Self::run(&["send-keys", "-t", session, key]).await?;
        if !output.status.success() {
            return Err(TmuxError::SessionNotFound(session.to_string()));
        }
        Ok(())
    }

    async fn capture_pane(&self, session: &str, lines: u32) -> Result<String, TmuxError> {
        let span = format!("-{lines}");
        let output = Self::run(&["capture-pane", "-t", session, "-p", "-S", &span]).await?;
        if !output.status.success() {
            return Err(TmuxError::SessionNotFound(session.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn kill_session(&self, session: &str) -> Result<(), TmuxError> {
        let _ = Self::run(&["kill-session", "-t", session]).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
