// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PID-liveness probe backing the Spawn Lifecycle Tracker's abandoned-spawn
//! detection (C5, spec §4.5): a spawn past the stall threshold whose
//! recorded PID is no longer alive is abandoned rather than merely stalled.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("invalid pid: {0}")]
    InvalidPid(i32),
}

#[async_trait]
pub trait ProcessProbe: Clone + Send + Sync + 'static {
    /// Whether `pid` identifies a live process, using the `kill(pid, 0)`
    /// liveness convention (no signal delivered, only existence checked).
    async fn is_alive(&self, pid: i32) -> Result<bool, ProcessError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemProcessProbe;

impl SystemProcessProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessProbe for SystemProcessProbe {
    async fn is_alive(&self, pid: i32) -> Result<bool, ProcessError> {
        let pid = nix::unistd::Pid::from_raw(pid);
        match nix::sys::signal::kill(pid, None) {
            Ok(()) => Ok(true),
            Err(nix::errno::Errno::ESRCH) => Ok(false),
            // EPERM means the process exists but we can't signal it.
            Err(nix::errno::Errno::EPERM) => Ok(true),
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
