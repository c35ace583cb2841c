// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tunnel daemon control surface: reload after an ingress config write
//! (spec §4.8 step 7) and health probing for the Restart Manager (§4.10).
//! Deployment topology decides whether "reload" means a systemd restart or
//! a container restart; both are reached through this one trait.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TunnelDaemonError {
    #[error("reload failed: {0}")]
    ReloadFailed(String),
    #[error("daemon not active after reload")]
    NotActive,
}

#[async_trait]
pub trait TunnelDaemonControl: Clone + Send + Sync + 'static {
    /// Restart/reload the daemon process and wait for it to settle.
    async fn reload(&self) -> Result<(), TunnelDaemonError>;

    /// True if the daemon reports an "active" status.
    async fn is_active(&self) -> Result<bool, TunnelDaemonError>;
}

/// systemd-backed control, used when the daemon runs as a unit rather than
/// inside a container (spec §4.8 step 7: "systemd restart or container
/// restart, depending on deployment topology").
#[derive(Clone, Debug)]
pub struct SystemdTunnelControl {
    unit_name: String,
}

impl SystemdTunnelControl {
    pub fn new(unit_name: impl Into<String>) -> Self {
        Self { unit_name: unit_name.into() }
    }
}

#[async_trait]
impl TunnelDaemonControl for SystemdTunnelControl {
    async fn reload(&self) -> Result<(), TunnelDaemonError> {
        let output = tokio::process::Command::new("systemctl")
            .args(["restart", &self.unit_name])
            .output()
            .await
            .map_err(|e| TunnelDaemonError::ReloadFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(TunnelDaemonError::ReloadFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        if !self.is_active().await? {
            return Err(TunnelDaemonError::NotActive);
        }
        Ok(())
    }

    async fn is_active(&self) -> Result<bool, TunnelDaemonError> {
        let output = tokio::process::Command::new("systemctl")
            .args(["is-active", &self.unit_name])
            .output()
            .await
            .map_err(|e| TunnelDaemonError::ReloadFailed(e.to_string()))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.trim() == "active")
    }
}

/// Container-backed control, used when the tunnel daemon and the target
/// service share a Docker network (spec §4.9).
#[derive(Clone, Debug)]
pub struct ContainerTunnelControl {
    container_name: String,
}

impl ContainerTunnelControl {
    pub fn new(container_name: impl Into<String>) -> Self {
        Self { container_name: container_name.into() }
    }
}

#[async_trait]
impl TunnelDaemonControl for ContainerTunnelControl {
    async fn reload(&self) -> Result<(), TunnelDaemonError> {
        let output = tokio::process::Command::new("docker")
            .args(["restart", &self.container_name])
            .output()
            .await
            .map_err(|e| TunnelDaemonError::ReloadFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(TunnelDaemonError::ReloadFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        if !self.is_active().await? {
            return Err(TunnelDaemonError::NotActive);
        }
        Ok(())
    }

    async fn is_active(&self) -> Result<bool, TunnelDaemonError> {
        let output = tokio::process::Command::new("docker")
            .args(["inspect", "--format", "{{.State.Running}}", &self.container_name])
            .output()
            .await
            .map_err(|e| TunnelDaemonError::ReloadFailed(e.to_string()))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.trim() == "true")
    }
}

/// Picks between [`SystemdTunnelControl`] and [`ContainerTunnelControl`] at
/// daemon startup so `sv-daemon` can hold one concrete, non-trait-object
/// `T: TunnelDaemonControl` regardless of which deployment topology
/// `sv-daemon::config` resolved (spec §4.8 step 7's "depending on
/// deployment topology" is a one-time startup decision, not a per-call
/// branch).
#[derive(Clone, Debug)]
pub enum DeploymentTunnelControl {
    Systemd(SystemdTunnelControl),
    Container(ContainerTunnelControl),
}

#[async_trait]
impl TunnelDaemonControl for DeploymentTunnelControl {
    async fn reload(&self) -> Result<(), TunnelDaemonError> {
        match self {
            Self::Systemd(c) => c.reload().await,
            Self::Container(c) => c.reload().await,
        }
    }

    async fn is_active(&self) -> Result<bool, TunnelDaemonError> {
        match self {
            Self::Systemd(c) => c.is_active().await,
            Self::Container(c) => c.is_active().await,
        }
    }
}

#[cfg(test)]
#[path = "tunnel_daemon_tests.rs"]
mod tests;
