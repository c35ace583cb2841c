// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access and daemon configuration.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine state directory")]
    NoStateDir,
}

/// Resolve state directory: SV_STATE_DIR > XDG_STATE_HOME/sv > ~/.local/state/sv
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("SV_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("sv"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/sv"))
}

/// Default IPC read/write timeout.
pub fn ipc_timeout() -> Duration {
    std::env::var("SV_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Interval between health-monitor sweeps (spec §4.6: spawn/orphan probes).
pub fn health_sweep_interval() -> Duration {
    std::env::var("SV_HEALTH_SWEEP_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(60))
}

/// Docker container name the tunnel daemon runs as, used by the Topology
/// Intel poller to find its network neighborhood.
pub fn tunnel_daemon_container() -> String {
    std::env::var("SV_TUNNEL_CONTAINER").unwrap_or_else(|_| "cloudflared".to_string())
}

/// systemd unit name for the tunnel daemon when not containerized. When
/// unset, the daemon assumes the container-backed control surface.
pub fn tunnel_daemon_unit() -> Option<String> {
    std::env::var("SV_TUNNEL_UNIT").ok().filter(|s| !s.is_empty())
}

/// Cloudflare API token used by the DNS adapter (spec §6 "Environment":
/// tokens live under `meta/cloudflare/...` in the secrets vault in
/// principle, but the daemon binary itself wires adapters up before any
/// client has populated that in-memory vault, so — like the other
/// deployment-topology knobs on this page — it reads straight from the
/// environment at startup).
pub fn cloudflare_api_token() -> String {
    std::env::var("SV_CLOUDFLARE_API_TOKEN").unwrap_or_default()
}

/// Cloudflare zone id the DNS adapter issues CNAME record calls against.
pub fn cloudflare_zone_id() -> String {
    std::env::var("SV_CLOUDFLARE_ZONE_ID").unwrap_or_default()
}

/// Stable hostname the cloudflared tunnel publishes CNAMEs against.
pub fn tunnel_hostname() -> String {
    std::env::var("SV_TUNNEL_HOSTNAME").unwrap_or_else(|_| "tunnel.cfargotunnel.com".to_string())
}

/// Tunnel id used in the ingress config's top-level `tunnel:` field.
pub fn tunnel_id() -> String {
    std::env::var("SV_TUNNEL_ID").unwrap_or_default()
}

/// Path to the cloudflared credentials file referenced by the ingress config.
pub fn tunnel_credentials_file() -> String {
    std::env::var("SV_TUNNEL_CREDENTIALS_FILE")
        .unwrap_or_else(|_| "/etc/cloudflared/credentials.json".to_string())
}

/// Local port range this host allocates project service ports from.
pub fn port_range() -> (u16, u16) {
    let start = std::env::var("SV_PORT_RANGE_START").ok().and_then(|s| s.parse().ok()).unwrap_or(4000);
    let end = std::env::var("SV_PORT_RANGE_END").ok().and_then(|s| s.parse().ok()).unwrap_or(4999);
    (start, end)
}

/// Session staleness TTL (spec §4.3: default 1h, overridable per deployment).
pub fn session_ttl_secs() -> u64 {
    std::env::var("SV_SESSION_TTL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(sv_core::DEFAULT_STALE_TTL_SECS)
}

/// Checkpoint retention window in days (spec §4.4: default 30).
pub fn checkpoint_retention_days() -> u32 {
    std::env::var("SV_CHECKPOINT_RETENTION_DAYS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(sv_core::DEFAULT_RETENTION_DAYS)
}

/// Daemon-wide configuration: fixed paths under the state directory plus
/// the deployment knobs read from the environment (spec §6: "the core
/// never reads environment variables directly" applies to the dispatch
/// surface, not to the daemon binary that wires adapters up).
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/sv). Also the `Store`
    /// data directory: `sv_storage::Store::open` owns `wal.log` and
    /// `snapshot.json` directly under it.
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    pub log_path: PathBuf,
    pub ingress_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = state_dir()?;
        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            ingress_path: state_dir.join("ingress.yml"),
            state_dir,
        })
    }
}
