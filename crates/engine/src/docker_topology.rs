// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker Topology Intel (C10): polls container/network inventory and
//! picks a reachable ingress target for the Tunnel Manager (spec §4.9).
//!
//! Shells to the `docker` CLI via [`sv_adapters::DockerProbe`] rather than
//! linking a Docker Engine API client, matching the teacher's CLI-first
//! adapter style and keeping the dependency stack aligned with it
//! (SPEC_FULL.md §4.9 supplement).

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use sv_adapters::{ContainerInfo, DockerProbe, PortAllocator};
use sv_core::TargetType;
use tracing::warn;

/// Stale cache entries older than this are pruned (spec §4.9).
pub const STALE_AFTER_SECS: i64 = 5 * 60;

struct CacheEntry {
    container: ContainerInfo,
    last_seen: DateTime<Utc>,
}

/// The reachable-target outcome of [`Topology::select_target`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedTarget {
    Container { name: String, port: u16 },
    Localhost { port: u16 },
    Unreachable { candidates: Vec<String>, daemon_networks: Vec<String>, recommendation: String },
}

impl SelectedTarget {
    /// The `http://...` URL this target resolves to, per spec §4.8 step 4,
    /// or `None` for `Unreachable`.
    pub fn url(&self) -> Option<String> {
        match self {
            SelectedTarget::Container { name, port } => Some(format!("http://{name}:{port}")),
            SelectedTarget::Localhost { port } => Some(format!("http://localhost:{port}")),
            SelectedTarget::Unreachable { .. } => None,
        }
    }

    pub fn target_type(&self) -> TargetType {
        match self {
            SelectedTarget::Container { .. } => TargetType::Container,
            SelectedTarget::Localhost { .. } => TargetType::Localhost,
            SelectedTarget::Unreachable { .. } => TargetType::External,
        }
    }
}

/// Container/network inventory cache plus the target-selection algorithm.
pub struct Topology<D: DockerProbe> {
    probe: D,
    /// Container name (or id) of the tunnel daemon itself, used to
    /// determine its networks in step 2 of the selection algorithm.
    daemon_container_name: String,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl<D: DockerProbe> Topology<D> {
    pub fn new(probe: D, daemon_container_name: impl Into<String>) -> Self {
        Self { probe, daemon_container_name: daemon_container_name.into(), cache: Mutex::new(HashMap::new()) }
    }

    /// Poll the Docker daemon and refresh the cache (spec §4.9: every 60s).
    /// Never panics on a single iteration's error (spec §7): logs and
    /// leaves the existing cache untouched on failure.
    pub async fn poll(&self, now: DateTime<Utc>) {
        match self.probe.list_containers().await {
            Ok(containers) => {
                let mut cache = self.cache.lock();
                for container in containers {
                    cache.insert(container.id.clone(), CacheEntry { container, last_seen: now });
                }
                cache.retain(|_, entry| (now - entry.last_seen).num_seconds() <= STALE_AFTER_SECS);
            }
            Err(err) => warn!(error = %err, "docker topology poll failed"),
        }
    }

    fn candidates_for(&self, project: &str, port: u16) -> Vec<ContainerInfo> {
        let cache = self.cache.lock();
        cache
            .values()
            .map(|e| &e.container)
            .filter(|c| {
                c.name.to_lowercase().contains(&project.to_lowercase())
                    && (c.ports.iter().any(|(_, container_port)| *container_port == port) || c.ports.is_empty())
            })
            .cloned()
            .collect()
    }

    fn daemon_networks(&self) -> Vec<String> {
        self.cache
            .lock()
            .values()
            .find(|e| e.container.name == self.daemon_container_name)
            .map(|e| e.container.networks.clone())
            .unwrap_or_default()
    }

    /// Target-selection algorithm (spec §4.9):
    /// 1. find candidate containers for `project` exposing `port`,
    /// 2. determine the daemon's networks,
    /// 3. prefer a shared-network container (`http://<name>:port`),
    /// 4. else fall back to `http://localhost:port` if reachable from the
    ///    host,
    /// 5. else report `unreachable` with a diagnostic.
    pub async fn select_target(
        &self,
        ports: &impl PortAllocator,
        project: &str,
        port: u16,
        host: &str,
    ) -> SelectedTarget {
        let candidates = self.candidates_for(project, port);
        let daemon_networks = self.daemon_networks();

        if let Some(shared) = candidates.iter().find(|c| c.networks.iter().any(|n| daemon_networks.contains(n))) {
            return SelectedTarget::Container { name: shared.name.clone(), port };
        }

        match ports.verify_live(port, host).await {
            Ok(true) => SelectedTarget::Localhost { port },
            _ => SelectedTarget::Unreachable {
                candidates: candidates.iter().map(|c| c.name.clone()).collect(),
                daemon_networks,
                recommendation: format!(
                    "no container for project '{project}' shares a network with the tunnel daemon, and nothing is listening on localhost:{port}; join the service container to one of [{}] or expose the port on the host",
                    daemon_networks.join(", ")
                ),
            },
        }
    }
}

/// Default poll interval for the background worker (spec §4.9).
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

#[cfg(test)]
#[path = "docker_topology_tests.rs"]
mod tests;
