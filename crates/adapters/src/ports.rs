// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port allocator contract (spec §6: "consumed, not owned by the core").
//! The core only ever calls through this trait; range partitioning,
//! persistence, and cross-project uniqueness live entirely on the other
//! side of it.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("no port range configured for project {0}")]
    NoRangeForProject(String),
    #[error("port {0} is outside the assigned range for project {1}")]
    OutOfRange(u16, String),
    #[error("failed to probe port liveness: {0}")]
    ProbeFailed(String),
}

#[async_trait]
pub trait PortAllocator: Clone + Send + Sync + 'static {
    async fn get_or_allocate(&self, project: &str, service: &str) -> Result<u16, PortError>;
    async fn list(&self, project: Option<&str>) -> Result<Vec<u16>, PortError>;
    async fn release(&self, project: &str, service: &str) -> Result<(), PortError>;

    /// Probe whether some process is already bound to `port` on `host`
    /// (spec §4.8 step 1: `EADDRINUSE` on an attempted bind is "good" —
    /// it means a live service already occupies the port).
    async fn verify_live(&self, port: u16, host: &str) -> Result<bool, PortError>;
}

/// Minimal local port allocator: range-partitioned per project, persisted
/// only in memory. Production deployments consume a real port directory
/// service through the same trait; this is the reference implementation
/// the daemon binary wires up for single-host use (spec §1: "single-host
/// deployment assumed").
#[derive(Clone)]
pub struct SystemPortAllocator {
    inner: std::sync::Arc<parking_lot::Mutex<SystemPortAllocatorState>>,
}

struct SystemPortAllocatorState {
    range_start: u16,
    range_end: u16,
    next: u16,
    assignments: std::collections::HashMap<(String, String), u16>,
}

impl SystemPortAllocator {
    pub fn new(range_start: u16, range_end: u16) -> Self {
        Self {
            inner: std::sync::Arc::new(parking_lot::Mutex::new(SystemPortAllocatorState {
                range_start,
                range_end,
                next: range_start,
                assignments: std::collections::HashMap::new(),
            })),
        }
    }
}

#[async_trait]
impl PortAllocator for SystemPortAllocator {
    async fn get_or_allocate(&self, project: &str, service: &str) -> Result<u16, PortError> {
        let mut state = self.inner.lock();
        let key = (project.to_string(), service.to_string());
        if let Some(port) = state.assignments.get(&key) {
            return Ok(*port);
        }
        if state.next > state.range_end {
            return Err(PortError::NoRangeForProject(project.to_string()));
        }
        let port = state.next;
        state.next += 1;
        state.assignments.insert(key, port);
        Ok(port)
    }

    async fn list(&self, project: Option<&str>) -> Result<Vec<u16>, PortError> {
        let state = self.inner.lock();
        Ok(state
            .assignments
            .iter()
            .filter(|((p, _), _)| match project {
                Some(want) => want == p,
                None => true,
            })
            .map(|(_, port)| *port)
            .collect())
    }

    async fn release(&self, project: &str, service: &str) -> Result<(), PortError> {
        let mut state = self.inner.lock();
        state.assignments.remove(&(project.to_string(), service.to_string()));
        Ok(())
    }

    async fn verify_live(&self, port: u16, host: &str) -> Result<bool, PortError> {
        match tokio::net::TcpListener::bind((host, port)).await {
            // We could bind: nothing was listening.
            Ok(_) => Ok(false),
            // EADDRINUSE: a live service already occupies the port.
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => Ok(true),
            Err(e) => Err(PortError::ProbeFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "ports_tests.rs"]
mod tests;
