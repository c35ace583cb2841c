// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake adapters for engine/daemon tests, following the teacher's
//! `NotifyAdapter`/`FakeNotifyAdapter` three-backends-behind-one-trait
//! convention: one real (shell/HTTP) implementation, one fake that records
//! calls and lets tests seed responses and inject failures.

#![cfg_attr(coverage_nightly, coverage(off))]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use sv_core::GitStatus;

use crate::dns::{DnsClient, DnsError, DnsRecord};
use crate::docker::{ContainerInfo, DockerError, DockerProbe};
use crate::git::{GitError, GitProbe};
use crate::ports::{PortAllocator, PortError};
use crate::process::{ProcessError, ProcessProbe};
use crate::tmux::{TmuxChannel, TmuxError};
use crate::tunnel_daemon::{TunnelDaemonControl, TunnelDaemonError};

/// Records every `send_keys`/`send_raw_key` call per session, in order.
#[derive(Clone, Default)]
pub struct FakeTmuxChannel {
    inner: Arc<Mutex<FakeTmuxState>>,
}

#[derive(Default)]
struct FakeTmuxState {
    sent: HashMap<String, Vec<String>>,
    panes: HashMap<String, String>,
    killed: Vec<String>,
    fail_sessions: std::collections::HashSet<String>,
}

impl FakeTmuxChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self, session: &str) -> Vec<String> {
        self.inner.lock().sent.get(session).cloned().unwrap_or_default()
    }

    pub fn set_pane(&self, session: &str, content: &str) {
        self.inner.lock().panes.insert(session.to_string(), content.to_string());
    }

    pub fn killed(&self) -> Vec<String> {
        self.inner.lock().killed.clone()
    }

    pub fn fail_session(&self, session: &str) {
        self.inner.lock().fail_sessions.insert(session.to_string());
    }
}

#[async_trait]
impl TmuxChannel for FakeTmuxChannel {
    async fn send_keys(&self, session: &str, text: &str) -> Result<(), TmuxError> {
        let mut state = self.inner.lock();
        if state.fail_sessions.contains(session) {
            return Err(TmuxError::SessionNotFound(session.to_string()));
        }
        state.sent.entry(session.to_string()).or_default().push(text.to_string());
        Ok(())
    }

    async fn send_raw_key(&self, session: &str, key: &str) -> Result<(), TmuxError> {
        let mut state = self.inner.lock();
        if state.fail_sessions.contains(session) {
            return Err(TmuxError::SessionNotFound(session.to_string()));
        }
        state.sent.entry(session.to_string()).or_default().push(key.to_string());
        Ok(())
    }

    async fn capture_pane(&self, session: &str, _lines: u32) -> Result<String, TmuxError> {
        let state = self.inner.lock();
        state.panes.get(session).cloned().ok_or_else(|| TmuxError::SessionNotFound(session.to_string()))
    }

    async fn kill_session(&self, session: &str) -> Result<(), TmuxError> {
        self.inner.lock().killed.push(session.to_string());
        Ok(())
    }
}

/// Seeded container inventory for the Docker Topology Intel poller.
#[derive(Clone, Default)]
pub struct FakeDockerProbe {
    inner: Arc<Mutex<Vec<ContainerInfo>>>,
}

impl FakeDockerProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, container: ContainerInfo) {
        self.inner.lock().push(container);
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

#[async_trait]
impl DockerProbe for FakeDockerProbe {
    async fn list_containers(&self) -> Result<Vec<ContainerInfo>, DockerError> {
        Ok(self.inner.lock().clone())
    }

    async fn container_networks(&self, name: &str) -> Result<Vec<String>, DockerError> {
        self.inner
            .lock()
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.networks.clone())
            .ok_or_else(|| DockerError::Parse(format!("no such container: {name}")))
    }
}

/// Seeded git status per working directory.
#[derive(Clone, Default)]
pub struct FakeGitProbe {
    inner: Arc<Mutex<HashMap<String, GitStatus>>>,
}

impl FakeGitProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, working_directory: &str, status: GitStatus) {
        self.inner.lock().insert(working_directory.to_string(), status);
    }
}

#[async_trait]
impl GitProbe for FakeGitProbe {
    async fn status(&self, working_directory: &str) -> Result<GitStatus, GitError> {
        self.inner.lock().get(working_directory).cloned().ok_or(GitError::NotARepo)
    }
}

/// In-memory DNS provider used by Tunnel Manager tests (spec §8 scenario 3:
/// "CNAME create-then-reload-fails" needs a DNS side that can be inspected
/// after a rollback).
#[derive(Clone, Default)]
pub struct FakeDnsClient {
    inner: Arc<Mutex<FakeDnsState>>,
}

#[derive(Default)]
struct FakeDnsState {
    zones: std::collections::HashSet<String>,
    records: HashMap<String, DnsRecord>,
    next_id: u64,
}

impl FakeDnsClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_zone(&self, domain: &str) {
        self.inner.lock().zones.insert(domain.to_string());
    }

    pub fn record_count(&self) -> usize {
        self.inner.lock().records.len()
    }
}

#[async_trait]
impl DnsClient for FakeDnsClient {
    async fn is_known_zone(&self, domain: &str) -> Result<bool, DnsError> {
        Ok(self.inner.lock().zones.contains(domain))
    }

    async fn hostname_taken(&self, hostname: &str) -> Result<bool, DnsError> {
        Ok(self.inner.lock().records.values().any(|r| r.hostname == hostname))
    }

    async fn create_cname(&self, hostname: &str, target: &str) -> Result<DnsRecord, DnsError> {
        let mut state = self.inner.lock();
        state.next_id += 1;
        let record = DnsRecord {
            record_id: format!("dns-{}", state.next_id),
            hostname: hostname.to_string(),
            target: target.to_string(),
            proxied: true,
        };
        state.records.insert(record.record_id.clone(), record.clone());
        Ok(record)
    }

    async fn delete_cname(&self, record_id: &str) -> Result<(), DnsError> {
        let mut state = self.inner.lock();
        state
            .records
            .remove(record_id)
            .map(|_| ())
            .ok_or_else(|| DnsError::RecordNotFound(record_id.to_string()))
    }
}

/// Configurable tunnel-daemon control: `is_active` is true by default;
/// `set_fail_next_reload` makes the *next* `reload()` call fail its
/// post-reload activity check (spec §4.8 step 8 rollback trigger).
#[derive(Clone, Default)]
pub struct FakeTunnelDaemonControl {
    inner: Arc<Mutex<FakeTunnelDaemonState>>,
}

#[derive(Default)]
struct FakeTunnelDaemonState {
    fail_next_reload: bool,
    reload_count: u32,
}

impl FakeTunnelDaemonControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_next_reload(&self, fail: bool) {
        self.inner.lock().fail_next_reload = fail;
    }

    pub fn reload_count(&self) -> u32 {
        self.inner.lock().reload_count
    }
}

#[async_trait]
impl TunnelDaemonControl for FakeTunnelDaemonControl {
    async fn reload(&self) -> Result<(), TunnelDaemonError> {
        let mut state = self.inner.lock();
        state.reload_count += 1;
        if state.fail_next_reload {
            state.fail_next_reload = false;
            return Err(TunnelDaemonError::NotActive);
        }
        Ok(())
    }

    async fn is_active(&self) -> Result<bool, TunnelDaemonError> {
        Ok(!self.inner.lock().fail_next_reload)
    }
}

/// Seeded PID liveness for Spawn Lifecycle Tracker abandonment tests.
/// Unseeded pids are reported dead.
#[derive(Clone, Default)]
pub struct FakeProcessProbe {
    inner: Arc<Mutex<std::collections::HashSet<i32>>>,
}

impl FakeProcessProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_alive(&self, pid: i32, alive: bool) {
        let mut state = self.inner.lock();
        if alive {
            state.insert(pid);
        } else {
            state.remove(&pid);
        }
    }
}

#[async_trait]
impl ProcessProbe for FakeProcessProbe {
    async fn is_alive(&self, pid: i32) -> Result<bool, ProcessError> {
        Ok(self.inner.lock().contains(&pid))
    }
}

/// Seeded port assignments/liveness for Tunnel Manager tests (spec §4.8
/// step 1), avoiding a real TCP bind per test.
#[derive(Clone, Default)]
pub struct FakePortAllocator {
    inner: Arc<Mutex<FakePortState>>,
}

#[derive(Default)]
struct FakePortState {
    assignments: HashMap<(String, String), u16>,
    live: std::collections::HashSet<u16>,
}

impl FakePortAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&self, project: &str, service: &str, port: u16) {
        self.inner.lock().assignments.insert((project.to_string(), service.to_string()), port);
    }

    pub fn set_live(&self, port: u16, live: bool) {
        let mut state = self.inner.lock();
        if live {
            state.live.insert(port);
        } else {
            state.live.remove(&port);
        }
    }
}

#[async_trait]
impl PortAllocator for FakePortAllocator {
    async fn get_or_allocate(&self, project: &str, service: &str) -> Result<u16, PortError> {
        let key = (project.to_string(), service.to_string());
        if let Some(port) = self.inner.lock().assignments.get(&key) {
            return Ok(*port);
        }
        Err(PortError::NoRangeForProject(project.to_string()))
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
        self.inner.lock().assignments.remove(&(project.to_string(), service.to_string()));
        Ok(())
    }

    async fn verify_live(&self, port: u16, _host: &str) -> Result<bool, PortError> {
        Ok(self.inner.lock().live.contains(&port))
    }
}
