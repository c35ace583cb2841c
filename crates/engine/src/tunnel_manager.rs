// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tunnel Manager (C9): the CNAME create/delete pipeline (spec §4.8).
//!
//! `request_cname` is a small transactional saga (Design Notes: "each
//! external side-effect has an inverse, and the commit happens last"):
//! validate, pick a target, create the DNS record, patch the ingress file,
//! reload the daemon, and only then persist the `cnames` row. Any failure
//! from the ingress write onward unwinds the steps already applied, in
//! reverse, before the error is returned.
//!
//! Ingress file writes are single-writer (the caller holds `write_lock`
//! for the duration of the patch-reload sequence) and atomic: serialize to
//! a sibling `.tmp` file, back up the previous version, then rename into
//! place — the same idiom `sv_storage::snapshot` uses for the WAL
//! snapshot file.

use chrono::Utc;
use std::path::{Path, PathBuf};
use sv_adapters::{DnsClient, DockerProbe, PortAllocator, TunnelDaemonControl};
use sv_core::{CnameId, CnameRecord, CoreError, IngressConfig};
use sv_storage::{Store, StoreError};
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tracing::info;

use crate::docker_topology::{SelectedTarget, Topology};

#[derive(Debug, Error)]
pub enum TunnelManagerError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TunnelManagerError {
    pub fn kind(&self) -> sv_core::ErrorKind {
        match self {
            TunnelManagerError::Core(e) => e.kind,
            TunnelManagerError::Store(StoreError::Core(e)) => e.kind,
            TunnelManagerError::Store(_) => sv_core::ErrorKind::Internal,
        }
    }
}

/// Everything the CNAME pipeline needs beyond `Store`: the port/DNS/daemon
/// adapters and where the ingress config file lives on disk.
pub struct TunnelManager<P: PortAllocator, D: DnsClient, T: TunnelDaemonControl> {
    ports: P,
    dns: D,
    daemon: T,
    ingress_path: PathBuf,
    /// The tunnel's own stable hostname (e.g. `<id>.cfargotunnel.com`),
    /// which every CNAME row points at (spec §4.8 step 5) — distinct from
    /// the per-hostname ingress *service* target picked in step 4.
    tunnel_stable_hostname: String,
    tunnel_id: String,
    credentials_file: String,
    write_lock: AsyncMutex<()>,
}

impl<P: PortAllocator, D: DnsClient, T: TunnelDaemonControl> TunnelManager<P, D, T> {
    pub fn new(
        ports: P,
        dns: D,
        daemon: T,
        ingress_path: impl Into<PathBuf>,
        tunnel_stable_hostname: impl Into<String>,
        tunnel_id: impl Into<String>,
        credentials_file: impl Into<String>,
    ) -> Self {
        Self {
            ports,
            dns,
            daemon,
            ingress_path: ingress_path.into(),
            tunnel_stable_hostname: tunnel_stable_hostname.into(),
            tunnel_id: tunnel_id.into(),
            credentials_file: credentials_file.into(),
            write_lock: AsyncMutex::new(()),
        }
    }

    fn load_ingress(&self) -> Result<IngressConfig, TunnelManagerError> {
        if !self.ingress_path.exists() {
            return Ok(IngressConfig::empty(self.tunnel_id.clone(), self.credentials_file.clone()));
        }
        let raw = std::fs::read_to_string(&self.ingress_path)
            .map_err(|e| CoreError::external(format!("reading ingress config: {e}")))?;
        serde_yaml::from_str(&raw).map_err(|e| CoreError::external(format!("parsing ingress config: {e}")).into())
    }

    /// Write `config` atomically (tmp + rename), backing up the previous
    /// file first (spec §4.8: "Ingress file writes are atomic
    /// (write-then-rename) with a backup of the previous version").
    fn save_ingress(&self, config: &IngressConfig) -> Result<(), TunnelManagerError> {
        let yaml = serde_yaml::to_string(config)
            .map_err(|e| CoreError::external(format!("serializing ingress config: {e}")))?;
        if self.ingress_path.exists() {
            let bak = self.ingress_path.with_extension("yml.bak");
            let _ = std::fs::copy(&self.ingress_path, bak);
        }
        let tmp = self.ingress_path.with_extension("yml.tmp");
        if let Some(parent) = self.ingress_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::external(format!("creating ingress dir: {e}")))?;
        }
        std::fs::write(&tmp, yaml).map_err(|e| CoreError::external(format!("writing ingress config: {e}")))?;
        std::fs::rename(&tmp, &self.ingress_path).map_err(|e| CoreError::external(format!("renaming ingress config: {e}")))?;
        Ok(())
    }

    /// Run the eight-step create pipeline (spec §4.8). On success the new
    /// `CnameRecord` has already been persisted to `store`.
    pub async fn request_cname(
        &self,
        store: &mut Store,
        topology: &Topology<impl DockerProbe>,
        project: &str,
        subdomain: &str,
        domain: &str,
        target_port: u16,
        host: &str,
    ) -> Result<CnameRecord, TunnelManagerError> {
        let hostname = format!("{subdomain}.{domain}");

        // Step 1: port assignment + live-service validation.
        let assigned = self.ports.list(Some(project)).await.map_err(|e| CoreError::external(e.to_string()))?;
        if !assigned.contains(&target_port) {
            return Err(CoreError::validation(format!("port {target_port} is not an active assignment for project {project}"))
                .with_recommendation("allocate a port first")
                .into());
        }
        let live = self.ports.verify_live(target_port, host).await.map_err(|e| CoreError::external(e.to_string()))?;
        if !live {
            return Err(CoreError::validation(format!("no live service bound to port {target_port}"))
                .with_recommendation("start the service before requesting a tunnel")
                .into());
        }

        // Step 2: subdomain availability.
        if store.state().cnames.get_by_hostname(&hostname).is_some() {
            return Err(CoreError::conflict(format!("hostname {hostname} already has a tunnel route"))
                .with_recommendation("choose a different subdomain")
                .into());
        }

        // Step 3: known zone.
        if !self.dns.is_known_zone(domain).await.map_err(|e| CoreError::external(e.to_string()))? {
            return Err(CoreError::validation(format!("{domain} is not a known DNS zone")).into());
        }

        // Step 4: target selection.
        let target = topology.select_target(&self.ports, project, target_port, host).await;
        let service_url = match &target {
            SelectedTarget::Container { name, port } => format!("http://{name}:{port}"),
            SelectedTarget::Localhost { port } => format!("http://localhost:{port}"),
            SelectedTarget::Unreachable { recommendation, .. } => {
                return Err(CoreError::unreachable(format!("no reachable target for {project}:{target_port}"))
                    .with_recommendation(recommendation.clone())
                    .into());
            }
        };

        // Step 5: create the DNS CNAME.
        let dns_record = self
            .dns
            .create_cname(&hostname, &self.tunnel_stable_hostname)
            .await
            .map_err(|e| CoreError::external(format!("DNS create failed: {e}")))?;

        // Steps 6-7: patch ingress, reload, verify — single-writer.
        let _guard = self.write_lock.lock().await;
        let mut config = match self.load_ingress() {
            Ok(c) => c,
            Err(err) => {
                let _ = self.dns.delete_cname(&dns_record.record_id).await;
                return Err(err);
            }
        };
        config.upsert_rule(&hostname, &service_url);
        if let Err(err) = self.save_ingress(&config) {
            let _ = self.dns.delete_cname(&dns_record.record_id).await;
            return Err(err);
        }

        if let Err(reload_err) = self.daemon.reload().await {
            // Step 8: roll back 6 (ingress rule) and 5 (DNS record).
            config.remove_rule(&hostname);
            let _ = self.save_ingress(&config);
            let _ = self.dns.delete_cname(&dns_record.record_id).await;
            return Err(CoreError::external(format!("tunnel reload failed: {reload_err}")).into());
        }

        // Step 9: persist and audit.
        let record = CnameRecord {
            id: CnameId::new(),
            subdomain: subdomain.to_string(),
            domain: domain.to_string(),
            target_service: service_url,
            target_type: target.target_type(),
            project: project.to_string(),
            dns_record_id: dns_record.record_id,
        };
        store.create_cname(record.clone())?;
        store.record_health_check(
            project,
            sv_core::CheckType::Tunnel,
            sv_core::CheckStatus::Ok,
            serde_json::json!({ "action": "cname_created", "hostname": hostname }),
            Some("cname created".to_string()),
            None,
            Utc::now(),
        )?;
        info!(project, hostname = %record.hostname(), "tunnel cname created");
        Ok(record)
    }

    /// Reverse steps 5-9 (spec §4.8 deletion). `is_meta` callers may delete
    /// any CNAME; non-meta callers only their own project's.
    pub async fn delete_cname(
        &self,
        store: &mut Store,
        hostname: &str,
        requester: &str,
        is_meta: bool,
    ) -> Result<(), TunnelManagerError> {
        let record = store
            .state()
            .cnames
            .get_by_hostname(hostname)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("no cname for {hostname}")))?;
        if !is_meta && record.project != requester {
            return Err(CoreError::permission_denied(format!(
                "project {requester} does not own cname {hostname}"
            ))
            .into());
        }

        let _guard = self.write_lock.lock().await;
        let mut config = self.load_ingress()?;
        config.remove_rule(hostname);
        self.save_ingress(&config)?;
        self.daemon.reload().await.map_err(|e| CoreError::external(format!("tunnel reload failed: {e}")))?;

        self.dns
            .delete_cname(&record.dns_record_id)
            .await
            .map_err(|e| CoreError::external(format!("DNS delete failed: {e}")))?;

        store.delete_cname(&record.id)?;
        store.record_health_check(
            record.project.clone(),
            sv_core::CheckType::Tunnel,
            sv_core::CheckStatus::Ok,
            serde_json::json!({ "action": "cname_deleted", "hostname": hostname }),
            Some("cname deleted".to_string()),
            None,
            Utc::now(),
        )?;
        info!(hostname, "tunnel cname deleted");
        Ok(())
    }

    pub fn ingress_path(&self) -> &Path {
        &self.ingress_path
    }
}

#[cfg(test)]
#[path = "tunnel_manager_tests.rs"]
mod tests;
