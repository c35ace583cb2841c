// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool Dispatcher (C11): routes every `sv_wire::Request` variant to the
//! owning `sv_storage::Store`/`sv_engine` call and shapes the matching
//! `sv_wire::Response` (spec §6). One dispatcher instance is shared across
//! every connection; it never owns a scheduling loop of its own — see
//! `crate::workers` for the named background tasks spec §5 requires.

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use sv_adapters::{DnsClient, DockerProbe, GitProbe, PortAllocator, SecretsVault, TmuxChannel, TunnelDaemonControl};
use sv_core::{CoreError, InstanceId, Session};
use sv_engine::handoff::{HandoffEnvironment, HandoffOrchestrator};
use sv_engine::{checkpoint, health_monitor, RestartManager, Topology, TunnelManager, TunnelManagerError};
use sv_storage::{Store, StoreError};
use sv_wire::{Request, Response};

/// Everything a dispatched request might need, generic over the adapter
/// implementations the daemon binary wires up to real collaborators (spec
/// §1: "tmux, docker, port allocator, secrets vault, DNS provider").
pub struct DispatchCtx<P, D, T, Doc, S, Tm, He>
where
    P: PortAllocator,
    D: DnsClient,
    T: TunnelDaemonControl,
    Doc: DockerProbe,
    S: SecretsVault,
    Tm: TmuxChannel,
    He: HandoffEnvironment,
{
    pub store: Arc<Mutex<Store>>,
    pub ports: P,
    pub tunnel_daemon: T,
    pub tunnel: TunnelManager<P, D, T>,
    pub topology: Arc<Topology<Doc>>,
    pub restart: Arc<RestartManager<T>>,
    pub secrets: S,
    pub git: sv_adapters::git::SystemGitProbe,
    pub handoff: Arc<HandoffOrchestrator<Tm, He>>,
    pub health_check_interval_secs: i64,
}

fn core_err(e: StoreError) -> CoreError {
    match e {
        StoreError::Core(e) => e,
        other => CoreError::internal(other.to_string()),
    }
}

fn tunnel_err(e: TunnelManagerError) -> CoreError {
    CoreError::new(e.kind(), e.to_string())
}

fn adapter_err(e: impl std::fmt::Display) -> CoreError {
    CoreError::external(e.to_string())
}

/// Handle one request, never producing anything other than a well-formed
/// response — failures are reported as `Response::Error`, never a
/// propagated `Err` (spec §7: "every operation returns `{success, ...}`").
pub async fn handle<P, D, T, Doc, S, Tm, He>(ctx: &DispatchCtx<P, D, T, Doc, S, Tm, He>, request: Request) -> Response
where
    P: PortAllocator,
    D: DnsClient,
    T: TunnelDaemonControl,
    Doc: DockerProbe,
    S: SecretsVault,
    Tm: TmuxChannel,
    He: HandoffEnvironment,
{
    let response = match dispatch(ctx, request).await {
        Ok(response) => response,
        Err(err) => Response::from_error(&err),
    };

    // Snapshot-if-due is cheap to call on every request (it's a no-op
    // until enough WAL entries have accumulated) and keeps the durability
    // cadence tied to actual write volume rather than a separate timer.
    if let Err(e) = ctx.store.lock().checkpoint_if_due(Utc::now()) {
        tracing::warn!(error = %e, "failed to snapshot store");
    }

    response
}

async fn dispatch<P, D, T, Doc, S, Tm, He>(
    ctx: &DispatchCtx<P, D, T, Doc, S, Tm, He>,
    request: Request,
) -> Result<Response, CoreError>
where
    P: PortAllocator,
    D: DnsClient,
    T: TunnelDaemonControl,
    Doc: DockerProbe,
    S: SecretsVault,
    Tm: TmuxChannel,
    He: HandoffEnvironment,
{
    let now = Utc::now();

    match request {
        Request::Ping => Ok(Response::Pong),

        // --- Session (C3) ---
        Request::SessionInitialize { project, instance_type, transport, external_handle } => {
            let prefix = match instance_type {
                sv_core::InstanceType::Ps => "ps",
                sv_core::InstanceType::Ms => "ms",
            };
            let instance_id = InstanceId::new(format!("{prefix}-{project}-{}", nanoid::nanoid!(8)))
                .map_err(|e| CoreError::validation(e.to_string()))?;
            let session = Session::new(instance_id.clone(), &project, instance_type, transport, external_handle, now);
            ctx.store.lock().register_session(session, crate::config::session_ttl_secs()).map_err(core_err)?;
            Ok(Response::SessionInitialized { instance_id })
        }
        Request::SessionHeartbeat { instance_id } => {
            ctx.store.lock().heartbeat(&instance_id, now).map_err(core_err)?;
            Ok(Response::Ok)
        }
        Request::SessionUpdateContextUsage { instance_id, percent, used, total } => {
            let report = health_monitor::ContextUsageReport { percent, used, total };
            let outcome = health_monitor::probe_context(&mut ctx.store.lock(), &instance_id, report, now).map_err(core_err)?;
            if outcome.triggers_handoff {
                spawn_handoff(ctx, &instance_id)?;
            }
            Ok(Response::Ok)
        }
        Request::SessionClose { instance_id } => {
            ctx.store.lock().close_session(&instance_id).map_err(core_err)?;
            Ok(Response::Ok)
        }
        Request::SessionListActive => {
            let sessions = ctx.store.lock().state().sessions.list_active(now).into_iter().cloned().collect();
            Ok(Response::SessionList { sessions })
        }

        // --- Events (C1 / C2) ---
        Request::EventsLog { instance_id, event_type, payload, parent } => {
            let event =
                sv_engine::ambient::log(&mut ctx.store.lock(), instance_id, event_type, payload, parent, now).map_err(core_err)?;
            Ok(Response::EventLogged { event_id: event.event_id })
        }
        Request::EventsRecent { instance_id, limit } => {
            let events = ctx.store.lock().state().events.get_recent(&instance_id, limit);
            Ok(Response::EventList { events })
        }
        Request::EventsParentChain { event_id, max_depth } => {
            let chain = ctx.store.lock().state().events.get_parent_chain(&event_id, max_depth)?;
            Ok(Response::EventChain { chain })
        }
        Request::EventsSubtree { root_id, max_depth } => {
            let events = ctx.store.lock().state().events.get_subtree(&root_id, max_depth)?;
            Ok(Response::EventList { events })
        }
        Request::EventsChildren { event_id } => {
            let events = ctx.store.lock().state().events.get_children(&event_id);
            Ok(Response::EventList { events })
        }

        // --- Checkpoints (C4) ---
        Request::CheckpointCreate { instance_id, kind, context_window_percent } => {
            let project = ctx.store.lock().state().sessions.get(&instance_id).map_err(core_err)?.project.clone();
            let capture_ctx = checkpoint::CaptureContext {
                project,
                working_directory: current_working_directory(),
                hostname: local_hostname(),
            };
            let checkpoint = checkpoint::capture(&mut ctx.store.lock(), &ctx.git, instance_id, kind, context_window_percent, capture_ctx, now)
                .await
                .map_err(core_err)?;
            Ok(Response::CheckpointCreated { checkpoint_id: checkpoint.checkpoint_id })
        }
        Request::CheckpointGet { checkpoint_id } => {
            let (work_state, resume_markdown) = checkpoint::retrieve(&ctx.store.lock(), &checkpoint_id).map_err(core_err)?;
            Ok(Response::CheckpointDetail { work_state, resume_markdown })
        }
        Request::CheckpointList { instance_id, kind, limit, offset } => {
            let checkpoint_ids = checkpoint::list(&ctx.store.lock(), &instance_id, kind, limit, offset);
            Ok(Response::CheckpointList { checkpoint_ids })
        }
        Request::CheckpointCleanup { retention_days } => {
            let (deleted_count, freed_bytes) =
                checkpoint::cleanup(&mut ctx.store.lock(), now, Some(retention_days)).map_err(core_err)?;
            Ok(Response::CheckpointCleanupReport { deleted_count, freed_bytes })
        }

        // --- Spawns (C5) ---
        Request::SpawnRegister { project, task_id, task_type, description, output_file, pid } => {
            let spawn = sv_core::Spawn {
                project,
                task_id,
                task_type,
                description,
                output_file,
                spawn_time: now,
                last_output_change: now,
                status: sv_core::SpawnStatus::Running,
                exit_code: None,
                error_message: None,
                completed_at: None,
                pid,
            };
            ctx.store.lock().register_spawn(spawn).map_err(core_err)?;
            Ok(Response::SpawnRegistered)
        }
        Request::SpawnTouch { project, task_id } => {
            ctx.store.lock().touch_spawn(&project, &task_id, now).map_err(core_err)?;
            Ok(Response::Ok)
        }
        Request::SpawnComplete { project, task_id, exit_code } => {
            ctx.store.lock().complete_spawn(&project, &task_id, exit_code, None, now).map_err(core_err)?;
            Ok(Response::Ok)
        }
        Request::SpawnList { project, status } => {
            let spawns = ctx
                .store
                .lock()
                .state()
                .spawns
                .list(Some(&project))
                .into_iter()
                .filter(|s| status.is_none_or(|want| s.status == want))
                .cloned()
                .collect();
            Ok(Response::SpawnList { spawns })
        }

        // --- Health (C6) ---
        Request::HealthRecord { project, check_type, status, details, action_taken, ps_response } => {
            let check = ctx
                .store
                .lock()
                .record_health_check(project, check_type, status, details, action_taken, ps_response, now)
                .map_err(core_err)?;
            Ok(Response::HealthRecorded { id: check.id })
        }
        Request::HealthStalledSpawns { project } => {
            let spawns = ctx
                .store
                .lock()
                .state()
                .spawns
                .list(Some(&project))
                .into_iter()
                .filter(|s| s.status == sv_core::SpawnStatus::Stalled)
                .cloned()
                .collect();
            Ok(Response::SpawnList { spawns })
        }
        Request::HealthSessionsNeedingCheck => {
            let instance_ids = health_monitor::sessions_needing_check(&ctx.store.lock(), ctx.health_check_interval_secs, now);
            Ok(Response::SessionsNeedingCheck { instance_ids })
        }

        // --- Tunnel / CNAME (C9 / C10) ---
        Request::TunnelStatus => {
            let active = ctx.tunnel_daemon.is_active().await.unwrap_or(false);
            let backoff_index = ctx.restart.state().backoff_index as u32;
            Ok(Response::TunnelStatus { active, backoff_index })
        }
        Request::TunnelRequestCname { subdomain, domain, target_port, project } => {
            let record = ctx
                .tunnel
                .request_cname(&mut ctx.store.lock(), &ctx.topology, &project, &subdomain, &domain, target_port, "127.0.0.1")
                .await
                .map_err(tunnel_err)?;
            Ok(Response::CnameCreated { id: record.id, hostname: record.hostname(), target_service: record.target_service })
        }
        Request::TunnelDeleteCname { hostname, requester, is_meta } => {
            ctx.tunnel.delete_cname(&mut ctx.store.lock(), &hostname, &requester, is_meta).await.map_err(tunnel_err)?;
            Ok(Response::CnameDeleted)
        }
        Request::TunnelListCnames { project } => {
            let hostnames =
                ctx.store.lock().state().cnames.list(project.as_deref()).into_iter().map(|c| c.hostname()).collect();
            Ok(Response::CnameList { hostnames })
        }
        Request::TunnelListDomains => {
            let mut domains: Vec<String> =
                ctx.store.lock().state().cnames.list(None).into_iter().map(|c| c.domain.clone()).collect();
            domains.sort();
            domains.dedup();
            Ok(Response::DomainList { domains })
        }

        // --- Ports (consumed, §6) ---
        Request::PortsGetOrAllocate { project, service } => {
            let port = ctx.ports.get_or_allocate(&project, &service).await.map_err(adapter_err)?;
            Ok(Response::Port { port })
        }
        Request::PortsList { project } => {
            let ports = ctx.ports.list(project.as_deref()).await.map_err(adapter_err)?;
            Ok(Response::PortList { ports })
        }
        Request::PortsRelease { project, service } => {
            ctx.ports.release(&project, &service).await.map_err(adapter_err)?;
            Ok(Response::Ok)
        }
        Request::PortsVerifyLive { port, host } => {
            let live = ctx.ports.verify_live(port, &host).await.map_err(adapter_err)?;
            Ok(Response::PortLive { live })
        }

        // --- Secrets (consumed, §6) ---
        Request::SecretsGet { key_path } => {
            let value = ctx.secrets.get(&key_path).await.map_err(adapter_err)?;
            Ok(Response::Secret { value })
        }
        Request::SecretsSet { key_path, value } => {
            ctx.secrets.set(&key_path, &value).await.map_err(adapter_err)?;
            Ok(Response::Ok)
        }
    }
}

/// Trigger a handoff cycle in the background rather than blocking the
/// context-usage report's response on the five-step cycle (spec §4.7 runs
/// over minutes; the reporting client just needs its push acknowledged).
fn spawn_handoff<P, D, T, Doc, S, Tm, He>(
    ctx: &DispatchCtx<P, D, T, Doc, S, Tm, He>,
    instance_id: &InstanceId,
) -> Result<(), CoreError>
where
    P: PortAllocator,
    D: DnsClient,
    T: TunnelDaemonControl,
    Doc: DockerProbe,
    S: SecretsVault,
    Tm: TmuxChannel + 'static,
    He: HandoffEnvironment + 'static,
{
    let session = ctx.store.lock().state().sessions.get(instance_id).map_err(core_err)?.external_handle.clone();
    let handoff = Arc::clone(&ctx.handoff);
    let store = Arc::clone(&ctx.store);
    let instance_id = instance_id.clone();
    tokio::spawn(async move {
        if let Err(err) = handoff.run(store, &instance_id, &session, None).await {
            tracing::warn!(%instance_id, error = %err, "handoff cycle failed to run");
        }
    });
    Ok(())
}

fn current_working_directory() -> String {
    std::env::current_dir().map(|p| p.display().to_string()).unwrap_or_else(|_| "/".to_string())
}

fn local_hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
