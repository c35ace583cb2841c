// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed request variants for the tool dispatch surface (spec §6).

use serde::{Deserialize, Serialize};
use sv_core::{CheckpointId, CheckpointKind, EventId, InstanceId, InstanceType, SessionTransport};

/// One operation from the tool dispatch surface, decoded off the wire and
/// routed by the daemon's dispatcher (C11) to the owning component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Liveness probe; daemon replies `Response::Pong`.
    Ping,

    // --- Session (C3) ---
    SessionInitialize {
        project: String,
        instance_type: InstanceType,
        transport: SessionTransport,
        external_handle: String,
    },
    SessionHeartbeat {
        instance_id: InstanceId,
    },
    SessionUpdateContextUsage {
        instance_id: InstanceId,
        /// Percentage reading, authoritative when present (spec Open Questions §9).
        percent: Option<f64>,
        used: Option<u64>,
        total: Option<u64>,
    },
    SessionClose {
        instance_id: InstanceId,
    },
    SessionListActive,

    // --- Events (C1 / C2) ---
    EventsLog {
        instance_id: InstanceId,
        event_type: String,
        payload: serde_json::Value,
        parent: Option<EventId>,
    },
    EventsRecent {
        instance_id: InstanceId,
        limit: usize,
    },
    EventsParentChain {
        event_id: EventId,
        max_depth: u32,
    },
    EventsSubtree {
        root_id: EventId,
        max_depth: u32,
    },
    EventsChildren {
        event_id: EventId,
    },

    // --- Checkpoints (C4) ---
    CheckpointCreate {
        instance_id: InstanceId,
        kind: CheckpointKind,
        context_window_percent: f64,
    },
    CheckpointGet {
        checkpoint_id: CheckpointId,
    },
    CheckpointList {
        instance_id: InstanceId,
        kind: Option<CheckpointKind>,
        limit: usize,
        offset: usize,
    },
    CheckpointCleanup {
        retention_days: u32,
    },

    // --- Spawns (C5) ---
    SpawnRegister {
        project: String,
        task_id: String,
        task_type: String,
        description: String,
        output_file: String,
        pid: Option<u32>,
    },
    SpawnTouch {
        project: String,
        task_id: String,
    },
    SpawnComplete {
        project: String,
        task_id: String,
        exit_code: i32,
    },
    SpawnList {
        project: String,
        status: Option<sv_core::SpawnStatus>,
    },

    // --- Health (C6) ---
    HealthRecord {
        project: String,
        check_type: sv_core::CheckType,
        status: sv_core::CheckStatus,
        details: serde_json::Value,
        action_taken: Option<String>,
        ps_response: Option<String>,
    },
    HealthStalledSpawns {
        project: String,
    },
    HealthSessionsNeedingCheck,

    // --- Tunnel / CNAME (C9 / C10) ---
    TunnelStatus,
    TunnelRequestCname {
        subdomain: String,
        domain: String,
        target_port: u16,
        project: String,
    },
    TunnelDeleteCname {
        hostname: String,
        requester: String,
        is_meta: bool,
    },
    TunnelListCnames {
        project: Option<String>,
    },
    TunnelListDomains,

    // --- Ports (consumed, §6) ---
    PortsGetOrAllocate {
        project: String,
        service: String,
    },
    PortsList {
        project: Option<String>,
    },
    PortsRelease {
        project: String,
        service: String,
    },
    PortsVerifyLive {
        port: u16,
        host: String,
    },

    // --- Secrets (consumed, §6) ---
    SecretsGet {
        key_path: String,
    },
    SecretsSet {
        key_path: String,
        value: String,
    },
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
