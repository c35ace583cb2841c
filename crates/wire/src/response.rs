// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed response variants for the tool dispatch surface (spec §6).
//!
//! Every operation returns `{success, ...}` (spec §7); failures are carried
//! as `Response::Error(ErrorEnvelope)` rather than a bare string so clients
//! never see an "empty success".

use serde::{Deserialize, Serialize};
use sv_core::{
    CheckpointId, CnameId, Event, ErrorEnvelope, EventId, HealthCheck, InstanceId, Session, Spawn,
    WorkState,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Pong,
    Error(ErrorEnvelope),

    SessionInitialized {
        instance_id: InstanceId,
    },
    SessionList {
        sessions: Vec<Session>,
    },

    EventLogged {
        event_id: EventId,
    },
    EventList {
        events: Vec<Event>,
    },
    EventChain {
        chain: Vec<Event>,
    },

    CheckpointCreated {
        checkpoint_id: CheckpointId,
    },
    CheckpointDetail {
        work_state: WorkState,
        resume_markdown: String,
    },
    CheckpointList {
        checkpoint_ids: Vec<CheckpointId>,
    },
    CheckpointCleanupReport {
        deleted_count: usize,
        freed_bytes: u64,
    },

    SpawnRegistered,
    SpawnList {
        spawns: Vec<Spawn>,
    },

    HealthRecorded {
        id: sv_core::HealthCheckId,
    },
    HealthList {
        checks: Vec<HealthCheck>,
    },
    SessionsNeedingCheck {
        instance_ids: Vec<InstanceId>,
    },

    TunnelStatus {
        active: bool,
        backoff_index: u32,
    },
    CnameCreated {
        id: CnameId,
        hostname: String,
        target_service: String,
    },
    CnameDeleted,
    CnameList {
        hostnames: Vec<String>,
    },
    DomainList {
        domains: Vec<String>,
    },

    Port {
        port: u16,
    },
    PortList {
        ports: Vec<u16>,
    },
    PortLive {
        live: bool,
    },

    Secret {
        value: String,
    },
}

impl Response {
    pub fn is_success(&self) -> bool {
        !matches!(self, Response::Error(_))
    }

    pub fn from_error(err: &sv_core::CoreError) -> Self {
        Response::Error(ErrorEnvelope::from(err))
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
