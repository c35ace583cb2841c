// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event lineage domain type.
//!
//! `event_type` is kept as a free-form short tag (`String`) rather than a
//! closed enum: the event store is a generic causal log for whatever the
//! dispatch surface chooses to log (`events.log(type, payload, parent?)`),
//! not a fixed set of job/agent lifecycle events.

use crate::instance::InstanceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier for a single lineage event.
    pub struct EventId("evt-");
}

/// Bound on parent-chain walk depth (spec §4.1: cycle detection and
/// `get_parent_chain` are both bounded at 1000).
pub const MAX_CHAIN_DEPTH: u32 = 1000;

/// Bound on subtree walk depth (spec §4.1: `get_subtree` default 10).
pub const DEFAULT_SUBTREE_DEPTH: u32 = 10;

/// Default/hard-cap sizes for `events.recent` and the Event Logger's
/// in-memory ring (spec §4.1, §4.2).
pub const DEFAULT_RECENT_LIMIT: usize = 50;
pub const MAX_RECENT_LIMIT: usize = 1000;

/// An immutable, causally-linked event row.
///
/// Invariants (enforced by the storage layer's append path, never by this
/// type itself — see spec §3):
/// - `parent_uuid.is_none()` implies `depth == 0` and `root_uuid == event_id`.
/// - `parent_uuid.is_some()` implies `depth == parent.depth + 1` and
///   `root_uuid == parent.root_uuid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    pub instance_id: InstanceId,
    pub event_type: String,
    pub sequence_num: u64,
    pub timestamp: DateTime<Utc>,
    pub event_data: serde_json::Value,
    pub parent_uuid: Option<EventId>,
    pub root_uuid: EventId,
    pub depth: u32,
}

impl Event {
    /// True if this event is a root (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_uuid.is_none()
    }
}
