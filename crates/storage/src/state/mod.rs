// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built from WAL replay (spec §3, §5: "in-process
//! state is strictly a cache" over the relational data model; here the
//! WAL is the durable log and this struct is the replayed view of it).

mod checkpoints;
mod events;
mod health;
mod sessions;
mod spawns;
mod tunnel;

pub use checkpoints::CheckpointStore;
pub use events::EventStore;
pub use health::HealthStore;
pub use sessions::SessionStore;
pub use spawns::SpawnStore;
pub use tunnel::CnameStore;

use serde::{Deserialize, Serialize};

/// Complete materialized view, one instance per daemon process.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    #[serde(default)]
    pub sessions: SessionStore,
    #[serde(default)]
    pub events: EventStore,
    #[serde(default)]
    pub checkpoints: CheckpointStore,
    #[serde(default)]
    pub spawns: SpawnStore,
    #[serde(default)]
    pub health_checks: HealthStore,
    #[serde(default)]
    pub cnames: CnameStore,
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
