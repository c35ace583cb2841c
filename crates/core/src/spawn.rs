// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Active spawn (child agent) domain type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stall threshold: no output-file mtime change for this long marks a
/// `running` spawn `stalled` (spec §4.5: 15 minutes).
pub const STALL_THRESHOLD_SECS: u64 = 15 * 60;

/// Abandoned threshold: stalled this long with no live process marks a
/// spawn `abandoned` (spec §4.5: "a long threshold"). Default chosen at 2h.
pub const ABANDONED_THRESHOLD_SECS: u64 = 2 * 60 * 60;

/// Lifecycle status of a spawned child agent.
///
/// Transitions only from `Running` (spec §8 invariant): `running -> {
/// completed | failed | stalled | abandoned }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnStatus {
    Running,
    Completed,
    Failed,
    Stalled,
    Abandoned,
}

crate::simple_display! {
    SpawnStatus {
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Stalled => "stalled",
        Abandoned => "abandoned",
    }
}

impl SpawnStatus {
    /// Whether this status is terminal (no further transitions allowed).
    pub fn is_terminal(self) -> bool {
        !matches!(self, SpawnStatus::Running)
    }
}

/// A child agent lifecycle row. `(project, task_id)` is unique (spec §8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawn {
    pub project: String,
    pub task_id: String,
    pub task_type: String,
    pub description: String,
    pub output_file: String,
    pub spawn_time: DateTime<Utc>,
    pub last_output_change: DateTime<Utc>,
    pub status: SpawnStatus,
    pub exit_code: Option<i32>,
    pub error_message: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Process id of the spawned child, when known, for abandoned detection.
    pub pid: Option<u32>,
}

impl Spawn {
    pub fn key(&self) -> (String, String) {
        (self.project.clone(), self.task_id.clone())
    }
}
