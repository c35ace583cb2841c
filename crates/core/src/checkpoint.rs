// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint domain types: immutable work-state snapshots.

use crate::instance::InstanceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier for a checkpoint snapshot.
    pub struct CheckpointId("chk-");
}

/// Default retention window for checkpoint cleanup (spec §4.4: 30 days).
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// What triggered a checkpoint capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointKind {
    ContextWindow,
    EpicCompletion,
    Manual,
}

crate::simple_display! {
    CheckpointKind {
        ContextWindow => "context_window",
        EpicCompletion => "epic_completion",
        Manual => "manual",
    }
}

/// Status of a file change observed in the working tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileChangeStatus {
    Modified,
    Added,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub status: FileChangeStatus,
    pub lines_changed: u32,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GitStatus {
    pub branch: String,
    pub staged: u32,
    pub unstaged: u32,
    pub untracked: u32,
    pub commit_count: u64,
    pub files: Vec<FileChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicStatus {
    pub id: String,
    pub status: String,
    pub duration_secs: u64,
    pub test_results: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrdStatus {
    pub version: String,
    pub current_epic: Option<String>,
    pub next_epic: Option<String>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub project: String,
    pub working_directory: String,
    pub hostname: String,
}

/// Externally-visible work state captured at checkpoint time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkState {
    pub current_epic: Option<EpicStatus>,
    pub files_modified: Vec<FileChange>,
    pub git_status: GitStatus,
    pub last_commands: Vec<String>,
    pub prd_status: Option<PrdStatus>,
    pub environment: Environment,
    pub snapshot_at: DateTime<Utc>,
}

impl WorkState {
    /// Enforce the "up to 20 recent command summaries" cap (spec §4.4).
    pub const MAX_LAST_COMMANDS: usize = 20;
}

/// An immutable checkpoint row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub checkpoint_id: CheckpointId,
    pub instance_id: InstanceId,
    pub kind: CheckpointKind,
    pub sequence_num: u64,
    pub context_window_percent: f64,
    pub timestamp: DateTime<Utc>,
    pub work_state: WorkState,
    pub metadata: serde_json::Value,
}

impl Checkpoint {
    /// True when `context_window_percent` is within the spec's [0,100] bound.
    pub fn has_valid_percent(&self) -> bool {
        (0.0..=100.0).contains(&self.context_window_percent)
    }
}
