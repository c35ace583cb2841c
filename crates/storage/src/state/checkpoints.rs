// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint store (C4): immutable work-state snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use sv_core::{Checkpoint, CheckpointId, CheckpointKind, CoreError, InstanceId, WorkState};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CheckpointStore {
    by_id: HashMap<CheckpointId, Checkpoint>,
    by_instance: HashMap<InstanceId, Vec<CheckpointId>>,
    next_seq: HashMap<InstanceId, u64>,
}

impl CheckpointStore {
    /// Capture a new checkpoint row; checkpoints are immutable once written
    /// (spec §4.4). `sequence_num` is monotonic per instance.
    pub fn create(
        &mut self,
        instance_id: InstanceId,
        kind: CheckpointKind,
        context_window_percent: f64,
        work_state: WorkState,
        metadata: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<Checkpoint, CoreError> {
        let seq = self.next_seq.entry(instance_id.clone()).or_insert(0);
        *seq += 1;
        let checkpoint = Checkpoint {
            checkpoint_id: CheckpointId::new(),
            instance_id: instance_id.clone(),
            kind,
            sequence_num: *seq,
            context_window_percent,
            timestamp: now,
            work_state,
            metadata,
        };
        if !checkpoint.has_valid_percent() {
            return Err(CoreError::validation(format!(
                "context_window_percent {} out of [0, 100]",
                checkpoint.context_window_percent
            )));
        }
        self.by_instance.entry(instance_id).or_default().push(checkpoint.checkpoint_id.clone());
        self.by_id.insert(checkpoint.checkpoint_id.clone(), checkpoint.clone());
        Ok(checkpoint)
    }

    /// Insert an already-validated checkpoint verbatim, as replayed from the WAL.
    pub fn replay(&mut self, checkpoint: Checkpoint) {
        let seq = self.next_seq.entry(checkpoint.instance_id.clone()).or_insert(0);
        *seq = (*seq).max(checkpoint.sequence_num);
        self.by_instance.entry(checkpoint.instance_id.clone()).or_default().push(checkpoint.checkpoint_id.clone());
        self.by_id.insert(checkpoint.checkpoint_id.clone(), checkpoint);
    }

    /// Remove a single checkpoint by id, as replayed from a `CheckpointPruned` entry.
    pub fn prune(&mut self, checkpoint_id: &CheckpointId) {
        if let Some(checkpoint) = self.by_id.remove(checkpoint_id) {
            if let Some(ids) = self.by_instance.get_mut(&checkpoint.instance_id) {
                ids.retain(|existing| existing != checkpoint_id);
            }
        }
    }

    pub fn get(&self, checkpoint_id: &CheckpointId) -> Result<&Checkpoint, CoreError> {
        self.by_id
            .get(checkpoint_id)
            .ok_or_else(|| CoreError::not_found(format!("checkpoint {checkpoint_id} not found")))
    }

    /// Checkpoints for `instance_id`, oldest first.
    pub fn list(&self, instance_id: &InstanceId) -> Vec<&Checkpoint> {
        self.by_instance
            .get(instance_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id))
            .collect()
    }

    /// Most recent checkpoint for `instance_id`, used by the resume path.
    pub fn latest(&self, instance_id: &InstanceId) -> Option<&Checkpoint> {
        self.list(instance_id).into_iter().last()
    }

    /// Ids of checkpoints older than `retention_days` as of `now` (spec
    /// §4.4), read-only so the caller can journal one prune entry per row.
    pub fn expired(&self, now: DateTime<Utc>, retention_days: u32) -> Vec<CheckpointId> {
        let cutoff = now - chrono::Duration::days(retention_days as i64);
        self.by_id
            .values()
            .filter(|c| c.timestamp < cutoff)
            .map(|c| c.checkpoint_id.clone())
            .collect()
    }

    /// Delete checkpoints older than `retention_days` (spec §4.4). Returns
    /// the number removed.
    pub fn cleanup(&mut self, now: DateTime<Utc>, retention_days: u32) -> usize {
        let expired = self.expired(now, retention_days);
        for id in &expired {
            self.prune(id);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
#[path = "checkpoints_tests.rs"]
mod tests;
