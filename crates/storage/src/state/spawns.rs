// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn Tracker store (C5): lifecycle rows for spawned child agents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use sv_core::{CoreError, Spawn, SpawnStatus, ABANDONED_THRESHOLD_SECS, STALL_THRESHOLD_SECS};

type Key = (String, String);

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SpawnStore {
    by_key: HashMap<Key, Spawn>,
}

impl SpawnStore {
    /// Register a new spawn. Errors if `(project, task_id)` already has a
    /// non-terminal row (spec §4.5, §8: "(project, task_id) unique").
    pub fn register(&mut self, spawn: Spawn) -> Result<(), CoreError> {
        let key = spawn.key();
        if let Some(existing) = self.by_key.get(&key) {
            if !existing.status.is_terminal() {
                return Err(CoreError::conflict(format!(
                    "spawn {}/{} already running",
                    key.0, key.1
                )));
            }
        }
        self.by_key.insert(key, spawn);
        Ok(())
    }

    /// Record output activity, clearing a `stalled` status back to `running`
    /// (spec §4.5: mtime-only, non-invasive).
    pub fn touch(&mut self, project: &str, task_id: &str, now: DateTime<Utc>) -> Result<(), CoreError> {
        let spawn = self.get_mut(project, task_id)?;
        spawn.last_output_change = now;
        if spawn.status == SpawnStatus::Stalled {
            spawn.status = SpawnStatus::Running;
        }
        Ok(())
    }

    pub fn complete(
        &mut self,
        project: &str,
        task_id: &str,
        exit_code: i32,
        error_message: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<&Spawn, CoreError> {
        let spawn = self.get_mut(project, task_id)?;
        spawn.status = if exit_code == 0 { SpawnStatus::Completed } else { SpawnStatus::Failed };
        spawn.exit_code = Some(exit_code);
        spawn.error_message = error_message;
        spawn.completed_at = Some(now);
        Ok(spawn)
    }

    /// Insert an already-validated spawn verbatim, as replayed from the WAL.
    pub fn replay_recorded(&mut self, spawn: Spawn) {
        self.by_key.insert(spawn.key(), spawn);
    }

    /// Apply a status transition directly, as replayed from a
    /// `SpawnStatusChanged` entry. No-op if the row is missing (a replay
    /// can never observe this, but a defensively-ordered apply might).
    pub fn replay_status_change(
        &mut self,
        project: &str,
        task_id: &str,
        status: SpawnStatus,
        exit_code: Option<i32>,
        error_message: Option<String>,
        now: DateTime<Utc>,
    ) {
        if let Ok(spawn) = self.get_mut(project, task_id) {
            spawn.status = status;
            spawn.exit_code = exit_code;
            spawn.error_message = error_message;
            if status.is_terminal() {
                spawn.completed_at = Some(now);
            }
        }
    }

    pub fn get(&self, project: &str, task_id: &str) -> Result<&Spawn, CoreError> {
        self.by_key
            .get(&(project.to_string(), task_id.to_string()))
            .ok_or_else(|| CoreError::not_found(format!("spawn {project}/{task_id} not found")))
    }

    fn get_mut(&mut self, project: &str, task_id: &str) -> Result<&mut Spawn, CoreError> {
        self.by_key
            .get_mut(&(project.to_string(), task_id.to_string()))
            .ok_or_else(|| CoreError::not_found(format!("spawn {project}/{task_id} not found")))
    }

    /// Rows for `project`, or all rows when `project` is `None`, ordered by
    /// `(project, task_id)` for determinism.
    pub fn list(&self, project: Option<&str>) -> Vec<&Spawn> {
        let mut out: Vec<&Spawn> = self
            .by_key
            .values()
            .filter(|s| project.is_none_or_eq(&s.project))
            .collect();
        out.sort_by(|a, b| a.key().cmp(&b.key()));
        out
    }

    /// Mark `running` spawns whose output hasn't changed in
    /// `STALL_THRESHOLD_SECS` as `stalled`. Returns the keys transitioned.
    pub fn sweep_stalled(&mut self, now: DateTime<Utc>) -> Vec<Key> {
        let mut transitioned = Vec::new();
        for spawn in self.by_key.values_mut() {
            if spawn.status == SpawnStatus::Running {
                let idle = now.signed_duration_since(spawn.last_output_change).num_seconds();
                if idle >= STALL_THRESHOLD_SECS as i64 {
                    spawn.status = SpawnStatus::Stalled;
                    transitioned.push(spawn.key());
                }
            }
        }
        transitioned
    }

    /// `stalled` spawns idle past `ABANDONED_THRESHOLD_SECS`, with the pid
    /// recorded at `register` time (if any). Read-only: the caller still
    /// has to check process liveness for each candidate with a
    /// `sv_adapters::ProcessProbe` before calling [`Self::apply_abandoned`]
    /// (spec §4.5: abandoned requires idle past threshold *and* no live
    /// process, not age alone).
    pub fn abandon_candidates(&self, now: DateTime<Utc>) -> Vec<(Key, Option<u32>)> {
        self.by_key
            .values()
            .filter(|spawn| spawn.status == SpawnStatus::Stalled)
            .filter(|spawn| {
                let idle = now.signed_duration_since(spawn.last_output_change).num_seconds();
                idle >= ABANDONED_THRESHOLD_SECS as i64
            })
            .map(|spawn| (spawn.key(), spawn.pid))
            .collect()
    }

    /// Transition `keys` from `stalled` to `abandoned`. Keys that are no
    /// longer `stalled` are skipped. Returns the keys actually transitioned.
    pub fn apply_abandoned(&mut self, keys: &[Key]) -> Vec<Key> {
        let mut transitioned = Vec::new();
        for key in keys {
            if let Some(spawn) = self.by_key.get_mut(key) {
                if spawn.status == SpawnStatus::Stalled {
                    spawn.status = SpawnStatus::Abandoned;
                    transitioned.push(key.clone());
                }
            }
        }
        transitioned
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

trait OptStrExt {
    fn is_none_or_eq(&self, value: &str) -> bool;
}

impl OptStrExt for Option<&str> {
    fn is_none_or_eq(&self, value: &str) -> bool {
        match self {
            Some(want) => *want == value,
            None => true,
        }
    }
}

#[cfg(test)]
#[path = "spawns_tests.rs"]
mod tests;
