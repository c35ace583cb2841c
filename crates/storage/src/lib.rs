// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable storage for one project's supervisor runtime: a write-ahead log
//! of every mutation plus the [`MaterializedState`] replayed from it (spec
//! §3, §5 — "in-process state is strictly a cache" over the durable log;
//! this crate plays the role the spec's relational database would, with
//! the WAL as the append-only source of truth and periodic snapshots
//! bounding replay time on restart).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod migration;
pub mod snapshot;
pub mod state;
pub mod wal;

pub use migration::{Migration, MigrationError, MigrationRegistry};
pub use snapshot::{Checkpointer, Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::MaterializedState;
pub use wal::{Wal, WalEntry, WalError, WalRecord};

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use sv_core::{
    Checkpoint, CheckpointId, CheckpointKind, CnameId, CnameRecord, CoreError, Event, EventId,
    HealthCheck, InstanceId, Session, Spawn, SpawnStatus, WorkState,
};
use thiserror::Error;

/// Number of applied WAL entries between automatic snapshots. Keeps replay
/// on restart bounded without snapshotting on every single mutation.
pub const SNAPSHOT_EVERY_N_ENTRIES: u64 = 500;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Per-project durable store: WAL-backed mutations over a materialized,
/// in-memory view. Every mutating method here both updates `state` and
/// appends the corresponding [`WalEntry`] — the two never drift, since the
/// WAL append only happens after the in-memory mutation has already
/// succeeded.
pub struct Store {
    wal: Wal,
    checkpointer: Checkpointer,
    state: MaterializedState,
    applied_since_snapshot: u64,
}

impl Store {
    /// Open (or create) the store rooted at `data_dir`, loading the most
    /// recent snapshot if present and replaying every WAL entry written
    /// after it.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).map_err(WalError::from)?;
        let snapshot_path = data_dir.join("snapshot.json");
        let wal_path = data_dir.join("wal.log");

        let checkpointer = Checkpointer::new(&snapshot_path);
        let (mut state, processed_seq) = match checkpointer.load()? {
            Some(snapshot) => (snapshot.state, snapshot.seq),
            None => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(&wal_path, processed_seq)?;
        for record in wal.entries_after(processed_seq)? {
            apply(&mut state, record.entry);
            wal.mark_processed(record.seq);
        }
        wal.flush()?;

        Ok(Self { wal, checkpointer, state, applied_since_snapshot: 0 })
    }

    pub fn state(&self) -> &MaterializedState {
        &self.state
    }

    /// Snapshot the current state and truncate the WAL prefix it now
    /// covers. Safe to call at any time; cheap to skip via
    /// [`Store::checkpoint_if_due`].
    pub fn checkpoint(&mut self, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.wal.flush()?;
        let seq = self.wal.write_seq();
        self.checkpointer.checkpoint(&self.state, seq, now)?;
        self.wal.mark_processed(seq);
        self.wal.truncate_before(seq + 1)?;
        self.applied_since_snapshot = 0;
        Ok(())
    }

    /// Checkpoint only if at least [`SNAPSHOT_EVERY_N_ENTRIES`] mutations
    /// have been applied since the last one.
    pub fn checkpoint_if_due(&mut self, now: DateTime<Utc>) -> Result<(), StoreError> {
        if self.applied_since_snapshot >= SNAPSHOT_EVERY_N_ENTRIES {
            self.checkpoint(now)?;
        }
        Ok(())
    }

    fn record(&mut self, entry: WalEntry) -> Result<(), StoreError> {
        self.wal.append(&entry)?;
        self.applied_since_snapshot += 1;
        Ok(())
    }

    // -- Instance Registry (C3) --------------------------------------

    /// Registers do not replay from the WAL (a restarted daemon finds no
    /// live tmux/SDK session behind a stale row); `InstanceRegistered` is
    /// written purely as an audit marker.
    pub fn register_session(&mut self, session: Session, ttl_secs: u64) -> Result<(), StoreError> {
        let instance_id = session.instance_id.clone();
        self.state.sessions.register(session, ttl_secs)?;
        self.record(WalEntry::InstanceRegistered { instance_id: instance_id.to_string() })?;
        Ok(())
    }

    pub fn close_session(&mut self, instance_id: &InstanceId) -> Result<Session, StoreError> {
        let session = self.state.sessions.close(instance_id)?;
        self.record(WalEntry::InstanceDeregistered { instance_id: instance_id.to_string() })?;
        Ok(session)
    }

    /// Liveness heartbeat. Not journaled, for the same reason registration
    /// markers carry no replay semantics: a restarted daemon has no live
    /// tmux/SDK process behind any session row, stale or fresh.
    pub fn heartbeat(&mut self, instance_id: &InstanceId, now: DateTime<Utc>) -> Result<(), StoreError> {
        Ok(self.state.sessions.heartbeat(instance_id, now)?)
    }

    /// Record a context-usage reading (spec Open Questions §9: `percent` is
    /// authoritative when present, else derived from `used`/`total`).
    pub fn update_context_usage(
        &mut self,
        instance_id: &InstanceId,
        percent: Option<f64>,
        used: Option<u64>,
        total: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Ok(self.state.sessions.update_context_usage(instance_id, percent, used, total, now)?)
    }

    /// Reset context usage to 0 after a successful handoff cycle (spec §4.7).
    pub fn reset_context_usage(&mut self, instance_id: &InstanceId) -> Result<(), StoreError> {
        Ok(self.state.sessions.reset_context_usage(instance_id)?)
    }

    /// Close every session stale as of `now` (spec §4.3 supplement). Returns
    /// the number closed. Distinct from `list_active`, which only filters.
    pub fn cleanup_stale_sessions(&mut self, ttl_secs: u64, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let stale = self.state.sessions.stale(ttl_secs, now);
        for instance_id in &stale {
            self.close_session(instance_id)?;
        }
        Ok(stale.len())
    }

    // -- Event Logger (C1) --------------------------------------------

    pub fn log_event(
        &mut self,
        instance_id: InstanceId,
        event_type: impl Into<String>,
        event_data: serde_json::Value,
        parent_uuid: Option<EventId>,
        now: DateTime<Utc>,
    ) -> Result<Event, StoreError> {
        let event = self.state.events.append(instance_id, event_type, event_data, parent_uuid, now)?;
        self.record(WalEntry::EventLogged { event: event.clone() })?;
        Ok(event)
    }

    // -- Checkpoint Engine (C4) ----------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn create_checkpoint(
        &mut self,
        instance_id: InstanceId,
        kind: CheckpointKind,
        context_window_percent: f64,
        work_state: WorkState,
        metadata: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<Checkpoint, StoreError> {
        let checkpoint = self
            .state
            .checkpoints
            .create(instance_id, kind, context_window_percent, work_state, metadata, now)?;
        self.record(WalEntry::CheckpointCreated { checkpoint: checkpoint.clone() })?;
        Ok(checkpoint)
    }

    /// Drop checkpoints older than `retention_days`, journaling one
    /// `CheckpointPruned` entry per row removed.
    pub fn cleanup_checkpoints(&mut self, now: DateTime<Utc>, retention_days: u32) -> Result<usize, StoreError> {
        let expired = self.state.checkpoints.expired(now, retention_days);
        for checkpoint_id in &expired {
            self.state.checkpoints.prune(checkpoint_id);
            self.record(WalEntry::CheckpointPruned { checkpoint_id: checkpoint_id.to_string() })?;
        }
        Ok(expired.len())
    }

    // -- Spawn Tracker (C5) ---------------------------------------------

    pub fn register_spawn(&mut self, spawn: Spawn) -> Result<(), StoreError> {
        self.state.spawns.register(spawn.clone())?;
        self.record(WalEntry::SpawnRecorded { spawn })?;
        Ok(())
    }

    pub fn touch_spawn(&mut self, project: &str, task_id: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        // Output-activity touches are mtime bookkeeping only; they are not
        // journaled (spec §4.5 non-invasiveness) but the status flip they
        // can trigger (stalled -> running) is, via `change_spawn_status`.
        let was_stalled = self.state.spawns.get(project, task_id)?.status == SpawnStatus::Stalled;
        self.state.spawns.touch(project, task_id, now)?;
        if was_stalled {
            self.record(WalEntry::SpawnStatusChanged {
                project: project.to_string(),
                task_id: task_id.to_string(),
                status: SpawnStatus::Running,
                exit_code: None,
                error_message: None,
            })?;
        }
        Ok(())
    }

    pub fn complete_spawn(
        &mut self,
        project: &str,
        task_id: &str,
        exit_code: i32,
        error_message: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Spawn, StoreError> {
        let spawn = self.state.spawns.complete(project, task_id, exit_code, error_message.clone(), now)?.clone();
        self.record(WalEntry::SpawnStatusChanged {
            project: project.to_string(),
            task_id: task_id.to_string(),
            status: spawn.status,
            exit_code: Some(exit_code),
            error_message,
        })?;
        Ok(spawn)
    }

    /// Sweep `running` spawns into `stalled`, journaling one entry per
    /// transition (spec §4.5).
    pub fn sweep_stalled_spawns(&mut self, now: DateTime<Utc>) -> Result<(), StoreError> {
        for (project, task_id) in self.state.spawns.sweep_stalled(now) {
            self.record(WalEntry::SpawnStatusChanged {
                project,
                task_id,
                status: SpawnStatus::Stalled,
                exit_code: None,
                error_message: None,
            })?;
        }
        Ok(())
    }

    /// `stalled` spawns idle past `ABANDONED_THRESHOLD_SECS`, paired with
    /// the pid recorded at registration (spec §4.5: abandonment also
    /// requires no live process — the caller checks liveness with a
    /// `sv_adapters::ProcessProbe` and passes the dead ones to
    /// [`Self::apply_abandoned_spawns`]).
    pub fn abandon_candidates(&self, now: DateTime<Utc>) -> Vec<((String, String), Option<u32>)> {
        self.state.spawns.abandon_candidates(now)
    }

    /// Transition `keys` from `stalled` to `abandoned`, journaling one
    /// entry per transition actually applied.
    pub fn apply_abandoned_spawns(&mut self, keys: &[(String, String)]) -> Result<(), StoreError> {
        for (project, task_id) in self.state.spawns.apply_abandoned(keys) {
            self.record(WalEntry::SpawnStatusChanged {
                project,
                task_id,
                status: SpawnStatus::Abandoned,
                exit_code: None,
                error_message: None,
            })?;
        }
        Ok(())
    }

    // -- Health Monitor (C6) ---------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn record_health_check(
        &mut self,
        project: impl Into<String>,
        check_type: sv_core::CheckType,
        status: sv_core::CheckStatus,
        details: serde_json::Value,
        action_taken: Option<String>,
        ps_response: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<HealthCheck, StoreError> {
        let check = self
            .state
            .health_checks
            .record(project, check_type, status, details, action_taken, ps_response, now);
        self.record(WalEntry::HealthCheckRecorded { check: check.clone() })?;
        Ok(check)
    }

    // -- Tunnel Manager (C9) ----------------------------------------------

    pub fn create_cname(&mut self, record: CnameRecord) -> Result<(), StoreError> {
        self.state.cnames.create(record.clone())?;
        self.record(WalEntry::CnameCreated { record })?;
        Ok(())
    }

    pub fn delete_cname(&mut self, id: &CnameId) -> Result<CnameRecord, StoreError> {
        let record = self.state.cnames.delete(id)?;
        self.record(WalEntry::CnameDeleted { cname_id: id.to_string() })?;
        Ok(record)
    }

    /// Journal a graceful-shutdown marker so a replaying restart doesn't
    /// re-trigger shutdown-time side effects.
    pub fn mark_shutdown(&mut self) -> Result<(), StoreError> {
        self.record(WalEntry::Shutdown)
    }
}

/// Fold one WAL entry into `state`. Replay-only: skips the validation the
/// live mutation paths perform, since a WAL entry only exists because it
/// already passed that validation once.
fn apply(state: &mut MaterializedState, entry: WalEntry) {
    match entry {
        WalEntry::EventLogged { event } => state.events.replay(event),
        WalEntry::CheckpointCreated { checkpoint } => state.checkpoints.replay(checkpoint),
        WalEntry::CheckpointPruned { checkpoint_id } => {
            state.checkpoints.prune(&CheckpointId::from_string(checkpoint_id));
        }
        WalEntry::SpawnRecorded { spawn } => state.spawns.replay_recorded(spawn),
        WalEntry::SpawnStatusChanged { project, task_id, status, exit_code, error_message } => {
            state.spawns.replay_status_change(&project, &task_id, status, exit_code, error_message, Utc::now());
        }
        WalEntry::HealthCheckRecorded { check } => state.health_checks.replay(check),
        WalEntry::CnameCreated { record } => state.cnames.replay_created(record),
        WalEntry::CnameDeleted { cname_id } => state.cnames.replay_deleted(&CnameId::from_string(cname_id)),
        // Session rows are not reconstructable from these thin markers and
        // are not part of the durable replay surface; see module docs.
        WalEntry::InstanceRegistered { .. } | WalEntry::InstanceDeregistered { .. } => {}
        WalEntry::Shutdown => {}
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
