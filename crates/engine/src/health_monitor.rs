// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health Monitor (C6): the three periodic probes spec §4.6 describes —
//! spawn sweep, context probe classification, orphaned-work detection —
//! plus the `sessions_needing_check` helper named in spec §6.
//!
//! Every probe outcome is recorded twice: once as a `health_checks` audit
//! row (append-only, spec §3) and once as an `Event` parented to nothing
//! (context probes) or to the triggering probe (handoff steps, via
//! [`crate::handoff`]), so `events.subtree` over a probe's `event_id`
//! reconstructs the full probe -> action chain (SPEC_FULL.md §4.6
//! supplement; spec §8 scenario 2).

use crate::ambient;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use sv_adapters::ProcessProbe;
use sv_core::{CheckStatus, CheckType, ContextZone, InstanceId};
use sv_storage::{Store, StoreError};
use tracing::{info, warn};

/// A context-usage reading accepted from the host runtime (spec Open
/// Questions §9): `percent` is authoritative when present, otherwise
/// computed from `used`/`total`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextUsageReport {
    pub percent: Option<f64>,
    pub used: Option<u64>,
    pub total: Option<u64>,
}

/// Outcome of a single context probe: the classified zone plus whether a
/// handoff should now be triggered by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextProbeOutcome {
    pub zone: ContextZone,
    pub triggers_handoff: bool,
}

/// Record a context-usage reading and classify it into a zone (spec §4.6
/// probe 2, §4.7 threshold table). Always writes a `health_checks` row;
/// only `warning`/`critical` zones are logged above `ok` severity.
pub fn probe_context(
    store: &mut Store,
    instance_id: &InstanceId,
    report: ContextUsageReport,
    now: DateTime<Utc>,
) -> Result<ContextProbeOutcome, StoreError> {
    store.update_context_usage(instance_id, report.percent, report.used, report.total, now)?;
    let usage = store.state().sessions.get(instance_id)?.context_usage;
    let zone = ContextZone::classify(usage);
    let project = store.state().sessions.get(instance_id)?.project.clone();

    let status = match zone {
        ContextZone::Normal | ContextZone::Monitoring => CheckStatus::Ok,
        ContextZone::Warning => CheckStatus::Warning,
        ContextZone::Critical | ContextZone::Mandatory => CheckStatus::Critical,
    };

    let probe_event = ambient::log(
        store,
        instance_id.clone(),
        "health_probe.context",
        serde_json::json!({ "usage": usage, "zone": zone.to_string() }),
        None,
        now,
    )?;

    store.record_health_check(
        project,
        CheckType::Context,
        status,
        serde_json::json!({ "usage": usage, "zone": zone.to_string(), "event_id": probe_event.event_id.to_string() }),
        None,
        None,
        now,
    )?;

    Ok(ContextProbeOutcome { zone, triggers_handoff: zone.triggers_handoff() })
}

/// Spawn sweep (spec §4.6 probe 1): sweep stall/abandonment transitions
/// and record one `health_checks` row per project with any `stalled`
/// spawn, `critical` when abandonment has also occurred.
///
/// A stalled spawn only becomes `abandoned` once it is also unreachable
/// through `process` (spec §4.5: idle past threshold *and* no live
/// process) — a recorded pid that's still alive just stays `stalled`.
///
/// Takes `store` behind its own lock (rather than an already-held guard)
/// because checking liveness means awaiting `process.is_alive` between the
/// candidate scan and applying the transition, and a `parking_lot::Mutex`
/// guard can't be held across an `.await` in a task another thread may run.
pub async fn probe_spawns(
    store: &Arc<Mutex<Store>>,
    process: &impl ProcessProbe,
    project: &str,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    store.lock().sweep_stalled_spawns(now)?;

    let candidates = store.lock().abandon_candidates(now);
    let mut dead = Vec::new();
    for (key, pid) in candidates {
        let alive = match pid {
            Some(pid) => process.is_alive(pid as i32).await.unwrap_or(true),
            None => false,
        };
        if !alive {
            dead.push(key);
        }
    }
    store.lock().apply_abandoned_spawns(&dead)?;

    let mut guard = store.lock();
    let stalled: Vec<_> = guard
        .state()
        .spawns
        .list(Some(project))
        .into_iter()
        .filter(|s| s.status == sv_core::SpawnStatus::Stalled)
        .map(|s| s.task_id.clone())
        .collect();
    let abandoned: Vec<_> = guard
        .state()
        .spawns
        .list(Some(project))
        .into_iter()
        .filter(|s| s.status == sv_core::SpawnStatus::Abandoned)
        .map(|s| s.task_id.clone())
        .collect();

    if stalled.is_empty() && abandoned.is_empty() {
        return Ok(());
    }

    let status = if abandoned.is_empty() { CheckStatus::Warning } else { CheckStatus::Critical };
    let action = if status == CheckStatus::Critical {
        Some("prompted owning PS to inspect abandoned spawns".to_string())
    } else {
        None
    };
    guard.record_health_check(
        project,
        CheckType::Spawn,
        status,
        serde_json::json!({ "stalled": stalled, "abandoned": abandoned }),
        action,
        None,
        now,
    )?;
    if status == CheckStatus::Critical {
        warn!(project, ?abandoned, "spawns abandoned");
    }
    Ok(())
}

/// Orphaned-work probe (spec §4.6 probe 3): a project with recent spawn
/// activity but no current-epic checkpoint is flagged `warning`.
pub fn probe_orphaned_work(
    store: &mut Store,
    project: &str,
    has_recent_spawn: bool,
    has_current_epic: bool,
    now: DateTime<Utc>,
) -> Result<Option<sv_core::HealthCheck>, StoreError> {
    if !has_recent_spawn || has_current_epic {
        return Ok(None);
    }
    let row = store.record_health_check(
        project,
        CheckType::OrphanedWork,
        CheckStatus::Warning,
        serde_json::json!({ "reason": "recent spawns with no current epic" }),
        None,
        None,
        now,
    )?;
    Ok(Some(row))
}

/// Instances whose `last_context_check` is stale relative to `interval_secs`
/// (spec §6 `health.sessions_needing_check`: lets the dispatcher avoid
/// redundant probes from two concurrent callers).
pub fn sessions_needing_check(store: &Store, interval_secs: i64, now: DateTime<Utc>) -> Vec<InstanceId> {
    store
        .state()
        .sessions
        .list_active(now)
        .into_iter()
        .filter(|s| match s.last_context_check {
            None => true,
            Some(last) => now.signed_duration_since(last).num_seconds() >= interval_secs,
        })
        .map(|s| s.instance_id.clone())
        .collect()
}

/// Run all three probes for `project`/`instance_id` in sequence (spec §4.6:
/// "within a session, probes are serialized"). Returns the context-probe
/// outcome so the caller can decide whether to trigger a handoff.
pub async fn run_sweep(
    store: &Arc<Mutex<Store>>,
    process: &impl ProcessProbe,
    instance_id: &InstanceId,
    project: &str,
    context: ContextUsageReport,
    has_recent_spawn: bool,
    has_current_epic: bool,
    now: DateTime<Utc>,
) -> Result<ContextProbeOutcome, StoreError> {
    probe_spawns(store, process, project, now).await?;
    let outcome = probe_context(&mut store.lock(), instance_id, context, now)?;
    probe_orphaned_work(&mut store.lock(), project, has_recent_spawn, has_current_epic, now)?;
    info!(project, zone = %outcome.zone, "health sweep complete");
    Ok(outcome)
}

#[cfg(test)]
#[path = "health_monitor_tests.rs"]
mod tests;
