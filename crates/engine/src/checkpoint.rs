// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint Engine (C4): work-state capture, resume-markdown generation,
//! paginated listing, and retention cleanup.

use chrono::{DateTime, Utc};
use sv_adapters::GitProbe;
use sv_core::{
    Checkpoint, CheckpointId, CheckpointKind, Environment, GitStatus, InstanceId, WorkState,
    DEFAULT_RETENTION_DAYS,
};
use sv_storage::{Store, StoreError};
use tracing::warn;

/// Everything the caller knows about the session being checkpointed that
/// the store itself has no way to observe (project identity, cwd).
/// `files_modified` is derived from the git probe's working-tree scan, but
/// `current_epic`, `last_commands`, and `prd_status` have no wire-level
/// source in this dispatch surface (spec §6's `checkpoint.create` only
/// carries `instance`, `kind`, `context_window_percent`) and are left
/// empty/`None`; a richer BMAD integration would populate them from the
/// workspace.
pub struct CaptureContext {
    pub project: String,
    pub working_directory: String,
    pub hostname: String,
}

/// Capture a new checkpoint, degrading `git_status` to its default when the
/// working tree isn't a git repo or `git` is unavailable (spec §4.4).
pub async fn capture(
    store: &mut Store,
    git: &impl GitProbe,
    instance_id: InstanceId,
    kind: CheckpointKind,
    context_window_percent: f64,
    ctx: CaptureContext,
    now: DateTime<Utc>,
) -> Result<Checkpoint, StoreError> {
    let git_status = match git.status(&ctx.working_directory).await {
        Ok(status) => status,
        Err(err) => {
            warn!(working_directory = %ctx.working_directory, error = %err, "git status unavailable, degrading to empty");
            GitStatus::default()
        }
    };

    let work_state = WorkState {
        current_epic: None,
        files_modified: git_status.files.clone(),
        git_status,
        last_commands: Vec::new(),
        prd_status: None,
        environment: Environment {
            project: ctx.project,
            working_directory: ctx.working_directory,
            hostname: ctx.hostname,
        },
        snapshot_at: now,
    };

    store.create_checkpoint(instance_id, kind, context_window_percent, work_state, serde_json::json!({}), now)
}

/// Retrieve a checkpoint plus its generated resume-instructions document
/// (spec §4.4: "a markdown-formatted, numbered action list").
pub fn retrieve(store: &Store, checkpoint_id: &CheckpointId) -> Result<(WorkState, String), StoreError> {
    let checkpoint = store.state().checkpoints.get(checkpoint_id)?;
    let markdown = resume_markdown(checkpoint);
    Ok((checkpoint.work_state.clone(), markdown))
}

/// Build the numbered resume-instructions markdown from a captured
/// `WorkState` (spec §4.4: status summary, files touched, git snapshot,
/// next steps, recent commands).
pub fn resume_markdown(checkpoint: &Checkpoint) -> String {
    let ws = &checkpoint.work_state;
    let mut out = String::new();
    out.push_str(&format!("# Resume — {}\n\n", checkpoint.checkpoint_id));
    out.push_str("1. **Status summary**\n");
    match &ws.current_epic {
        Some(epic) => out.push_str(&format!("   - Epic `{}`: {} ({}s)\n", epic.id, epic.status, epic.duration_secs)),
        None => out.push_str("   - No active epic recorded.\n"),
    }
    out.push_str(&format!("2. **Files touched** ({} changed)\n", ws.files_modified.len()));
    for change in &ws.files_modified {
        out.push_str(&format!("   - `{}` ({:?}, {} lines)\n", change.path, change.status, change.lines_changed));
    }
    out.push_str("3. **Git snapshot**\n");
    out.push_str(&format!(
        "   - branch `{}`, {} staged / {} unstaged / {} untracked, {} commits\n",
        ws.git_status.branch, ws.git_status.staged, ws.git_status.unstaged, ws.git_status.untracked, ws.git_status.commit_count
    ));
    out.push_str("4. **Next steps**\n");
    match &ws.prd_status {
        Some(prd) => out.push_str(&format!(
            "   - PRD `{}`, next epic: {}\n",
            prd.version,
            prd.next_epic.as_deref().unwrap_or("none")
        )),
        None => out.push_str("   - No PRD status recorded.\n"),
    }
    out.push_str("5. **Recent commands**\n");
    if ws.last_commands.is_empty() {
        out.push_str("   - none recorded\n");
    } else {
        for cmd in &ws.last_commands {
            out.push_str(&format!("   - `{cmd}`\n"));
        }
    }
    out
}

/// `list(instance, kind?, limit, offset)` pagination (SPEC_FULL.md §4.4
/// supplement), ordered by `sequence_num` descending.
pub fn list(
    store: &Store,
    instance_id: &InstanceId,
    kind: Option<CheckpointKind>,
    limit: usize,
    offset: usize,
) -> Vec<CheckpointId> {
    let mut rows = store.state().checkpoints.list(instance_id);
    rows.sort_by(|a, b| b.sequence_num.cmp(&a.sequence_num));
    rows.into_iter()
        .filter(|c| match kind {
            Some(k) => c.kind == k,
            None => true,
        })
        .skip(offset)
        .take(limit)
        .map(|c| c.checkpoint_id.clone())
        .collect()
}

/// Retention cleanup (spec §4.4): drop checkpoints older than
/// `retention_days`, reporting the count removed. `freed_bytes` is
/// estimated from the serialized size of each pruned row, since the store
/// itself doesn't track on-disk byte accounting per row.
pub fn cleanup(store: &mut Store, now: DateTime<Utc>, retention_days: Option<u32>) -> Result<(usize, u64), StoreError> {
    let retention_days = retention_days.unwrap_or(DEFAULT_RETENTION_DAYS);
    let expired = store.state().checkpoints.expired(now, retention_days);
    let freed_bytes: u64 = expired
        .iter()
        .filter_map(|id| store.state().checkpoints.get(id).ok())
        .map(|c| serde_json::to_vec(c).map(|b| b.len() as u64).unwrap_or(0))
        .sum();
    let removed = store.cleanup_checkpoints(now, retention_days)?;
    Ok((removed, freed_bytes))
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
