// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handoff Orchestrator (C7): the five-step automated context-handoff
//! cycle, driven externally over a session's tmux channel (spec §4.7,
//! Design Notes: "model this as message passing to the PS's tmux channel,
//! not as in-process cancellation").
//!
//! Each step's `handoff_step` event is parented to the previous step's
//! event id, and the first step to the triggering context-probe event, so
//! the whole cycle reconstructs as one unbroken parent chain rooted at the
//! probe (spec §8 scenario 2: `events.chain` over the last step returns
//! `[probe, trigger, wait, clear, resume, verify]`). A second handoff
//! request for a session already mid-cycle is a no-op (spec §4.7
//! "Cancellation"), enforced by an in-flight guard keyed on `InstanceId`.

use crate::ambient;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use sv_adapters::TmuxChannel;
use sv_core::{CheckStatus, CheckType, EventId, InstanceId};
use sv_storage::{Store, StoreError};
use tracing::{error, info};

/// Handoff step identifiers, carried in `Aborted` and in the `handoff_step`
/// event payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Trigger,
    Wait,
    Clear,
    Resume,
    Verify,
}

sv_core::simple_display! {
    Stage {
        Trigger => "trigger",
        Wait => "wait",
        Clear => "clear",
        Resume => "resume",
        Verify => "verify",
    }
}

/// Outcome of a handoff attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffOutcome {
    Ok,
    /// A second request arrived while a cycle was already in flight for
    /// this session (spec §4.7 "Cancellation": idempotent no-op).
    AlreadyInFlight,
    Aborted { stage: Stage, reason: String },
}

/// Narrow surface the orchestrator needs beyond the tmux channel: where to
/// look for the handoff file and how long to wait/sleep at each step. Kept
/// as a trait so tests can run the cycle without real directory polling or
/// real sleeps.
#[async_trait::async_trait]
pub trait HandoffEnvironment: Send + Sync {
    /// True if a handoff file newer than `max_age` exists under the
    /// session's `.bmad/handoffs/` directory.
    async fn handoff_file_ready(&self, session: &str, max_age: Duration) -> bool;
    async fn sleep(&self, duration: Duration);
}

/// Real environment: polls the filesystem and sleeps for real.
pub struct SystemHandoffEnvironment {
    pub handoffs_dir: std::path::PathBuf,
}

#[async_trait::async_trait]
impl HandoffEnvironment for SystemHandoffEnvironment {
    async fn handoff_file_ready(&self, _session: &str, max_age: Duration) -> bool {
        let Ok(mut entries) = tokio::fs::read_dir(&self.handoffs_dir).await else {
            return false;
        };
        let now = std::time::SystemTime::now();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let Ok(meta) = entry.metadata().await else { continue };
            let Ok(modified) = meta.modified() else { continue };
            if now.duration_since(modified).map(|age| age <= max_age).unwrap_or(false) {
                return true;
            }
        }
        false
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Poll interval for step 2 ("Wait"), spec §4.7.
const WAIT_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Timeout for step 2, spec §4.7.
const WAIT_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// Step 3 ("Clear") sub-delays, spec §4.7.
const CLEAR_INTERRUPT_DELAY: Duration = Duration::from_secs(2);
const CLEAR_COMMAND_DELAY: Duration = Duration::from_secs(3);
/// Step 5 ("Verify") delay before the status query, spec §4.7.
const VERIFY_DELAY: Duration = Duration::from_secs(60);

pub struct HandoffOrchestrator<T: TmuxChannel, E: HandoffEnvironment> {
    tmux: T,
    env: E,
    in_flight: Arc<Mutex<HashSet<InstanceId>>>,
    clear_context_command: String,
}

impl<T: TmuxChannel, E: HandoffEnvironment> HandoffOrchestrator<T, E> {
    pub fn new(tmux: T, env: E, clear_context_command: impl Into<String>) -> Self {
        Self { tmux, env, in_flight: Arc::new(Mutex::new(HashSet::new())), clear_context_command: clear_context_command.into() }
    }

    /// Run the five-step cycle for `instance_id` over `session` (its tmux
    /// channel name). `probe_event_id` is the context probe that triggered
    /// this cycle (spec §8 scenario 2: the chain must root there); pass
    /// `None` for a manually-requested handoff.
    pub async fn run(
        &self,
        store: Arc<Mutex<Store>>,
        instance_id: &InstanceId,
        session: &str,
        probe_event_id: Option<EventId>,
    ) -> Result<HandoffOutcome, StoreError> {
        {
            let mut in_flight = self.in_flight.lock();
            if !in_flight.insert(instance_id.clone()) {
                return Ok(HandoffOutcome::AlreadyInFlight);
            }
        }
        let result = self.run_inner(&store, instance_id, session, probe_event_id).await;
        self.in_flight.lock().remove(instance_id);
        result
    }

    async fn run_inner(
        &self,
        store: &Arc<Mutex<Store>>,
        instance_id: &InstanceId,
        session: &str,
        probe_event_id: Option<EventId>,
    ) -> Result<HandoffOutcome, StoreError> {
        let now = Utc::now();
        let project = store.lock().state().sessions.get(instance_id)?.project.clone();

        // Each step parents to the previous step's event id, chaining the
        // whole cycle back to the triggering probe instead of fanning all
        // five out as siblings of it.
        let mut parent = probe_event_id;

        // Step 1: Trigger, with one retry (spec §4.7: "retry once on the
        // trigger step; no other step retries automatically").
        let mut trigger_attempts = 0;
        loop {
            trigger_attempts += 1;
            let trigger_text = format!(
                "Please create a handoff file at .bmad/handoffs/handoff-{}.md summarizing current work, completed items, next steps, critical state, blockers, and notes.",
                now.format("%Y-%m-%d-%H-%M")
            );
            match self.tmux.send_keys(session, &trigger_text).await {
                Ok(()) => break,
                Err(err) if trigger_attempts < 2 => {
                    info!(%instance_id, error = %err, "handoff trigger failed, retrying once");
                    continue;
                }
                Err(err) => {
                    return self.abort(store, instance_id, &project, parent, Stage::Trigger, err.to_string(), now).await;
                }
            }
        }
        parent = Some(self.emit_step(store, instance_id, parent, Stage::Trigger, now)?);

        // Step 2: Wait for the handoff file.
        let deadline = std::time::Instant::now() + WAIT_TIMEOUT;
        loop {
            if self.env.handoff_file_ready(session, Duration::from_secs(5 * 60)).await {
                break;
            }
            if std::time::Instant::now() >= deadline {
                return self
                    .abort(store, instance_id, &project, parent, Stage::Wait, "handoff file did not appear within 5 minutes".into(), now)
                    .await;
            }
            self.env.sleep(WAIT_POLL_INTERVAL).await;
        }
        parent = Some(self.emit_step(store, instance_id, parent, Stage::Wait, now)?);

        // Step 3: Clear — interrupt, wait, clear-context command, wait.
        if let Err(err) = self.tmux.send_raw_key(session, "C-c").await {
            return self.abort(store, instance_id, &project, parent, Stage::Clear, err.to_string(), now).await;
        }
        self.env.sleep(CLEAR_INTERRUPT_DELAY).await;
        if let Err(err) = self.tmux.send_keys(session, &self.clear_context_command).await {
            return self.abort(store, instance_id, &project, parent, Stage::Clear, err.to_string(), now).await;
        }
        self.env.sleep(CLEAR_COMMAND_DELAY).await;
        parent = Some(self.emit_step(store, instance_id, parent, Stage::Clear, now)?);

        // Step 4: Resume.
        let resume_text = "Read the most recent handoff file under .bmad/handoffs/ and continue from it.";
        if let Err(err) = self.tmux.send_keys(session, resume_text).await {
            return self.abort(store, instance_id, &project, parent, Stage::Resume, err.to_string(), now).await;
        }
        parent = Some(self.emit_step(store, instance_id, parent, Stage::Resume, now)?);

        // Step 5: Verify.
        self.env.sleep(VERIFY_DELAY).await;
        if let Err(err) = self.tmux.send_keys(session, "Please confirm you have resumed from the handoff.").await {
            return self.abort(store, instance_id, &project, parent, Stage::Verify, err.to_string(), now).await;
        }
        let pane = self.tmux.capture_pane(session, 100).await.unwrap_or_default();
        if !confirms_resumption(&pane) {
            return self
                .abort(store, instance_id, &project, parent, Stage::Verify, "status query did not confirm resumption".into(), now)
                .await;
        }
        self.emit_step(store, instance_id, parent, Stage::Verify, now)?;

        let mut guard = store.lock();
        guard.reset_context_usage(instance_id)?;
        guard.record_health_check(
            project,
            CheckType::Handoff,
            CheckStatus::Ok,
            serde_json::json!({ "instance_id": instance_id.as_str() }),
            Some("handoff cycle completed".into()),
            None,
            now,
        )?;
        info!(%instance_id, "handoff cycle succeeded");
        Ok(HandoffOutcome::Ok)
    }

    /// Emit one `handoff_step` event parented to `parent` (the previous
    /// step's event, or the triggering probe for the first step) and
    /// return its event id so the caller can chain the next step to it.
    fn emit_step(
        &self,
        store: &Arc<Mutex<Store>>,
        instance_id: &InstanceId,
        parent: Option<EventId>,
        stage: Stage,
        now: DateTime<Utc>,
    ) -> Result<EventId, StoreError> {
        let event = ambient::log(
            &mut store.lock(),
            instance_id.clone(),
            "handoff_step",
            serde_json::json!({ "stage": stage.to_string() }),
            parent,
            now,
        )?;
        Ok(event.event_id)
    }

    async fn abort(
        &self,
        store: &Arc<Mutex<Store>>,
        instance_id: &InstanceId,
        project: &str,
        parent: Option<EventId>,
        stage: Stage,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<HandoffOutcome, StoreError> {
        error!(%instance_id, %stage, %reason, "handoff cycle aborted");
        let mut guard = store.lock();
        ambient::log(
            &mut guard,
            instance_id.clone(),
            "handoff_step",
            serde_json::json!({ "stage": stage.to_string(), "aborted": true, "reason": reason }),
            parent,
            now,
        )?;
        guard.record_health_check(
            project,
            CheckType::Handoff,
            CheckStatus::Critical,
            serde_json::json!({ "stage": stage.to_string(), "reason": reason }),
            Some("Manual intervention required".into()),
            None,
            now,
        )?;
        Ok(HandoffOutcome::Aborted { stage, reason })
    }
}

/// A status-query reply counts as confirming resumption if it mentions the
/// handoff or shows ongoing work rather than a blank/errored pane.
fn confirms_resumption(pane: &str) -> bool {
    let lower = pane.to_lowercase();
    !lower.trim().is_empty() && (lower.contains("resum") || lower.contains("handoff") || lower.contains("continu"))
}

#[cfg(test)]
#[path = "handoff_tests.rs"]
mod tests;
