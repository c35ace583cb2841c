// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance Registry (C3): supervisor session rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use sv_core::{CoreError, InstanceId, Session, DEFAULT_STALE_TTL_SECS};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SessionStore {
    by_instance: HashMap<InstanceId, Session>,
}

impl SessionStore {
    /// Register a new live session. Errors if `instance_id` is already
    /// registered, or if `project` already has a non-stale row (spec §3:
    /// "project unique for live rows").
    pub fn register(&mut self, session: Session, ttl_secs: u64) -> Result<(), CoreError> {
        if self.by_instance.contains_key(&session.instance_id) {
            return Err(CoreError::conflict(format!(
                "instance {} already registered",
                session.instance_id
            )));
        }
        let now = session.last_activity;
        if let Some(existing) = self.by_instance.values().find(|s| {
            s.project == session.project && !s.is_stale(ttl_secs, now)
        }) {
            return Err(CoreError::conflict(format!(
                "project {} already has a live session {}",
                session.project, existing.instance_id
            ))
            .with_recommendation("close the existing session before starting a new one"));
        }
        self.by_instance.insert(session.instance_id.clone(), session);
        Ok(())
    }

    pub fn heartbeat(&mut self, instance_id: &InstanceId, now: DateTime<Utc>) -> Result<(), CoreError> {
        let session = self.get_mut(instance_id)?;
        session.last_activity = now;
        Ok(())
    }

    /// Update context usage. `percent` is authoritative when present,
    /// otherwise computed from `used`/`total` (spec Open Questions §9).
    pub fn update_context_usage(
        &mut self,
        instance_id: &InstanceId,
        percent: Option<f64>,
        used: Option<u64>,
        total: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let session = self.get_mut(instance_id)?;
        if let Some(total) = total {
            session.estimated_tokens_total = total;
        }
        if let Some(used) = used {
            session.estimated_tokens_used = used;
        }
        session.context_usage = match percent {
            Some(p) => p,
            None => {
                if session.estimated_tokens_total == 0 {
                    0.0
                } else {
                    session.estimated_tokens_used as f64 / session.estimated_tokens_total as f64
                }
            }
        };
        session.last_context_check = Some(now);
        Ok(())
    }

    /// Reset context usage to 0 after a successful handoff cycle (spec §4.7).
    pub fn reset_context_usage(&mut self, instance_id: &InstanceId) -> Result<(), CoreError> {
        let session = self.get_mut(instance_id)?;
        session.context_usage = 0.0;
        session.estimated_tokens_used = 0;
        Ok(())
    }

    pub fn close(&mut self, instance_id: &InstanceId) -> Result<Session, CoreError> {
        self.by_instance
            .remove(instance_id)
            .ok_or_else(|| CoreError::not_found(format!("instance {instance_id} not found")))
    }

    pub fn get(&self, instance_id: &InstanceId) -> Result<&Session, CoreError> {
        self.by_instance
            .get(instance_id)
            .ok_or_else(|| CoreError::not_found(format!("instance {instance_id} not found")))
    }

    fn get_mut(&mut self, instance_id: &InstanceId) -> Result<&mut Session, CoreError> {
        self.by_instance
            .get_mut(instance_id)
            .ok_or_else(|| CoreError::not_found(format!("instance {instance_id} not found")))
    }

    pub fn get_by_project(&self, project: &str) -> Option<&Session> {
        self.by_instance.values().find(|s| s.project == project)
    }

    /// Live (non-stale) sessions, ordered by instance id for determinism.
    pub fn list_active(&self, now: DateTime<Utc>) -> Vec<&Session> {
        let mut out: Vec<&Session> = self
            .by_instance
            .values()
            .filter(|s| !s.is_stale(DEFAULT_STALE_TTL_SECS, now))
            .collect();
        out.sort_by(|a, b| a.instance_id.as_str().cmp(b.instance_id.as_str()));
        out
    }

    /// Instance ids of rows stale as of `now` (spec §4.3 supplement:
    /// distinct from `list_active`, which filters without closing).
    pub fn stale(&self, ttl_secs: u64, now: DateTime<Utc>) -> Vec<InstanceId> {
        self.by_instance
            .values()
            .filter(|s| s.is_stale(ttl_secs, now))
            .map(|s| s.instance_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_instance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_instance.is_empty()
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
