// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health Monitor store (C6): append-only probe audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use sv_core::{CheckStatus, CheckType, HealthCheck, HealthCheckId};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct HealthStore {
    by_id: HashMap<HealthCheckId, HealthCheck>,
    by_project: HashMap<String, Vec<HealthCheckId>>,
}

impl HealthStore {
    /// Append a probe result row (spec §4.6: health checks are append-only,
    /// never updated in place).
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &mut self,
        project: impl Into<String>,
        check_type: CheckType,
        status: CheckStatus,
        details: serde_json::Value,
        action_taken: Option<String>,
        ps_response: Option<String>,
        now: DateTime<Utc>,
    ) -> HealthCheck {
        let project = project.into();
        let row = HealthCheck {
            id: HealthCheckId::new(),
            project: project.clone(),
            check_time: now,
            check_type,
            status,
            details,
            action_taken,
            ps_response,
        };
        self.by_project.entry(project).or_default().push(row.id.clone());
        self.by_id.insert(row.id.clone(), row.clone());
        row
    }

    /// Insert an already-built row verbatim, as replayed from the WAL.
    pub fn replay(&mut self, row: HealthCheck) {
        self.by_project.entry(row.project.clone()).or_default().push(row.id.clone());
        self.by_id.insert(row.id.clone(), row);
    }

    /// Rows for `project`, newest first, bounded to `limit`.
    pub fn list_for_project(&self, project: &str, limit: usize) -> Vec<&HealthCheck> {
        self.by_project
            .get(project)
            .into_iter()
            .flatten()
            .rev()
            .take(limit)
            .filter_map(|id| self.by_id.get(id))
            .collect()
    }

    /// Most recent row of any type for `project`.
    pub fn latest_for_project(&self, project: &str) -> Option<&HealthCheck> {
        self.by_project.get(project)?.last().and_then(|id| self.by_id.get(id))
    }

    /// Most recent row of `check_type` for `project`.
    pub fn latest_of_type(&self, project: &str, check_type: CheckType) -> Option<&HealthCheck> {
        self.by_project
            .get(project)?
            .iter()
            .rev()
            .filter_map(|id| self.by_id.get(id))
            .find(|row| row.check_type == check_type)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
