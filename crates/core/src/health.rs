// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health check audit row and the graduated context-usage zone policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier for a health_checks audit row.
    pub struct HealthCheckId("hck-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    Spawn,
    Context,
    Handoff,
    OrphanedWork,
    Tunnel,
}

crate::simple_display! {
    CheckType {
        Spawn => "spawn",
        Context => "context",
        Handoff => "handoff",
        OrphanedWork => "orphaned_work",
        Tunnel => "tunnel",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    Warning,
    Critical,
}

crate::simple_display! {
    CheckStatus {
        Ok => "ok",
        Warning => "warning",
        Critical => "critical",
    }
}

/// Append-only audit row produced by a health probe or the handoff cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub id: HealthCheckId,
    pub project: String,
    pub check_time: DateTime<Utc>,
    pub check_type: CheckType,
    pub status: CheckStatus,
    pub details: serde_json::Value,
    pub action_taken: Option<String>,
    pub ps_response: Option<String>,
}

/// Graduated context-usage threshold policy (spec §4.7). Fixed design
/// decision, not a runtime knob — boundaries are inclusive on the low
/// end per the table in spec §4.7 ("<30%", "30-50%", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextZone {
    Normal,
    Monitoring,
    Warning,
    Critical,
    Mandatory,
}

crate::simple_display! {
    ContextZone {
        Normal => "normal",
        Monitoring => "monitoring",
        Warning => "warning",
        Critical => "critical",
        Mandatory => "mandatory",
    }
}

impl ContextZone {
    /// Classify a context-usage fraction in `[0.0, 1.0]` into a zone.
    pub fn classify(usage: f64) -> Self {
        if usage >= 0.85 {
            ContextZone::Mandatory
        } else if usage >= 0.70 {
            ContextZone::Critical
        } else if usage >= 0.50 {
            ContextZone::Warning
        } else if usage >= 0.30 {
            ContextZone::Monitoring
        } else {
            ContextZone::Normal
        }
    }

    /// Largest task (in tokens) a PS may accept while in this zone, or
    /// `None` for "any task" / "nothing".
    pub fn max_task_tokens(self) -> Option<u64> {
        match self {
            ContextZone::Normal | ContextZone::Monitoring => None,
            ContextZone::Warning => Some(5_000),
            ContextZone::Critical => Some(2_000),
            ContextZone::Mandatory => Some(0),
        }
    }

    /// Whether this zone should trigger an automatic handoff.
    pub fn triggers_handoff(self) -> bool {
        matches!(self, ContextZone::Mandatory)
    }
}
