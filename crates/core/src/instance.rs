// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor session identity: instance ids, instance type, and transport.
//!
//! `InstanceId` identifies a live project supervisor (or meta-supervisor)
//! session. Unlike the other entity ids in this crate it is caller-supplied
//! and opaque (spec: "globally unique string"), so it is kept as a thin
//! validated newtype around `String` rather than a [`crate::id::IdBuf`].

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique identifier for a supervisor session (PS or MS).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(String);

/// Error returned when an instance id fails validation.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum InstanceIdError {
    #[error("instance id must not be empty")]
    Empty,
}

impl InstanceId {
    /// Validate and wrap a caller-supplied instance id.
    pub fn new(id: impl Into<String>) -> Result<Self, InstanceIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(InstanceIdError::Empty);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for InstanceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for InstanceId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Kind of instance participating in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceType {
    /// Project supervisor — owns one project.
    Ps,
    /// Meta-supervisor — supervises the infrastructure itself.
    Ms,
}

crate::simple_display! {
    InstanceType {
        Ps => "PS",
        Ms => "MS",
    }
}

/// How the instance's underlying session is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionTransport {
    /// tmux-attached CLI session.
    Cli,
    /// SDK/browser-driven session.
    Sdk,
}

crate::simple_display! {
    SessionTransport {
        Cli => "cli",
        Sdk => "sdk",
    }
}

/// Default total token budget assumed for a session until reported
/// otherwise (spec: estimated_tokens_total default 200_000).
pub const DEFAULT_TOKEN_BUDGET: u64 = 200_000;

/// Default staleness TTL for the instance registry (spec: default 1h).
pub const DEFAULT_STALE_TTL_SECS: u64 = 3600;

/// A live project-supervisor (or meta-supervisor) session row in the
/// instance registry. Keyed by [`InstanceId`]; `project` is unique among
/// non-stale rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub instance_id: InstanceId,
    pub project: String,
    pub instance_type: InstanceType,
    pub transport: SessionTransport,
    /// tmux session name or browser session id.
    pub external_handle: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub last_activity: chrono::DateTime<chrono::Utc>,
    pub last_context_check: Option<chrono::DateTime<chrono::Utc>>,
    /// Fraction of the context window consumed, in `[0.0, 1.0]`.
    pub context_usage: f64,
    pub estimated_tokens_used: u64,
    pub estimated_tokens_total: u64,
}

impl Session {
    pub fn new(
        instance_id: InstanceId,
        project: impl Into<String>,
        instance_type: InstanceType,
        transport: SessionTransport,
        external_handle: impl Into<String>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            instance_id,
            project: project.into(),
            instance_type,
            transport,
            external_handle: external_handle.into(),
            started_at: now,
            last_activity: now,
            last_context_check: None,
            context_usage: 0.0,
            estimated_tokens_used: 0,
            estimated_tokens_total: DEFAULT_TOKEN_BUDGET,
        }
    }

    /// A row is stale when `last_activity` is older than `ttl_secs` as of `now`.
    pub fn is_stale(&self, ttl_secs: u64, now: chrono::DateTime<chrono::Utc>) -> bool {
        let age = now.signed_duration_since(self.last_activity);
        age.num_seconds() >= ttl_secs as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_instance_id() {
        assert_eq!(InstanceId::new(""), Err(InstanceIdError::Empty));
        assert_eq!(InstanceId::new("   "), Err(InstanceIdError::Empty));
    }

    #[test]
    fn accepts_nonempty_instance_id() {
        assert!(InstanceId::new("ps-consilio-1").is_ok());
    }

    #[test]
    fn session_goes_stale_past_ttl() {
        let start = chrono::Utc::now();
        let session = Session::new(
            InstanceId::new("ps-demo").unwrap(),
            "demo",
            InstanceType::Ps,
            SessionTransport::Cli,
            "tmux:ps-demo",
            start,
        );
        assert!(!session.is_stale(DEFAULT_STALE_TTL_SECS, start));
        let later = start + chrono::Duration::seconds(DEFAULT_STALE_TTL_SECS as i64 + 1);
        assert!(session.is_stale(DEFAULT_STALE_TTL_SECS, later));
    }
}
