// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crate-wide error kind and the wire-facing error envelope (spec §7).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a failure, used by the daemon's dispatcher to
/// pick a response shape and by clients to decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Timeout,
    External,
    Unreachable,
    PermissionDenied,
    Internal,
}

crate::simple_display! {
    ErrorKind {
        NotFound => "not_found",
        Conflict => "conflict",
        Validation => "validation",
        Timeout => "timeout",
        External => "external",
        Unreachable => "unreachable",
        PermissionDenied => "permission_denied",
        Internal => "internal",
    }
}

/// A classified, client-facing error.
///
/// `recommendation` carries the operator-facing next step spec §7 calls
/// for on degraded-but-handled failures (e.g. "tunnel DNS create failed,
/// rolled back, retry once DNS provider is reachable").
#[derive(Debug, Error, Clone)]
#[error("{kind}: {message}")]
pub struct CoreError {
    pub kind: ErrorKind,
    pub message: String,
    pub recommendation: Option<String>,
}

impl CoreError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), recommendation: None }
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn external(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::External, message)
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unreachable, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionDenied, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

/// Wire-level error envelope: `{success: false, error, recommendation?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl From<&CoreError> for ErrorEnvelope {
    fn from(err: &CoreError) -> Self {
        Self {
            success: false,
            error: err.message.clone(),
            kind: err.kind,
            recommendation: err.recommendation.clone(),
        }
    }
}
