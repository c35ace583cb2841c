// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance Registry (C3) lifecycle sweep: the Health Monitor's loop calls
//! `cleanup_stale` once per tick to close sessions that stopped
//! heartbeating, distinct from `list_active`'s non-destructive filter.

use chrono::{DateTime, Utc};
use sv_core::DEFAULT_STALE_TTL_SECS;
use sv_storage::{Store, StoreError};
use tracing::info;

/// Close every session stale as of `now`, using the default TTL. Returns
/// the number closed.
pub fn cleanup_stale(store: &mut Store, now: DateTime<Utc>) -> Result<usize, StoreError> {
    cleanup_stale_with_ttl(store, DEFAULT_STALE_TTL_SECS, now)
}

pub fn cleanup_stale_with_ttl(store: &mut Store, ttl_secs: u64, now: DateTime<Utc>) -> Result<usize, StoreError> {
    let closed = store.cleanup_stale_sessions(ttl_secs, now)?;
    if closed > 0 {
        info!(closed, "closed stale supervisor sessions");
    }
    Ok(closed)
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
