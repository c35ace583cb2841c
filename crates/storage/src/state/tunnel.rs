// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tunnel Manager store (C9): CNAME / ingress-rule bookkeeping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use sv_core::{CnameId, CnameRecord, CoreError};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CnameStore {
    by_id: HashMap<CnameId, CnameRecord>,
}

impl CnameStore {
    /// Create a new CNAME row. Errors if `hostname` is already mapped (spec
    /// §4.9: one ingress rule per hostname).
    pub fn create(&mut self, record: CnameRecord) -> Result<(), CoreError> {
        let hostname = record.hostname();
        if self.by_id.values().any(|r| r.hostname() == hostname) {
            return Err(CoreError::conflict(format!("hostname {hostname} already has a tunnel route")));
        }
        self.by_id.insert(record.id.clone(), record);
        Ok(())
    }

    /// Insert an already-validated record verbatim, as replayed from the WAL.
    pub fn replay_created(&mut self, record: CnameRecord) {
        self.by_id.insert(record.id.clone(), record);
    }

    /// Remove by id, as replayed from a `CnameDeleted` entry.
    pub fn replay_deleted(&mut self, id: &CnameId) {
        self.by_id.remove(id);
    }

    pub fn get(&self, id: &CnameId) -> Result<&CnameRecord, CoreError> {
        self.by_id.get(id).ok_or_else(|| CoreError::not_found(format!("cname {id} not found")))
    }

    pub fn get_by_hostname(&self, hostname: &str) -> Option<&CnameRecord> {
        self.by_id.values().find(|r| r.hostname() == hostname)
    }

    pub fn delete(&mut self, id: &CnameId) -> Result<CnameRecord, CoreError> {
        self.by_id.remove(id).ok_or_else(|| CoreError::not_found(format!("cname {id} not found")))
    }

    /// Rows for `project`, or all rows when `project` is `None`, ordered by
    /// hostname for determinism.
    pub fn list(&self, project: Option<&str>) -> Vec<&CnameRecord> {
        let mut out: Vec<&CnameRecord> = self
            .by_id
            .values()
            .filter(|r| match project {
                Some(want) => r.project == want,
                None => true,
            })
            .collect();
        out.sort_by_key(|r| r.hostname());
        out
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
#[path = "tunnel_tests.rs"]
mod tests;
