// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Logger store (C1): append-only causal lineage log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use sv_core::{CoreError, Event, EventId, InstanceId, MAX_CHAIN_DEPTH, MAX_RECENT_LIMIT};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EventStore {
    by_id: HashMap<EventId, Event>,
    /// parent -> children, in append order.
    children: HashMap<EventId, Vec<EventId>>,
    /// instance -> events, in append (sequence_num) order.
    by_instance: HashMap<InstanceId, Vec<EventId>>,
    next_seq: u64,
}

impl EventStore {
    /// Append a new event, deriving `depth`/`root_uuid` from `parent_uuid`
    /// (spec §4.1: "the insert path derives depth and root_uuid and rejects
    /// inserts that would close a cycle, bounded at 1000 hops").
    pub fn append(
        &mut self,
        instance_id: InstanceId,
        event_type: impl Into<String>,
        event_data: serde_json::Value,
        parent_uuid: Option<EventId>,
        now: DateTime<Utc>,
    ) -> Result<Event, CoreError> {
        let event_id = EventId::new();
        let (depth, root_uuid) = match parent_uuid {
            None => (0, event_id.clone()),
            Some(ref parent) => {
                let parent_event = self
                    .by_id
                    .get(parent)
                    .ok_or_else(|| CoreError::not_found(format!("parent event {parent} not found")))?;
                self.assert_acyclic(parent)?;
                let depth = parent_event.depth + 1;
                if depth > MAX_CHAIN_DEPTH {
                    return Err(CoreError::validation(format!(
                        "parent chain exceeds max depth {MAX_CHAIN_DEPTH}"
                    )));
                }
                (depth, parent_event.root_uuid.clone())
            }
        };

        self.next_seq += 1;
        let event = Event {
            event_id: event_id.clone(),
            instance_id: instance_id.clone(),
            event_type: event_type.into(),
            sequence_num: self.next_seq,
            timestamp: now,
            event_data,
            parent_uuid: parent_uuid.clone(),
            root_uuid,
            depth,
        };

        if let Some(parent) = parent_uuid {
            self.children.entry(parent).or_default().push(event_id.clone());
        }
        self.by_instance.entry(instance_id).or_default().push(event_id.clone());
        self.by_id.insert(event_id, event.clone());
        Ok(event)
    }

    /// Walk from `parent` to its root, bounded at `MAX_CHAIN_DEPTH` hops.
    /// Guards against corrupted state forming a loop; a fresh `event_id`
    /// cannot itself appear in an existing chain, so this can only trip on
    /// a pre-existing inconsistency.
    fn assert_acyclic(&self, parent: &EventId) -> Result<(), CoreError> {
        let mut seen = HashSet::new();
        let mut cursor = Some(parent.clone());
        let mut hops = 0u32;
        while let Some(id) = cursor {
            if !seen.insert(id.clone()) {
                return Err(CoreError::validation("cycle detected in event parent chain"));
            }
            hops += 1;
            if hops > MAX_CHAIN_DEPTH {
                return Err(CoreError::validation(format!(
                    "parent chain exceeds max depth {MAX_CHAIN_DEPTH}"
                )));
            }
            cursor = self.by_id.get(&id).and_then(|e| e.parent_uuid.clone());
        }
        Ok(())
    }

    /// Insert an already-validated event verbatim, as replayed from the WAL.
    /// Skips cycle/depth checks — the WAL only ever holds entries that
    /// passed [`EventStore::append`] when they were first written.
    pub fn replay(&mut self, event: Event) {
        self.next_seq = self.next_seq.max(event.sequence_num);
        if let Some(parent) = &event.parent_uuid {
            self.children.entry(parent.clone()).or_default().push(event.event_id.clone());
        }
        self.by_instance.entry(event.instance_id.clone()).or_default().push(event.event_id.clone());
        self.by_id.insert(event.event_id.clone(), event);
    }

    pub fn get(&self, event_id: &EventId) -> Result<&Event, CoreError> {
        self.by_id
            .get(event_id)
            .ok_or_else(|| CoreError::not_found(format!("event {event_id} not found")))
    }

    /// Root-first chain from the root down to (and including) `event_id`,
    /// bounded at `max_depth.min(MAX_CHAIN_DEPTH)` hops.
    pub fn get_parent_chain(&self, event_id: &EventId, max_depth: u32) -> Result<Vec<Event>, CoreError> {
        let bound = max_depth.min(MAX_CHAIN_DEPTH);
        let mut chain = Vec::new();
        let mut cursor = Some(self.get(event_id)?.clone());
        let mut hops = 0u32;
        while let Some(event) = cursor {
            let parent = event.parent_uuid.clone();
            chain.push(event);
            if parent.is_none() {
                break;
            }
            hops += 1;
            if hops > bound {
                return Err(CoreError::validation(format!(
                    "parent chain exceeds requested depth {bound}"
                )));
            }
            cursor = parent.map(|p| self.get(&p)).transpose()?.cloned();
        }
        chain.reverse();
        Ok(chain)
    }

    /// Direct children, ordered by (timestamp, sequence_num).
    pub fn get_children(&self, event_id: &EventId) -> Vec<Event> {
        let mut out: Vec<Event> = self
            .children
            .get(event_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect();
        out.sort_by(|a, b| (a.timestamp, a.sequence_num).cmp(&(b.timestamp, b.sequence_num)));
        out
    }

    /// Full descendant subtree of `root_uuid`, breadth-first, bounded at
    /// `max_depth` relative levels, ordered by (depth, timestamp).
    pub fn get_subtree(&self, root_uuid: &EventId, max_depth: u32) -> Result<Vec<Event>, CoreError> {
        let root = self.get(root_uuid)?.clone();
        let mut out = vec![root];
        let mut frontier = vec![root_uuid.clone()];
        let mut level = 0u32;
        while level < max_depth && !frontier.is_empty() {
            let mut next_frontier = Vec::new();
            for id in &frontier {
                for child in self.get_children(id) {
                    next_frontier.push(child.event_id.clone());
                    out.push(child);
                }
            }
            frontier = next_frontier;
            level += 1;
        }
        out.sort_by(|a, b| (a.depth, a.timestamp).cmp(&(b.depth, b.timestamp)));
        Ok(out)
    }

    /// Most recent `limit` events for `instance_id`, newest first, capped at
    /// `MAX_RECENT_LIMIT`.
    pub fn get_recent(&self, instance_id: &InstanceId, limit: usize) -> Vec<Event> {
        let limit = limit.clamp(1, MAX_RECENT_LIMIT);
        let Some(ids) = self.by_instance.get(instance_id) else {
            return Vec::new();
        };
        ids.iter()
            .rev()
            .take(limit)
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
