// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sv_core::ErrorKind;

fn id(instance: &str) -> InstanceId {
    InstanceId::new(instance).unwrap()
}

#[test]
fn root_event_has_zero_depth_and_self_root() {
    let mut store = EventStore::default();
    let now = Utc::now();
    let event = store
        .append(id("ps-a"), "decision", serde_json::json!({"n": 1}), None, now)
        .unwrap();
    assert_eq!(event.depth, 0);
    assert_eq!(event.root_uuid, event.event_id);
    assert_eq!(event.sequence_num, 1);
}

#[test]
fn child_inherits_root_and_increments_depth() {
    let mut store = EventStore::default();
    let now = Utc::now();
    let root = store.append(id("ps-a"), "decision", serde_json::json!({}), None, now).unwrap();
    let child = store
        .append(id("ps-a"), "followup", serde_json::json!({}), Some(root.event_id.clone()), now)
        .unwrap();
    assert_eq!(child.depth, 1);
    assert_eq!(child.root_uuid, root.root_uuid);
    assert_eq!(child.sequence_num, 2);
}

#[test]
fn append_rejects_missing_parent() {
    let mut store = EventStore::default();
    let now = Utc::now();
    let bogus = sv_core::EventId::new();
    let err = store
        .append(id("ps-a"), "followup", serde_json::json!({}), Some(bogus), now)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[test]
fn get_parent_chain_is_root_first() {
    let mut store = EventStore::default();
    let now = Utc::now();
    let root = store.append(id("ps-a"), "a", serde_json::json!({}), None, now).unwrap();
    let mid = store
        .append(id("ps-a"), "b", serde_json::json!({}), Some(root.event_id.clone()), now)
        .unwrap();
    let leaf = store
        .append(id("ps-a"), "c", serde_json::json!({}), Some(mid.event_id.clone()), now)
        .unwrap();

    let chain = store.get_parent_chain(&leaf.event_id, 1000).unwrap();
    let types: Vec<&str> = chain.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types, vec!["a", "b", "c"]);
}

#[test]
fn get_children_orders_by_timestamp_then_sequence() {
    let mut store = EventStore::default();
    let now = Utc::now();
    let root = store.append(id("ps-a"), "root", serde_json::json!({}), None, now).unwrap();
    let c1 = store
        .append(id("ps-a"), "c1", serde_json::json!({}), Some(root.event_id.clone()), now)
        .unwrap();
    let c2 = store
        .append(id("ps-a"), "c2", serde_json::json!({}), Some(root.event_id.clone()), now)
        .unwrap();

    let children = store.get_children(&root.event_id);
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].event_id, c1.event_id);
    assert_eq!(children[1].event_id, c2.event_id);
}

#[test]
fn get_subtree_collects_descendants_bounded_by_depth() {
    let mut store = EventStore::default();
    let now = Utc::now();
    let root = store.append(id("ps-a"), "root", serde_json::json!({}), None, now).unwrap();
    let mid = store
        .append(id("ps-a"), "mid", serde_json::json!({}), Some(root.event_id.clone()), now)
        .unwrap();
    let _leaf = store
        .append(id("ps-a"), "leaf", serde_json::json!({}), Some(mid.event_id.clone()), now)
        .unwrap();

    let shallow = store.get_subtree(&root.event_id, 1).unwrap();
    assert_eq!(shallow.len(), 2); // root + mid, leaf excluded

    let full = store.get_subtree(&root.event_id, 10).unwrap();
    assert_eq!(full.len(), 3);
}

#[test]
fn get_recent_returns_newest_first_and_is_capped() {
    let mut store = EventStore::default();
    let now = Utc::now();
    for i in 0..5 {
        store
            .append(id("ps-a"), format!("evt-{i}"), serde_json::json!({}), None, now)
            .unwrap();
    }
    let recent = store.get_recent(&id("ps-a"), 2);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].event_type, "evt-4");
    assert_eq!(recent[1].event_type, "evt-3");
}

#[test]
fn get_recent_clamps_limit_to_max() {
    let mut store = EventStore::default();
    let now = Utc::now();
    store.append(id("ps-a"), "only", serde_json::json!({}), None, now).unwrap();
    let recent = store.get_recent(&id("ps-a"), 10_000);
    assert_eq!(recent.len(), 1);
}

#[test]
fn events_for_distinct_instances_do_not_interleave() {
    let mut store = EventStore::default();
    let now = Utc::now();
    store.append(id("ps-a"), "a1", serde_json::json!({}), None, now).unwrap();
    store.append(id("ps-b"), "b1", serde_json::json!({}), None, now).unwrap();
    assert_eq!(store.get_recent(&id("ps-a"), 10).len(), 1);
    assert_eq!(store.get_recent(&id("ps-b"), 10).len(), 1);
    assert_eq!(store.len(), 2);
}
