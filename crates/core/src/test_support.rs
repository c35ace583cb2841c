// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::event::{Event, EventId};
use crate::instance::InstanceId;
use chrono::Utc;
use serde_json::json;

/// Proptest strategies for core domain types.
pub mod strategies {
    use crate::health::ContextZone;
    use proptest::prelude::*;

    pub fn arb_usage_fraction() -> impl Strategy<Value = f64> {
        0.0f64..=1.0
    }

    pub fn arb_context_zone() -> impl Strategy<Value = ContextZone> {
        prop_oneof![
            Just(ContextZone::Normal),
            Just(ContextZone::Monitoring),
            Just(ContextZone::Warning),
            Just(ContextZone::Critical),
            Just(ContextZone::Mandatory),
        ]
    }
}

/// Build a root event (no parent) for a given instance.
pub fn root_event(instance_id: &str, event_type: &str) -> Event {
    let id = EventId::new();
    Event {
        event_id: id.clone(),
        instance_id: InstanceId::new(instance_id).expect("nonempty test instance id"),
        event_type: event_type.to_string(),
        sequence_num: 1,
        timestamp: Utc::now(),
        event_data: json!({}),
        parent_uuid: None,
        root_uuid: id,
        depth: 0,
    }
}

/// Build a child event causally linked to `parent`.
pub fn child_event(parent: &Event, event_type: &str, sequence_num: u64) -> Event {
    Event {
        event_id: EventId::new(),
        instance_id: parent.instance_id.clone(),
        event_type: event_type.to_string(),
        sequence_num,
        timestamp: Utc::now(),
        event_data: json!({}),
        parent_uuid: Some(parent.event_id.clone()),
        root_uuid: parent.root_uuid.clone(),
        depth: parent.depth + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_event_inherits_root_and_increments_depth() {
        let root = root_event("ps-demo", "session_start");
        let child = child_event(&root, "spawn_created", 2);
        assert_eq!(child.root_uuid, root.event_id);
        assert_eq!(child.depth, 1);
        assert!(!child.is_root());
    }
}
