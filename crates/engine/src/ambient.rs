// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Logger (C2): an ambient parent-id context over `Store::log_event`,
//! plus sanitization before insert.
//!
//! The context is task-local (spec §4.2: "a per-logical-task stack"), not a
//! global: parallel sibling tasks on the same tokio runtime must not leak
//! parent ids into each other. `tokio::task_local!` gives exactly that —
//! one stack per task, inherited into `tokio::spawn`ed children only when
//! explicitly carried across the spawn boundary.

use chrono::{DateTime, Utc};
use sv_core::{redact_value, truncate_message, Event, EventId, InstanceId};
use sv_storage::{Store, StoreError};

tokio::task_local! {
    static PARENT_STACK: std::cell::RefCell<Vec<EventId>>;
}

/// Read-only accessor for diagnostics/tests (SPEC_FULL.md §4.2 supplement).
pub fn current_parent() -> Option<EventId> {
    PARENT_STACK.try_with(|stack| stack.borrow().last().cloned()).unwrap_or(None)
}

/// Run `f` with `parent` pushed onto the ambient stack for the duration of
/// the call. Nested calls chain: the innermost `withParent` wins.
pub async fn with_parent<F, Fut, T>(parent: EventId, f: F) -> T
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = T>,
{
    match PARENT_STACK.try_with(|stack| stack.borrow().clone()) {
        Ok(existing) => {
            let mut stack = existing;
            stack.push(parent);
            PARENT_STACK.scope(std::cell::RefCell::new(stack), f()).await
        }
        Err(_) => PARENT_STACK.scope(std::cell::RefCell::new(vec![parent]), f()).await,
    }
}

/// Log a single event, sanitizing `event_data` and truncating any string
/// field longer than [`sv_core::MAX_MESSAGE_LEN`] first (spec §4.2 (c)).
/// `parent` overrides the ambient parent when given; otherwise the current
/// top of the task-local stack is used, if any.
pub fn log(
    store: &mut Store,
    instance_id: InstanceId,
    event_type: impl Into<String>,
    mut payload: serde_json::Value,
    parent: Option<EventId>,
    now: DateTime<Utc>,
) -> Result<Event, StoreError> {
    redact_value(&mut payload);
    truncate_string_fields(&mut payload);
    let parent = parent.or_else(current_parent);
    store.log_event(instance_id, event_type, payload, parent, now)
}

fn truncate_string_fields(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::String(s) => {
            let truncated = truncate_message(s);
            if truncated != *s {
                *s = truncated;
            }
        }
        serde_json::Value::Object(map) => map.values_mut().for_each(truncate_string_fields),
        serde_json::Value::Array(items) => items.iter_mut().for_each(truncate_string_fields),
        _ => {}
    }
}

#[cfg(test)]
#[path = "ambient_tests.rs"]
mod tests;
