// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn session_initialize_roundtrips_through_json() {
    let req = Request::SessionInitialize {
        project: "consilio".into(),
        instance_type: InstanceType::Ps,
        transport: SessionTransport::Cli,
        external_handle: "tmux:ps-consilio".into(),
    };
    let json = serde_json::to_string(&req).expect("serialize");
    let back: Request = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(req, back);
}

#[test]
fn events_log_tags_discriminant_as_op() {
    let req = Request::EventsLog {
        instance_id: InstanceId::new("ps-demo").unwrap(),
        event_type: "user_message".into(),
        payload: serde_json::json!({"text": "deploy"}),
        parent: None,
    };
    let value = serde_json::to_value(&req).expect("serialize");
    assert_eq!(value["op"], "events_log");
}

#[test]
fn update_context_usage_accepts_percent_or_used_total() {
    let percent_only = Request::SessionUpdateContextUsage {
        instance_id: InstanceId::new("ps-demo").unwrap(),
        percent: Some(0.87),
        used: None,
        total: None,
    };
    let used_total = Request::SessionUpdateContextUsage {
        instance_id: InstanceId::new("ps-demo").unwrap(),
        percent: None,
        used: Some(174_000),
        total: Some(200_000),
    };
    assert_ne!(percent_only, used_total);
}
