//! Session registry (C3) lifecycle via the CLI.

use crate::prelude::*;

fn init(project: &Project, handle: &str) -> String {
    project
        .sv()
        .args(&["session", "init", "demo", "--instance-type", "ps", "--transport", "cli", "--handle", handle])
        .passes()
        .stdout()
}

#[test]
fn init_heartbeat_close_round_trip() {
    let project = Project::empty();
    let instance_id = init(&project, "tmux:demo");

    project.sv().args(&["session", "heartbeat", &instance_id]).passes();
    project.sv().args(&["session", "context", &instance_id, "--percent", "0.42"]).passes();
    project.sv().args(&["session", "close", &instance_id]).passes();
}

#[test]
fn list_active_reflects_initialized_sessions_and_hides_closed_ones() {
    let project = Project::empty();
    let a = init(&project, "tmux:a");
    let b = init(&project, "tmux:b");

    let active = project.sv().args(&["session", "list", "-o", "json"]).passes().json();
    let ids: Vec<String> =
        active.as_array().unwrap().iter().map(|s| s["instance_id"].as_str().unwrap().to_string()).collect();
    assert!(ids.contains(&a), "expected {a} in {ids:?}");
    assert!(ids.contains(&b), "expected {b} in {ids:?}");

    project.sv().args(&["session", "close", &a]).passes();
    let active = project.sv().args(&["session", "list", "-o", "json"]).passes().json();
    let ids: Vec<String> =
        active.as_array().unwrap().iter().map(|s| s["instance_id"].as_str().unwrap().to_string()).collect();
    assert!(!ids.contains(&a), "closed session should not be listed as active: {ids:?}");
    assert!(ids.contains(&b));
}

#[test]
fn heartbeat_on_unknown_instance_is_an_error() {
    let project = Project::empty();
    project.sv().args(&["session", "heartbeat", "ps-ghost-00000000"]).fails();
}
