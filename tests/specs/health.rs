//! Health Monitor audit trail (C6) via the CLI.

use crate::prelude::*;

#[test]
fn record_then_query_stalled_spawns() {
    let project = Project::empty();
    project
        .sv()
        .args(&["spawn", "register", "demo", "task-1", "implementer", "do it", "/tmp/out.log"])
        .passes();

    project
        .sv()
        .args(&["health", "record", "demo", "spawn", "warning", "\"no output in 15m\""])
        .passes();

    // The spawn itself is still `running`; health recording doesn't
    // mutate spawn state on its own, so there should be nothing stalled yet.
    let stalled = project.sv().args(&["health", "stalled", "demo", "-o", "json"]).passes().json();
    assert_eq!(stalled.as_array().unwrap().len(), 0);
}

#[test]
fn sessions_needing_check_includes_a_freshly_initialized_session() {
    let project = Project::empty();
    let instance_id = project
        .sv()
        .args(&["session", "init", "demo", "--instance-type", "ps", "--transport", "cli", "--handle", "tmux:demo"])
        .passes()
        .stdout();

    let due = project.sv().args(&["health", "needing-check", "-o", "json"]).passes().json();
    let ids: Vec<String> = due.as_array().unwrap().iter().map(|v| v.as_str().unwrap().to_string()).collect();
    assert!(ids.contains(&instance_id));
}
