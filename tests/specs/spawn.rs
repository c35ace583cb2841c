//! Spawn Lifecycle Tracker (C5) via the CLI.

use crate::prelude::*;

#[test]
fn register_touch_complete_round_trip() {
    let project = Project::empty();

    project
        .sv()
        .args(&["spawn", "register", "demo", "task-1", "implementer", "do the thing", "/tmp/out.log"])
        .passes();
    project.sv().args(&["spawn", "touch", "demo", "task-1"]).passes();
    project.sv().args(&["spawn", "complete", "demo", "task-1", "0"]).passes();

    let spawns = project.sv().args(&["spawn", "list", "demo", "-o", "json"]).passes().json();
    let statuses: Vec<String> = spawns.as_array().unwrap().iter().map(|s| s["status"].as_str().unwrap().to_string()).collect();
    assert_eq!(statuses, vec!["completed"]);
}

#[test]
fn failed_exit_code_is_recorded_as_failed() {
    let project = Project::empty();
    project.sv().args(&["spawn", "register", "demo", "task-2", "implementer", "do it", "/tmp/out2.log"]).passes();
    project.sv().args(&["spawn", "complete", "demo", "task-2", "1"]).passes();

    let spawns = project.sv().args(&["spawn", "list", "demo", "--status", "failed", "-o", "json"]).passes().json();
    assert_eq!(spawns.as_array().unwrap().len(), 1);
}
