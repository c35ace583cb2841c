//! Checkpoint Engine (C4): capture, retrieval, listing.

use crate::prelude::*;

fn init(project: &Project) -> String {
    project
        .sv()
        .args(&["session", "init", "demo", "--instance-type", "ps", "--transport", "cli", "--handle", "tmux:demo"])
        .passes()
        .stdout()
}

#[test]
fn create_then_get_round_trip() {
    let project = Project::empty();
    let instance_id = init(&project);

    let checkpoint_id = project
        .sv()
        .args(&["checkpoint", "create", &instance_id, "--kind", "manual", "--percent", "55.0"])
        .passes()
        .stdout();

    let detail = project.sv().args(&["checkpoint", "get", &checkpoint_id, "-o", "json"]).passes().json();
    assert_eq!(detail["work_state"]["environment"]["project"].as_str().unwrap(), "demo");
    assert!(detail["resume_markdown"].as_str().unwrap().contains("Resume"));
}

#[test]
fn list_newest_first() {
    let project = Project::empty();
    let instance_id = init(&project);

    let first = project.sv().args(&["checkpoint", "create", &instance_id, "--percent", "10"]).passes().stdout();
    let second = project.sv().args(&["checkpoint", "create", &instance_id, "--percent", "20"]).passes().stdout();

    let ids = project.sv().args(&["checkpoint", "list", &instance_id, "-o", "json"]).passes().json();
    let ids: Vec<String> = ids.as_array().unwrap().iter().map(|v| v.as_str().unwrap().to_string()).collect();
    assert_eq!(ids, vec![second, first]);
}

#[test]
fn get_on_unknown_id_is_an_error() {
    Project::empty().sv().args(&["checkpoint", "get", "chk-ghost0000000000000"]).fails();
}

#[test]
fn degrades_gracefully_outside_a_git_repository() {
    // Checkpointing must not fail just because the daemon's own cwd isn't
    // a git work tree.
    let project = Project::empty();
    let instance_id = init(&project);
    project.sv().args(&["checkpoint", "create", &instance_id]).passes();
}
