//! Event Lineage Store (C1/C2): cascading parent/child chains.

use crate::prelude::*;

fn init(project: &Project) -> String {
    project
        .sv()
        .args(&["session", "init", "demo", "--instance-type", "ps", "--transport", "cli", "--handle", "tmux:demo"])
        .passes()
        .stdout()
}

/// Logging a chain of events with `--parent` should reconstruct the same
/// lineage end to end: the root has `depth = 0`, each child's parent chain
/// walks back through every ancestor, and the subtree from the root
/// recovers every descendant.
#[test]
fn cascading_lineage_round_trips_through_chain_and_subtree() {
    let project = Project::empty();
    let instance_id = init(&project);

    let root = project.sv().args(&["events", "log", &instance_id, "plan", "\"start\""]).passes().stdout();
    let child =
        project.sv().args(&["events", "log", &instance_id, "step", "\"work\"", "--parent", &root]).passes().stdout();
    let grandchild =
        project.sv().args(&["events", "log", &instance_id, "step", "\"more work\"", "--parent", &child]).passes().stdout();

    let chain = project.sv().args(&["events", "chain", &grandchild, "-o", "json"]).passes().json();
    let chain_ids: Vec<String> = chain.as_array().unwrap().iter().map(|e| e["event_id"].as_str().unwrap().to_string()).collect();
    assert_eq!(chain_ids, vec![root.clone(), child.clone(), grandchild.clone()], "chain should run root -> child -> grandchild");

    let subtree = project.sv().args(&["events", "subtree", &root, "-o", "json"]).passes().json();
    let subtree_ids: Vec<String> = subtree.as_array().unwrap().iter().map(|e| e["event_id"].as_str().unwrap().to_string()).collect();
    assert!(subtree_ids.contains(&child));
    assert!(subtree_ids.contains(&grandchild));

    let children = project.sv().args(&["events", "children", &root, "-o", "json"]).passes().json();
    let children_ids: Vec<String> =
        children.as_array().unwrap().iter().map(|e| e["event_id"].as_str().unwrap().to_string()).collect();
    assert_eq!(children_ids, vec![child]);
}

#[test]
fn recent_events_are_newest_first() {
    let project = Project::empty();
    let instance_id = init(&project);
    project.sv().args(&["events", "log", &instance_id, "a", "\"1\""]).passes();
    project.sv().args(&["events", "log", &instance_id, "b", "\"2\""]).passes();

    let recent = project.sv().args(&["events", "recent", &instance_id, "-o", "json"]).passes().json();
    let types: Vec<String> = recent.as_array().unwrap().iter().map(|e| e["event_type"].as_str().unwrap().to_string()).collect();
    assert_eq!(types, vec!["b", "a"]);
}
