//! Per-project port allocation.

use crate::prelude::*;

#[test]
fn get_or_allocate_is_idempotent_per_service() {
    let project = Project::empty();
    let first = project.sv().args(&["ports", "get-or-allocate", "demo", "web"]).passes().stdout();
    let second = project.sv().args(&["ports", "get-or-allocate", "demo", "web"]).passes().stdout();
    assert_eq!(first, second, "re-requesting the same service should return the same port");

    let other = project.sv().args(&["ports", "get-or-allocate", "demo", "worker"]).passes().stdout();
    assert_ne!(first, other, "different services get different ports");
}

#[test]
fn release_then_reallocate_may_reuse_the_port() {
    let project = Project::empty();
    let port = project.sv().args(&["ports", "get-or-allocate", "demo", "web"]).passes().stdout();
    project.sv().args(&["ports", "release", "demo", "web"]).passes();

    let listed = project.sv().args(&["ports", "list", "-o", "json"]).passes().json();
    assert!(listed.as_array().unwrap().is_empty(), "released port should not be listed: {port}");
}
