//! Daemon start/stop/status lifecycle and crash recovery.

use crate::prelude::*;

#[test]
fn status_is_not_running_before_start() {
    let project = Project::empty();
    project.sv().args(&["daemon", "status"]).passes().stdout_has("not running");
}

#[test]
fn start_then_status_then_stop() {
    let project = Project::empty();

    project.sv().args(&["daemon", "start"]).passes().stdout_has("started");
    project.sv().args(&["daemon", "start"]).passes().stdout_has("already running");

    let up = wait_for(SPEC_WAIT_MAX_MS, || project.sv().args(&["daemon", "status"]).passes().stdout() == "running");
    assert!(up, "daemon should report running after start");

    project.sv().args(&["daemon", "stop"]).passes().stdout_has("stopped");

    let down = wait_for(SPEC_WAIT_MAX_MS, || project.sv().args(&["daemon", "status"]).passes().stdout() == "not running");
    assert!(down, "daemon should report not running after stop");
}

#[test]
fn session_commands_auto_start_the_daemon() {
    let project = Project::empty();
    project
        .sv()
        .args(&["session", "init", "demo", "--instance-type", "ps", "--transport", "cli", "--handle", "tmux:demo"])
        .passes();

    assert!(project.sv().args(&["daemon", "status"]).passes().stdout() == "running");
}

/// A SIGKILL'd daemon leaves behind a stale lock file; the next auto-start
/// must notice the old process is gone and take over rather than treating
/// the stale pid as still holding the lock.
#[test]
fn daemon_restarts_cleanly_after_a_crash() {
    let project = Project::empty();
    project.sv().args(&["daemon", "start"]).passes();
    wait_for(SPEC_WAIT_MAX_MS, || project.sv().args(&["daemon", "status"]).passes().stdout() == "running");

    assert!(project.daemon_kill(), "expected a daemon process to kill");
    wait_for(SPEC_WAIT_MAX_MS, || project.sv().args(&["daemon", "status"]).passes().stdout() == "not running");

    project.sv().args(&["daemon", "start"]).passes().stdout_has("started");
    let up = wait_for(SPEC_WAIT_MAX_MS, || project.sv().args(&["daemon", "status"]).passes().stdout() == "running");
    assert!(up, "daemon should come back up after a crash");
}
