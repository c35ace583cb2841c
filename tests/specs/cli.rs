//! CLI help/version output.

use crate::prelude::*;

#[test]
fn sv_no_args_shows_usage_and_exits_nonzero() {
    Project::empty().sv().fails().stderr_has("Usage");
}

#[test]
fn sv_help_shows_subcommands() {
    Project::empty()
        .sv()
        .args(&["--help"])
        .passes()
        .stdout_has("Daemon")
        .stdout_has("Session")
        .stdout_has("Checkpoint");
}

#[test]
fn sv_version_shows_version() {
    Project::empty().sv().args(&["--version"]).passes().stdout_has(env!("CARGO_PKG_VERSION"));
}

#[test]
fn sv_daemon_help_shows_subcommands() {
    Project::empty()
        .sv()
        .args(&["daemon", "--help"])
        .passes()
        .stdout_has("start")
        .stdout_has("stop")
        .stdout_has("status");
}
