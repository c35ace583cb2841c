//! Shared harness for binary-level specs: spawns the real `sv`/`svd`
//! binaries built alongside this test crate, each against an isolated
//! state directory, and exposes small assertion helpers over the
//! process's stdout/stderr/exit code.
//!
//! The `sv-specs` package owns no `[[bin]]` of its own, so
//! `CARGO_BIN_EXE_*` isn't set for it; the binaries are instead located
//! next to this test's own executable, the same `target/<profile>/`
//! directory `assert_cmd::cargo_bin` would resolve to for a package that
//! did own them.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::{Duration, Instant};

/// Upper bound for polling loops (`wait_for`); CI machines are slower
/// than a laptop, so this is generous rather than tight.
pub const SPEC_WAIT_MAX_MS: u64 = 5_000;

/// Poll `cond` every 20ms until it returns true or `max_ms` elapses.
/// Returns whether it ever became true.
pub fn wait_for(max_ms: u64, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

/// `target/<profile>` directory this test binary itself was built into.
fn target_dir() -> PathBuf {
    let exe = std::env::current_exe().expect("current test executable path");
    exe.parent() // .../target/debug/deps
        .and_then(Path::parent) // .../target/debug
        .expect("test executable has a target profile directory")
        .to_path_buf()
}

fn bin_path(name: &str) -> PathBuf {
    let candidate = target_dir().join(name);
    assert!(candidate.exists(), "expected {} to exist (built as a workspace member binary)", candidate.display());
    candidate
}

/// An isolated project: its own `SV_STATE_DIR`, torn down (daemon
/// stopped) when dropped.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self { dir: tempfile::tempdir().expect("tempdir") }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    /// Build an `sv` invocation wired to this project's state directory.
    pub fn sv(&self) -> Cmd {
        Cmd::new(bin_path("sv"), self.state_path())
    }

    pub fn daemon_log(&self) -> String {
        std::fs::read_to_string(self.state_path().join("daemon.log")).unwrap_or_default()
    }

    fn daemon_pid(&self) -> Option<i32> {
        std::fs::read_to_string(self.state_path().join("daemon.pid")).ok()?.trim().parse().ok()
    }

    /// SIGKILL a running daemon, simulating a crash (no graceful
    /// shutdown/checkpoint). Returns whether a process was signalled.
    pub fn daemon_kill(&self) -> bool {
        let Some(pid) = self.daemon_pid() else { return false };
        nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), nix::sys::signal::Signal::SIGKILL).is_ok()
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        let _ = self.sv().args(&["daemon", "stop"]).run();
    }
}

/// A not-yet-run `sv` invocation.
pub struct Cmd {
    inner: std::process::Command,
}

impl Cmd {
    fn new(bin: PathBuf, state_dir: PathBuf) -> Self {
        let mut inner = std::process::Command::new(bin);
        inner.env("SV_STATE_DIR", state_dir);
        Self { inner }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.inner.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.inner.env(key, value);
        self
    }

    fn run(mut self) -> Output {
        self.inner.output().expect("failed to spawn sv")
    }

    /// Run and assert a zero exit code.
    pub fn passes(self) -> Finished {
        let output = self.run();
        assert!(
            output.status.success(),
            "expected success, got {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        Finished { output }
    }

    /// Run and assert a non-zero exit code.
    pub fn fails(self) -> Finished {
        let output = self.run();
        assert!(
            !output.status.success(),
            "expected failure, got success\nstdout: {}",
            String::from_utf8_lossy(&output.stdout),
        );
        Finished { output }
    }
}

/// A finished process, with its output captured for assertions.
pub struct Finished {
    output: Output,
}

impl Finished {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).trim().to_string()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).trim().to_string()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout().contains(needle), "expected stdout to contain {needle:?}, got: {}", self.stdout());
        self
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        assert_eq!(self.stdout(), expected);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr().contains(needle), "expected stderr to contain {needle:?}, got: {}", self.stderr());
        self
    }

    /// Parse stdout as JSON (requires the command was run with `-o json`).
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout()).unwrap_or_else(|e| panic!("stdout is not valid JSON ({e}): {}", self.stdout()))
    }
}
