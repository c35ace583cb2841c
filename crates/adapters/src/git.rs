// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git working-tree probe backing `WorkState::git_status` (C4). Must
//! degrade gracefully when git is unavailable (spec §4.4): callers treat
//! `GitError` as "no git status", never as a checkpoint-create failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use sv_core::{FileChange, FileChangeStatus, GitStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("not a git repository")]
    NotARepo,
    #[error("failed to run git: {0}")]
    Exec(String),
}

#[async_trait]
pub trait GitProbe: Clone + Send + Sync + 'static {
    async fn status(&self, working_directory: &str) -> Result<GitStatus, GitError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemGitProbe;

impl SystemGitProbe {
    pub fn new() -> Self {
        Self
    }

    async fn run(dir: &str, args: &[&str]) -> Result<String, GitError> {
        let output = tokio::process::Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .output()
            .await
            .map_err(|e| GitError::Exec(e.to_string()))?;
        if !output.status.success() {
            return Err(GitError::NotARepo);
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl GitProbe for SystemGitProbe {
    async fn status(&self, working_directory: &str) -> Result<GitStatus, GitError> {
        let branch = Self::run(working_directory, &["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        let porcelain = Self::run(working_directory, &["status", "--porcelain=v2"]).await?;
        let commit_count: u64 = Self::run(working_directory, &["rev-list", "--count", "HEAD"])
            .await
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let (staged, unstaged, untracked, entries) = parse_porcelain_v2(&porcelain);
        let line_counts = Self::numstat(working_directory).await;

        let mut files = Vec::with_capacity(entries.len());
        for (path, status) in entries {
            let lines_changed = line_counts.get(&path).copied().unwrap_or(0);
            let last_modified = Self::mtime(working_directory, &path).await;
            files.push(FileChange { path, status, lines_changed, last_modified });
        }

        Ok(GitStatus { branch, staged, unstaged, untracked, commit_count, files })
    }
}

impl SystemGitProbe {
    /// Per-file added+deleted line counts against `HEAD`, covering staged
    /// and unstaged changes in one pass. Untracked files never appear here
    /// (git has no blob to diff against) and are left at `0`.
    async fn numstat(dir: &str) -> HashMap<String, u32> {
        let Ok(output) = Self::run(dir, &["diff", "--numstat", "HEAD"]).await else {
            return HashMap::new();
        };
        output
            .lines()
            .filter_map(|line| {
                let mut parts = line.splitn(3, '\t');
                let added = parts.next()?;
                let deleted = parts.next()?;
                let path = parts.next()?;
                let added: u32 = added.parse().unwrap_or(0);
                let deleted: u32 = deleted.parse().unwrap_or(0);
                Some((path.to_string(), added.saturating_add(deleted)))
            })
            .collect()
    }

    async fn mtime(dir: &str, path: &str) -> DateTime<Utc> {
        let full_path = Path::new(dir).join(path);
        match tokio::fs::metadata(&full_path).await.and_then(|meta| meta.modified()) {
            Ok(mtime) => DateTime::<Utc>::from(mtime),
            Err(_) => Utc::now(),
        }
    }
}

/// Parse `git status --porcelain=v2` into (staged, unstaged, untracked,
/// changed-file entries). Renamed/copied entries (`2 ...`) report the new
/// path; ignored entries (`!`) and unmerged entries (`u`) are skipped —
/// neither maps cleanly onto a single [`FileChangeStatus`].
fn parse_porcelain_v2(output: &str) -> (u32, u32, u32, Vec<(String, FileChangeStatus)>) {
    let mut staged = 0u32;
    let mut unstaged = 0u32;
    let mut untracked = 0u32;
    let mut entries = Vec::new();

    for line in output.lines() {
        let mut fields = line.splitn(2, ' ');
        let Some(kind) = fields.next() else { continue };
        let Some(rest) = fields.next() else { continue };

        match kind {
            "1" => {
                let mut tokens = rest.splitn(8, ' ');
                let Some(xy) = tokens.next() else { continue };
                let Some(path) = tokens.nth(6) else { continue };
                count_xy(xy, &mut staged, &mut unstaged);
                entries.push((path.to_string(), status_from_xy(xy)));
            }
            "2" => {
                let mut tokens = rest.splitn(9, ' ');
                let Some(xy) = tokens.next() else { continue };
                let Some(path_and_orig) = tokens.nth(7) else { continue };
                let path = path_and_orig.split('\t').next().unwrap_or(path_and_orig);
                count_xy(xy, &mut staged, &mut unstaged);
                entries.push((path.to_string(), status_from_xy(xy)));
            }
            "?" => {
                untracked += 1;
                entries.push((rest.to_string(), FileChangeStatus::Added));
            }
            _ => {}
        }
    }

    (staged, unstaged, untracked, entries)
}

fn count_xy(xy: &str, staged: &mut u32, unstaged: &mut u32) {
    let mut chars = xy.chars();
    let index_status = chars.next().unwrap_or('.');
    let worktree_status = chars.next().unwrap_or('.');
    if index_status != '.' {
        *staged += 1;
    }
    if worktree_status != '.' {
        *unstaged += 1;
    }
}

fn status_from_xy(xy: &str) -> FileChangeStatus {
    let mut chars = xy.chars();
    let index_status = chars.next().unwrap_or('.');
    let worktree_status = chars.next().unwrap_or('.');
    if index_status == 'A' || worktree_status == 'A' {
        FileChangeStatus::Added
    } else if index_status == 'D' || worktree_status == 'D' {
        FileChangeStatus::Deleted
    } else {
        FileChangeStatus::Modified
    }
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
