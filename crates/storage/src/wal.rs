// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log: the durable, append-only record of every mutation
//! applied to a project's [`crate::state::MaterializedState`].
//!
//! Entries are newline-delimited JSON. `seq` is assigned monotonically by
//! the writer and is never reused. A line that fails to parse (corruption,
//! partial write, binary garbage) ends the readable portion of the file;
//! [`Wal::open`] rotates everything from that point onward into a `.bak`
//! file and continues with only the valid prefix.

use crate::snapshot::rotate_bak_path;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A WAL mutation operation. Variants cover every state-changing action
/// named in the component design (event append, checkpoint write, spawn
/// transition, health check row, cname/ingress change, control events).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WalEntry {
    EventLogged { event: sv_core::Event },
    CheckpointCreated { checkpoint: sv_core::Checkpoint },
    CheckpointPruned { checkpoint_id: String },
    SpawnRecorded { spawn: sv_core::Spawn },
    SpawnStatusChanged {
        project: String,
        task_id: String,
        status: sv_core::SpawnStatus,
        exit_code: Option<i32>,
        error_message: Option<String>,
    },
    HealthCheckRecorded { check: sv_core::HealthCheck },
    CnameCreated { record: sv_core::CnameRecord },
    CnameDeleted { cname_id: String },
    InstanceRegistered { instance_id: String },
    InstanceDeregistered { instance_id: String },
    /// Control event: daemon shutdown requested. Carried through the log
    /// so a restart that replays past it does not re-trigger shutdown.
    Shutdown,
}

/// One durable record: its assigned sequence number plus the operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalRecord {
    pub seq: u64,
    #[serde(flatten)]
    pub entry: WalEntry,
}

/// Flush after this many buffered appends even if the interval hasn't
/// elapsed, so a burst of writes can't grow the unflushed tail unbounded.
const FLUSH_COUNT_THRESHOLD: usize = 100;
/// Flush after this much wall-clock time has passed since the last flush.
const FLUSH_INTERVAL: Duration = Duration::from_millis(500);

pub struct Wal {
    path: PathBuf,
    file: File,
    write_seq: u64,
    processed_seq: u64,
    pending_since_flush: usize,
    last_flush: Instant,
}

impl Wal {
    /// Open (creating if absent) the WAL at `path`, recovering from any
    /// trailing corruption by rotating the unreadable tail to a `.bak`
    /// file. `processed_seq` is the sequence number the caller has already
    /// folded into a snapshot; `next_unprocessed` starts after it.
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let (write_seq, valid_bytes) = Self::recover(&path)?;
        if let Some(valid_bytes) = valid_bytes {
            let bak = rotate_bak_path(&path);
            fs::rename(&path, &bak)?;
            fs::write(&path, valid_bytes)?;
        }
        let file = OpenOptions::new().create(true).append(true).read(true).open(&path)?;
        Ok(Self {
            path,
            file,
            write_seq,
            processed_seq,
            pending_since_flush: 0,
            last_flush: Instant::now(),
        })
    }

    /// Scan the file line by line, keeping every prefix line that parses.
    /// Returns the highest seq seen and, if any trailing bytes were
    /// unreadable, the valid prefix bytes to rewrite the file with.
    fn recover(path: &Path) -> Result<(u64, Option<Vec<u8>>), WalError> {
        if !path.exists() {
            return Ok((0, None));
        }
        let raw = fs::read(path)?;
        let mut valid_prefix_len = 0usize;
        let mut write_seq = 0u64;
        let mut corrupted = false;
        for line in raw.split(|&b| b == b'\n') {
            if line.is_empty() {
                continue;
            }
            match std::str::from_utf8(line).ok().and_then(|s| serde_json::from_str::<WalRecord>(s).ok()) {
                Some(record) => {
                    write_seq = write_seq.max(record.seq);
                    valid_prefix_len += line.len() + 1;
                }
                None => {
                    corrupted = true;
                    break;
                }
            }
        }
        if corrupted {
            Ok((write_seq, Some(raw[..valid_prefix_len].to_vec())))
        } else {
            Ok((write_seq, None))
        }
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    /// Append `entry`, assigning the next sequence number. Buffered until
    /// [`Wal::flush`] or the flush threshold is hit.
    pub fn append(&mut self, entry: &WalEntry) -> Result<u64, WalError> {
        self.write_seq += 1;
        let record = WalRecord { seq: self.write_seq, entry: entry.clone() };
        let line = serde_json::to_string(&record)?;
        writeln!(self.file, "{line}")?;
        self.pending_since_flush += 1;
        if self.needs_flush() {
            self.flush()?;
        }
        Ok(self.write_seq)
    }

    /// Whether buffered writes should be flushed: either the count
    /// threshold or the time interval has been exceeded.
    pub fn needs_flush(&self) -> bool {
        self.pending_since_flush >= FLUSH_COUNT_THRESHOLD
            || (self.pending_since_flush > 0 && self.last_flush.elapsed() >= FLUSH_INTERVAL)
    }

    pub fn flush(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.pending_since_flush = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<WalRecord>, WalError> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut out = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<WalRecord>(&line) {
                Ok(record) => out.push(record),
                Err(_) => break,
            }
        }
        Ok(out)
    }

    /// Return the next entry after `processed_seq` without advancing it,
    /// or `None` if there is nothing new (or the next line is corrupt).
    pub fn next_unprocessed(&mut self) -> Result<Option<WalRecord>, WalError> {
        let records = self.read_all()?;
        Ok(records.into_iter().find(|r| r.seq > self.processed_seq))
    }

    /// Mark `seq` as folded into the caller's materialized view.
    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = self.processed_seq.max(seq);
    }

    /// All entries with `seq > after`, stopping at the first corrupt line.
    pub fn entries_after(&self, after: u64) -> Result<Vec<WalRecord>, WalError> {
        let records = self.read_all()?;
        Ok(records.into_iter().filter(|r| r.seq > after).collect())
    }

    /// Drop entries with `seq < keep_from` from the file, rewriting it in
    /// place. Used after a snapshot to bound WAL growth.
    pub fn truncate_before(&mut self, keep_from: u64) -> Result<(), WalError> {
        self.flush()?;
        let records = self.read_all()?;
        let keep: Vec<_> = records.into_iter().filter(|r| r.seq >= keep_from).collect();
        let tmp = self.path.with_extension("wal.tmp");
        {
            let mut f = File::create(&tmp)?;
            for record in &keep {
                writeln!(f, "{}", serde_json::to_string(record)?)?;
            }
            f.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        self.file = OpenOptions::new().create(true).append(true).read(true).open(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
