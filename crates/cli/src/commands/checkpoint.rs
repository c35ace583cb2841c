// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv checkpoint ...` — checkpoint capture, retrieval and retention (C4).

use crate::client::DaemonClient;
use crate::output::{format_or_json, OutputFormat};
use crate::table::{Column, Table};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use sv_core::{CheckpointId, CheckpointKind, InstanceId, DEFAULT_RETENTION_DAYS};
use sv_wire::{Request, Response};

#[derive(Args)]
pub struct CheckpointArgs {
    #[command(subcommand)]
    pub command: CheckpointCommand,
}

#[derive(Subcommand)]
pub enum CheckpointCommand {
    /// Capture a work-state snapshot for an instance.
    Create {
        instance_id: String,
        /// "context_window", "epic_completion", or "manual"
        #[arg(long, default_value = "manual")]
        kind: String,
        /// Context window usage at capture time, 0-100.
        #[arg(long, default_value_t = 0.0)]
        percent: f64,
    },
    /// Fetch a checkpoint's work state and resume markdown.
    Get { checkpoint_id: String },
    /// List checkpoint ids for an instance, newest first.
    List {
        instance_id: String,
        #[arg(long)]
        kind: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Delete checkpoints older than the retention window.
    Cleanup {
        #[arg(long, default_value_t = DEFAULT_RETENTION_DAYS)]
        retention_days: u32,
    },
}

fn parse_kind(raw: &str) -> Result<CheckpointKind> {
    match raw.to_ascii_lowercase().as_str() {
        "context_window" | "context-window" => Ok(CheckpointKind::ContextWindow),
        "epic_completion" | "epic-completion" => Ok(CheckpointKind::EpicCompletion),
        "manual" => Ok(CheckpointKind::Manual),
        other => Err(anyhow!("invalid checkpoint kind '{other}'")),
    }
}

pub async fn handle(command: CheckpointCommand, client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        CheckpointCommand::Create { instance_id, kind, percent } => {
            let instance_id = InstanceId::new(instance_id)?;
            let kind = parse_kind(&kind)?;
            let request = Request::CheckpointCreate { instance_id, kind, context_window_percent: percent };
            match client.call(request).await? {
                Response::CheckpointCreated { checkpoint_id } => {
                    format_or_json(format, &checkpoint_id, || println!("{checkpoint_id}"))
                }
                other => Err(unexpected(other)),
            }
        }
        CheckpointCommand::Get { checkpoint_id } => {
            let checkpoint_id = CheckpointId::from_string(checkpoint_id);
            match client.call(Request::CheckpointGet { checkpoint_id }).await? {
                Response::CheckpointDetail { work_state, resume_markdown } => format_or_json(
                    format,
                    &serde_json::json!({ "work_state": work_state, "resume_markdown": resume_markdown }),
                    || println!("{resume_markdown}"),
                ),
                other => Err(unexpected(other)),
            }
        }
        CheckpointCommand::List { instance_id, kind, limit, offset } => {
            let instance_id = InstanceId::new(instance_id)?;
            let kind = kind.map(|k| parse_kind(&k)).transpose()?;
            match client.call(Request::CheckpointList { instance_id, kind, limit, offset }).await? {
                Response::CheckpointList { checkpoint_ids } => format_or_json(format, &checkpoint_ids, || {
                    let mut table = Table::new(vec![Column::left("CHECKPOINT")]);
                    for id in &checkpoint_ids {
                        table.row(vec![id.to_string()]);
                    }
                    let stdout = std::io::stdout();
                    table.render(&mut stdout.lock());
                }),
                other => Err(unexpected(other)),
            }
        }
        CheckpointCommand::Cleanup { retention_days } => {
            match client.call(Request::CheckpointCleanup { retention_days }).await? {
                Response::CheckpointCleanupReport { deleted_count, freed_bytes } => format_or_json(
                    format,
                    &serde_json::json!({ "deleted_count": deleted_count, "freed_bytes": freed_bytes }),
                    || println!("deleted {deleted_count} checkpoint(s), freed {freed_bytes} bytes"),
                ),
                other => Err(unexpected(other)),
            }
        }
    }
}

fn unexpected(response: Response) -> anyhow::Error {
    anyhow!("daemon returned an unexpected response: {response:?}")
}
