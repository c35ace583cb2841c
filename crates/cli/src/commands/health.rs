// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv health ...` — Health Monitor audit trail (C6).

use crate::client::DaemonClient;
use crate::output::{format_or_json, OutputFormat};
use crate::table::{Column, Table};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use sv_core::{CheckStatus, CheckType};
use sv_wire::{Request, Response};

#[derive(Args)]
pub struct HealthArgs {
    #[command(subcommand)]
    pub command: HealthCommand,
}

#[derive(Subcommand)]
pub enum HealthCommand {
    /// Append a health check audit row.
    Record {
        project: String,
        /// spawn|context|handoff|orphaned_work|tunnel
        check_type: String,
        /// ok|warning|critical
        status: String,
        /// JSON payload; bare strings are wrapped as a JSON string.
        details: String,
        #[arg(long)]
        action_taken: Option<String>,
        #[arg(long)]
        ps_response: Option<String>,
    },
    /// Spawns in the `stalled` state for a project.
    Stalled { project: String },
    /// Instance ids due for a scheduled health check.
    NeedingCheck,
}

fn parse_check_type(raw: &str) -> Result<CheckType> {
    match raw.to_ascii_lowercase().as_str() {
        "spawn" => Ok(CheckType::Spawn),
        "context" => Ok(CheckType::Context),
        "handoff" => Ok(CheckType::Handoff),
        "orphaned_work" | "orphaned-work" => Ok(CheckType::OrphanedWork),
        "tunnel" => Ok(CheckType::Tunnel),
        other => Err(anyhow!("invalid check type '{other}'")),
    }
}

fn parse_check_status(raw: &str) -> Result<CheckStatus> {
    match raw.to_ascii_lowercase().as_str() {
        "ok" => Ok(CheckStatus::Ok),
        "warning" => Ok(CheckStatus::Warning),
        "critical" => Ok(CheckStatus::Critical),
        other => Err(anyhow!("invalid check status '{other}'")),
    }
}

pub async fn handle(command: HealthCommand, client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        HealthCommand::Record { project, check_type, status, details, action_taken, ps_response } => {
            let check_type = parse_check_type(&check_type)?;
            let status = parse_check_status(&status)?;
            let details = serde_json::from_str(&details).unwrap_or(serde_json::Value::String(details));
            let request = Request::HealthRecord { project, check_type, status, details, action_taken, ps_response };
            match client.call(request).await? {
                Response::HealthRecorded { id } => format_or_json(format, &id, || println!("{id}")),
                other => Err(unexpected(other)),
            }
        }
        HealthCommand::Stalled { project } => match client.call(Request::HealthStalledSpawns { project }).await? {
            Response::SpawnList { spawns } => format_or_json(format, &spawns, || {
                let mut table = Table::new(vec![Column::left("TASK"), Column::left("STATUS")]);
                for spawn in &spawns {
                    table.row(vec![spawn.task_id.clone(), spawn.status.to_string()]);
                }
                let stdout = std::io::stdout();
                table.render(&mut stdout.lock());
            }),
            other => Err(unexpected(other)),
        },
        HealthCommand::NeedingCheck => match client.call(Request::HealthSessionsNeedingCheck).await? {
            Response::SessionsNeedingCheck { instance_ids } => format_or_json(format, &instance_ids, || {
                for id in &instance_ids {
                    println!("{id}");
                }
            }),
            other => Err(unexpected(other)),
        },
    }
}

fn unexpected(response: Response) -> anyhow::Error {
    anyhow!("daemon returned an unexpected response: {response:?}")
}
