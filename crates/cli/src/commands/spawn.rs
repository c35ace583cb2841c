// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv spawn ...` — Spawn Lifecycle Tracker (C5).

use crate::client::DaemonClient;
use crate::output::{format_or_json, format_time_ago, OutputFormat};
use crate::table::{Column, Table};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use sv_core::{Spawn, SpawnStatus};
use sv_wire::{Request, Response};

#[derive(Args)]
pub struct SpawnArgs {
    #[command(subcommand)]
    pub command: SpawnCommand,
}

#[derive(Subcommand)]
pub enum SpawnCommand {
    /// Register a newly-spawned child agent as `running`.
    Register {
        project: String,
        task_id: String,
        task_type: String,
        description: String,
        output_file: String,
        /// Child process id, when known, so the health monitor can confirm
        /// liveness before ever marking this spawn `abandoned`.
        #[arg(long)]
        pid: Option<u32>,
    },
    /// Refresh a spawn's `last_output_change` timestamp.
    Touch { project: String, task_id: String },
    /// Mark a spawn `completed` or `failed` by exit code.
    Complete { project: String, task_id: String, exit_code: i32 },
    /// List spawns for a project, optionally filtered by status.
    List {
        project: String,
        /// running|completed|failed|stalled|abandoned
        #[arg(long)]
        status: Option<String>,
    },
}

fn parse_status(raw: &str) -> Result<SpawnStatus> {
    match raw.to_ascii_lowercase().as_str() {
        "running" => Ok(SpawnStatus::Running),
        "completed" => Ok(SpawnStatus::Completed),
        "failed" => Ok(SpawnStatus::Failed),
        "stalled" => Ok(SpawnStatus::Stalled),
        "abandoned" => Ok(SpawnStatus::Abandoned),
        other => Err(anyhow!("invalid spawn status '{other}'")),
    }
}

pub async fn handle(command: SpawnCommand, client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        SpawnCommand::Register { project, task_id, task_type, description, output_file, pid } => {
            expect_ok(
                client.call(Request::SpawnRegister { project, task_id, task_type, description, output_file, pid }).await?,
            )
        }
        SpawnCommand::Touch { project, task_id } => expect_ok(client.call(Request::SpawnTouch { project, task_id }).await?),
        SpawnCommand::Complete { project, task_id, exit_code } => {
            expect_ok(client.call(Request::SpawnComplete { project, task_id, exit_code }).await?)
        }
        SpawnCommand::List { project, status } => {
            let status = status.map(|s| parse_status(&s)).transpose()?;
            match client.call(Request::SpawnList { project, status }).await? {
                Response::SpawnList { spawns } => format_or_json(format, &spawns, || render_table(&spawns)),
                other => Err(unexpected(other)),
            }
        }
    }
}

fn render_table(spawns: &[Spawn]) {
    let mut table = Table::new(vec![
        Column::left("TASK"),
        Column::left("TYPE"),
        Column::left("STATUS"),
        Column::muted("LAST OUTPUT"),
    ]);
    for spawn in spawns {
        table.row(vec![
            spawn.task_id.clone(),
            spawn.task_type.clone(),
            spawn.status.to_string(),
            format_time_ago(spawn.last_output_change),
        ]);
    }
    let stdout = std::io::stdout();
    table.render(&mut stdout.lock());
}

fn expect_ok(response: Response) -> Result<()> {
    match response {
        Response::Ok => Ok(()),
        Response::SpawnRegistered => Ok(()),
        other => Err(unexpected(other)),
    }
}

fn unexpected(response: Response) -> anyhow::Error {
    anyhow!("daemon returned an unexpected response: {response:?}")
}
