// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv session ...` — Session & Checkpoint Engine registry operations (C3).

use crate::client::DaemonClient;
use crate::output::{format_or_json, format_time_ago, OutputFormat};
use crate::table::{Column, Table};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use sv_core::{InstanceId, InstanceType, SessionTransport};
use sv_wire::{Request, Response};

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Register a new PS/MS session and mint its instance id.
    Init {
        project: String,
        /// "ps" or "ms"
        #[arg(long, default_value = "ps")]
        instance_type: String,
        /// "cli" or "sdk"
        #[arg(long, default_value = "cli")]
        transport: String,
        /// tmux session name or browser session id
        #[arg(long)]
        handle: String,
    },
    /// Refresh a session's `last_activity` timestamp.
    Heartbeat { instance_id: String },
    /// Push a context-usage reading; a Mandatory-zone reading triggers handoff.
    Context {
        instance_id: String,
        /// Fraction in [0,1], or a percent value above 1 (e.g. 87 == 0.87).
        #[arg(long)]
        percent: Option<f64>,
        #[arg(long)]
        used: Option<u64>,
        #[arg(long)]
        total: Option<u64>,
    },
    /// Close out a session.
    Close { instance_id: String },
    /// List all non-stale active sessions.
    List,
}

fn parse_instance_type(raw: &str) -> Result<InstanceType> {
    match raw.to_ascii_lowercase().as_str() {
        "ps" => Ok(InstanceType::Ps),
        "ms" => Ok(InstanceType::Ms),
        other => Err(anyhow!("invalid instance type '{other}' (expected ps|ms)")),
    }
}

fn parse_transport(raw: &str) -> Result<SessionTransport> {
    match raw.to_ascii_lowercase().as_str() {
        "cli" => Ok(SessionTransport::Cli),
        "sdk" => Ok(SessionTransport::Sdk),
        other => Err(anyhow!("invalid transport '{other}' (expected cli|sdk)")),
    }
}

pub async fn handle(command: SessionCommand, client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        SessionCommand::Init { project, instance_type, transport, handle } => {
            let request = Request::SessionInitialize {
                project,
                instance_type: parse_instance_type(&instance_type)?,
                transport: parse_transport(&transport)?,
                external_handle: handle,
            };
            match client.call(request).await? {
                Response::SessionInitialized { instance_id } => {
                    format_or_json(format, &instance_id, || println!("{instance_id}"))
                }
                other => Err(unexpected(other)),
            }
        }
        SessionCommand::Heartbeat { instance_id } => {
            let instance_id = InstanceId::new(instance_id)?;
            expect_ok(client.call(Request::SessionHeartbeat { instance_id }).await?)
        }
        SessionCommand::Context { instance_id, percent, used, total } => {
            let instance_id = InstanceId::new(instance_id)?;
            let percent = percent.map(super::parse_fraction);
            expect_ok(client.call(Request::SessionUpdateContextUsage { instance_id, percent, used, total }).await?)
        }
        SessionCommand::Close { instance_id } => {
            let instance_id = InstanceId::new(instance_id)?;
            expect_ok(client.call(Request::SessionClose { instance_id }).await?)
        }
        SessionCommand::List => match client.call(Request::SessionListActive).await? {
            Response::SessionList { sessions } => format_or_json(format, &sessions, || {
                let mut table = Table::new(vec![
                    Column::left("INSTANCE"),
                    Column::left("PROJECT"),
                    Column::left("TYPE"),
                    Column::left("TRANSPORT"),
                    Column::right("CONTEXT"),
                    Column::muted("LAST ACTIVITY"),
                ]);
                for session in &sessions {
                    table.row(vec![
                        session.instance_id.to_string(),
                        session.project.clone(),
                        session.instance_type.to_string(),
                        session.transport.to_string(),
                        format!("{:.0}%", session.context_usage * 100.0),
                        format_time_ago(session.last_activity),
                    ]);
                }
                let stdout = std::io::stdout();
                table.render(&mut stdout.lock());
            }),
            other => Err(unexpected(other)),
        },
    }
}

fn expect_ok(response: Response) -> Result<()> {
    match response {
        Response::Ok => Ok(()),
        other => Err(unexpected(other)),
    }
}

fn unexpected(response: Response) -> anyhow::Error {
    anyhow!("daemon returned an unexpected response: {response:?}")
}
