// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv ports ...` — per-project port allocation, consumed by the Tunnel &
//! CNAME Manager for ingress targets (spec §6).

use crate::client::DaemonClient;
use crate::output::{format_or_json, OutputFormat};
use crate::table::{Column, Table};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use sv_wire::{Request, Response};

#[derive(Args)]
pub struct PortsArgs {
    #[command(subcommand)]
    pub command: PortsCommand,
}

#[derive(Subcommand)]
pub enum PortsCommand {
    /// Get a service's assigned port, allocating one if needed.
    GetOrAllocate { project: String, service: String },
    /// List allocated ports, optionally filtered by project.
    List {
        #[arg(long)]
        project: Option<String>,
    },
    /// Release a service's port back to the pool.
    Release { project: String, service: String },
    /// Check whether something is actually listening on a port.
    VerifyLive { port: u16, host: String },
}

pub async fn handle(command: PortsCommand, client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        PortsCommand::GetOrAllocate { project, service } => {
            match client.call(Request::PortsGetOrAllocate { project, service }).await? {
                Response::Port { port } => format_or_json(format, &port, || println!("{port}")),
                other => Err(unexpected(other)),
            }
        }
        PortsCommand::List { project } => match client.call(Request::PortsList { project }).await? {
            Response::PortList { ports } => format_or_json(format, &ports, || {
                let mut table = Table::new(vec![Column::right("PORT")]);
                for port in &ports {
                    table.row(vec![port.to_string()]);
                }
                let stdout = std::io::stdout();
                table.render(&mut stdout.lock());
            }),
            other => Err(unexpected(other)),
        },
        PortsCommand::Release { project, service } => {
            expect_ok(client.call(Request::PortsRelease { project, service }).await?)
        }
        PortsCommand::VerifyLive { port, host } => match client.call(Request::PortsVerifyLive { port, host }).await? {
            Response::PortLive { live } => format_or_json(format, &live, || println!("{live}")),
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
