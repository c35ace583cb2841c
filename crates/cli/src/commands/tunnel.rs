// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv tunnel ...` — Tunnel & CNAME Manager (C9/C10).

use crate::client::DaemonClient;
use crate::output::{format_or_json, OutputFormat};
use crate::table::{Column, Table};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use sv_wire::{Request, Response};

#[derive(Args)]
pub struct TunnelArgs {
    #[command(subcommand)]
    pub command: TunnelCommand,
}

#[derive(Subcommand)]
pub enum TunnelCommand {
    /// Tunnel daemon liveness and restart-backoff state.
    Status,
    /// Provision a CNAME + ingress rule for a project service.
    RequestCname { subdomain: String, domain: String, target_port: u16, project: String },
    /// Tear down a CNAME + ingress rule.
    DeleteCname {
        hostname: String,
        requester: String,
        #[arg(long)]
        meta: bool,
    },
    /// List provisioned hostnames, optionally filtered by project.
    ListCnames {
        #[arg(long)]
        project: Option<String>,
    },
    /// List distinct domains in use.
    ListDomains,
}

pub async fn handle(command: TunnelCommand, client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        TunnelCommand::Status => match client.call(Request::TunnelStatus).await? {
            Response::TunnelStatus { active, backoff_index } => format_or_json(
                format,
                &serde_json::json!({ "active": active, "backoff_index": backoff_index }),
                || println!("active={active} backoff_index={backoff_index}"),
            ),
            other => Err(unexpected(other)),
        },
        TunnelCommand::RequestCname { subdomain, domain, target_port, project } => {
            let request = Request::TunnelRequestCname { subdomain, domain, target_port, project };
            match client.call(request).await? {
                Response::CnameCreated { id, hostname, target_service } => format_or_json(
                    format,
                    &serde_json::json!({ "id": id, "hostname": hostname, "target_service": target_service }),
                    || println!("{hostname} -> {target_service}"),
                ),
                other => Err(unexpected(other)),
            }
        }
        TunnelCommand::DeleteCname { hostname, requester, meta } => {
            expect_ok(client.call(Request::TunnelDeleteCname { hostname, requester, is_meta: meta }).await?)
        }
        TunnelCommand::ListCnames { project } => match client.call(Request::TunnelListCnames { project }).await? {
            Response::CnameList { hostnames } => format_or_json(format, &hostnames, || {
                let mut table = Table::new(vec![Column::left("HOSTNAME")]);
                for hostname in &hostnames {
                    table.row(vec![hostname.clone()]);
                }
                let stdout = std::io::stdout();
                table.render(&mut stdout.lock());
            }),
            other => Err(unexpected(other)),
        },
        TunnelCommand::ListDomains => match client.call(Request::TunnelListDomains).await? {
            Response::DomainList { domains } => format_or_json(format, &domains, || {
                for domain in &domains {
                    println!("{domain}");
                }
            }),
            other => Err(unexpected(other)),
        },
    }
}

fn expect_ok(response: Response) -> Result<()> {
    match response {
        Response::CnameDeleted => Ok(()),
        other => Err(unexpected(other)),
    }
}

fn unexpected(response: Response) -> anyhow::Error {
    anyhow!("daemon returned an unexpected response: {response:?}")
}
