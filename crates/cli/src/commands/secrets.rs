// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv secrets ...` — vault passthrough, consumed by the supervisor
//! components that need credentials at runtime (spec §6).

use crate::client::DaemonClient;
use crate::output::{format_or_json, OutputFormat};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use sv_wire::{Request, Response};

#[derive(Args)]
pub struct SecretsArgs {
    #[command(subcommand)]
    pub command: SecretsCommand,
}

#[derive(Subcommand)]
pub enum SecretsCommand {
    /// Fetch a secret by its vault key path.
    Get { key_path: String },
    /// Write a secret by its vault key path.
    Set { key_path: String, value: String },
}

pub async fn handle(command: SecretsCommand, client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        SecretsCommand::Get { key_path } => match client.call(Request::SecretsGet { key_path }).await? {
            Response::Secret { value } => format_or_json(format, &value, || println!("{value}")),
            other => Err(unexpected(other)),
        },
        SecretsCommand::Set { key_path, value } => {
            expect_ok(client.call(Request::SecretsSet { key_path, value }).await?)
        }
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
