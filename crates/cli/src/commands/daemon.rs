// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv daemon ...` — start/stop/status for the `svd` background process.

use crate::client::{self, DaemonClient};
use crate::output::{format_or_json, OutputFormat};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the background if it isn't already running.
    Start,
    /// Stop a running daemon.
    Stop,
    /// Check whether the daemon is reachable.
    Status,
}

pub async fn handle(command: DaemonCommand, format: OutputFormat) -> Result<()> {
    match command {
        DaemonCommand::Start => {
            if DaemonClient::connect().await.is_ok() {
                println!("daemon already running");
                return Ok(());
            }
            DaemonClient::connect_or_start().await.map_err(|e| anyhow!("failed to start daemon: {e}"))?;
            println!("daemon started");
            Ok(())
        }
        DaemonCommand::Stop => match client::stop_daemon()? {
            true => {
                println!("daemon stopped");
                Ok(())
            }
            false => {
                println!("daemon not running");
                Ok(())
            }
        },
        DaemonCommand::Status => {
            let running = match DaemonClient::connect().await {
                Ok(mut c) => c.ping().await.unwrap_or(false),
                Err(_) => false,
            };
            format_or_json(format, &running, || {
                println!("{}", if running { "running" } else { "not running" });
            })
        }
    }
}
