// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sv - Supervisor Runtime CLI

mod client;
mod color;
mod commands;
mod exit_error;
mod output;
mod table;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{checkpoint, daemon, events, health, ports, secrets, session, spawn, tunnel};
use output::OutputFormat;

use crate::client::DaemonClient;

#[derive(Parser)]
#[command(name = "sv", version, about = "Multi-tenant supervisor runtime CLI")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daemon process management
    Daemon(daemon::DaemonArgs),
    /// Session registry (C3)
    Session(session::SessionArgs),
    /// Event lineage store (C1/C2)
    Events(events::EventsArgs),
    /// Checkpoint capture and retrieval (C4)
    Checkpoint(checkpoint::CheckpointArgs),
    /// Spawn lifecycle tracking (C5)
    Spawn(spawn::SpawnArgs),
    /// Health check audit trail (C6)
    Health(health::HealthArgs),
    /// Tunnel and CNAME management (C9/C10)
    Tunnel(tunnel::TunnelArgs),
    /// Per-project port allocation
    Ports(ports::PortsArgs),
    /// Secrets vault passthrough
    Secrets(secrets::SecretsArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = e.downcast_ref::<exit_error::ExitError>().map_or(1, |c| c.code);
        eprintln!("Error: {e}");
        std::process::exit(code);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    if let Commands::Daemon(args) = cli.command {
        return daemon::handle(args.command, format).await;
    }

    let mut client = DaemonClient::connect_or_start().await?;

    match cli.command {
        Commands::Session(args) => session::handle(args.command, &mut client, format).await,
        Commands::Events(args) => events::handle(args.command, &mut client, format).await,
        Commands::Checkpoint(args) => checkpoint::handle(args.command, &mut client, format).await,
        Commands::Spawn(args) => spawn::handle(args.command, &mut client, format).await,
        Commands::Health(args) => health::handle(args.command, &mut client, format).await,
        Commands::Tunnel(args) => tunnel::handle(args.command, &mut client, format).await,
        Commands::Ports(args) => ports::handle(args.command, &mut client, format).await,
        Commands::Secrets(args) => secrets::handle(args.command, &mut client, format).await,
        Commands::Daemon(_) => unreachable!("handled above"),
    }
}
