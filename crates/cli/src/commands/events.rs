// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv events ...` — Event Lineage Store queries (C1/C2).

use crate::client::DaemonClient;
use crate::output::{format_or_json, OutputFormat};
use crate::table::{Column, Table};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use sv_core::{Event, EventId, InstanceId, DEFAULT_RECENT_LIMIT};
use sv_wire::{Request, Response};

#[derive(Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Subcommand)]
pub enum EventsCommand {
    /// Append a lineage event, optionally parented to an existing one.
    Log {
        instance_id: String,
        event_type: String,
        /// JSON payload; bare strings are wrapped as a JSON string.
        payload: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Most recent events for an instance, newest first.
    Recent {
        instance_id: String,
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },
    /// Walk from an event up to its root.
    Chain {
        event_id: String,
        #[arg(long, default_value_t = sv_core::MAX_CHAIN_DEPTH)]
        max_depth: u32,
    },
    /// Walk down from an event to its descendants.
    Subtree {
        event_id: String,
        #[arg(long, default_value_t = sv_core::DEFAULT_SUBTREE_DEPTH)]
        max_depth: u32,
    },
    /// Direct children of an event.
    Children { event_id: String },
}

pub async fn handle(command: EventsCommand, client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        EventsCommand::Log { instance_id, event_type, payload, parent } => {
            let instance_id = InstanceId::new(instance_id)?;
            let payload = serde_json::from_str(&payload).unwrap_or(serde_json::Value::String(payload));
            let parent = parent.map(|p| EventId::from(p.as_str()));
            match client.call(Request::EventsLog { instance_id, event_type, payload, parent }).await? {
                Response::EventLogged { event_id } => format_or_json(format, &event_id, || println!("{event_id}")),
                other => Err(unexpected(other)),
            }
        }
        EventsCommand::Recent { instance_id, limit } => {
            let instance_id = InstanceId::new(instance_id)?;
            render_events(client.call(Request::EventsRecent { instance_id, limit }).await?, format)
        }
        EventsCommand::Chain { event_id, max_depth } => {
            let event_id = EventId::from(event_id.as_str());
            match client.call(Request::EventsParentChain { event_id, max_depth }).await? {
                Response::EventChain { chain } => format_or_json(format, &chain, || render_table(&chain)),
                other => Err(unexpected(other)),
            }
        }
        EventsCommand::Subtree { event_id, max_depth } => {
            let root_id = EventId::from(event_id.as_str());
            render_events(client.call(Request::EventsSubtree { root_id, max_depth }).await?, format)
        }
        EventsCommand::Children { event_id } => {
            let event_id = EventId::from(event_id.as_str());
            render_events(client.call(Request::EventsChildren { event_id }).await?, format)
        }
    }
}

fn render_events(response: Response, format: OutputFormat) -> Result<()> {
    match response {
        Response::EventList { events } => format_or_json(format, &events, || render_table(&events)),
        other => Err(unexpected(other)),
    }
}

fn render_table(events: &[Event]) {
    let mut table = Table::new(vec![
        Column::left("EVENT"),
        Column::left("TYPE"),
        Column::right("DEPTH"),
        Column::muted("PARENT"),
    ]);
    for event in events {
        table.row(vec![
            event.event_id.to_string(),
            event.event_type.clone(),
            event.depth.to_string(),
            event.parent_uuid.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
        ]);
    }
    let stdout = std::io::stdout();
    table.render(&mut stdout.lock());
}

fn unexpected(response: Response) -> anyhow::Error {
    anyhow!("daemon returned an unexpected response: {response:?}")
}
