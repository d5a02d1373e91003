// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Chart node and reporting line commands

use super::{Scope, Session};
use crate::types::Position;
use anyhow::{bail, Result};
use clap::Subcommand;

/// `orgdesign node ...`
#[derive(Debug, Subcommand)]
pub enum NodeCommand {
    /// Create an empty node
    Add {
        /// Display level, 0 at the top
        #[arg(long, default_value_t = 0)]
        level: u32,
        #[command(flatten)]
        scope: Scope,
    },
    /// Create a node reporting to an existing one
    Child {
        /// Manager node ID
        parent: String,
        #[command(flatten)]
        scope: Scope,
    },
    /// Delete a node and its reporting lines
    #[command(alias = "remove")]
    Rm {
        /// Node ID
        id: String,
        #[command(flatten)]
        scope: Scope,
    },
    /// List nodes by level
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        scope: Scope,
    },
    /// Reposition a node or change its level
    Move {
        /// Node ID
        id: String,
        /// Canvas x
        #[arg(long, requires = "y")]
        x: Option<f64>,
        /// Canvas y
        #[arg(long, requires = "x")]
        y: Option<f64>,
        /// New level
        #[arg(long)]
        level: Option<u32>,
        #[command(flatten)]
        scope: Scope,
    },
    /// Make one node report to another
    Connect {
        /// Manager node ID
        manager: String,
        /// Report node ID
        report: String,
        #[command(flatten)]
        scope: Scope,
    },
    /// Remove a reporting line
    Disconnect {
        /// Manager node ID
        manager: String,
        /// Report node ID
        report: String,
        #[command(flatten)]
        scope: Scope,
    },
}

/// Run node command
pub fn run(session: &mut Session, command: NodeCommand) -> Result<()> {
    match command {
        NodeCommand::Add { level, scope } => {
            let (phase, factory) = (session.phase(&scope), session.factory(&scope));
            let (id, changes) = session.workspace.add_node(phase, &factory, level)?;
            session.finish(&changes, &format!("Created node {id} at level {level}"))?;
            if !session.json {
                println!("  id: {id}");
            }
            Ok(())
        }

        NodeCommand::Child { parent, scope } => {
            let (phase, factory) = (session.phase(&scope), session.factory(&scope));
            let (id, changes) = session.workspace.add_child_node(phase, &factory, &parent)?;
            session.finish(&changes, &format!("Created node {id} reporting to {parent}"))?;
            if !session.json {
                println!("  id: {id}");
            }
            Ok(())
        }

        NodeCommand::Rm { id, scope } => {
            let (phase, factory) = (session.phase(&scope), session.factory(&scope));
            let changes = session.workspace.delete_node(phase, &factory, &id)?;
            session.finish(&changes, &format!("Deleted node {id}"))
        }

        NodeCommand::Move { id, x, y, level, scope } => {
            let position = match (x, y) {
                (Some(x), Some(y)) => Some(Position { x, y }),
                _ => None,
            };
            if position.is_none() && level.is_none() {
                bail!("Nothing to change. Pass --x/--y or --level");
            }
            let (phase, factory) = (session.phase(&scope), session.factory(&scope));
            let changes = session.workspace.update_node(phase, &factory, &id, position, level)?;
            session.finish(&changes, &format!("Updated node {id}"))
        }

        NodeCommand::Connect { manager, report, scope } => {
            let (phase, factory) = (session.phase(&scope), session.factory(&scope));
            let changes = session.workspace.add_connection(phase, &factory, &manager, &report)?;
            session.finish(&changes, &format!("{report} now reports to {manager}"))
        }

        NodeCommand::Disconnect { manager, report, scope } => {
            let (phase, factory) = (session.phase(&scope), session.factory(&scope));
            let changes = session.workspace.remove_connection(phase, &factory, &manager, &report)?;
            session.finish(&changes, &format!("Removed line {manager} -> {report}"))
        }

        NodeCommand::List { scope } => {
            let (phase, factory) = (session.phase(&scope), session.factory(&scope));
            let chart = session.workspace.state().org_chart.chart(phase, &factory)?;
            if session.json {
                return session.print_json(&chart.nodes);
            }
            if chart.nodes.is_empty() {
                println!("No nodes in {phase}/{factory}. Use 'orgdesign node add' to create one.");
                return Ok(());
            }
            println!("Nodes in {}/{} ({}):", phase, factory, chart.nodes.len());
            for (level, nodes) in chart.nodes_by_level() {
                println!("  level {level}:");
                for node in nodes {
                    let parent = node.parent_id.as_deref().map(|p| format!(" -> {p}")).unwrap_or_default();
                    println!("    {}{} [{}]", node.id, parent, node.roles.join(", "));
                }
            }
            Ok(())
        }
    }
}
