// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Focus factory commands

use super::Session;
use crate::types::FactoryId;
use anyhow::Result;
use clap::Subcommand;

/// `orgdesign factory ...`
#[derive(Debug, Subcommand)]
pub enum FactoryCommand {
    /// List registered factories
    #[command(alias = "ls")]
    List,
    /// Make a factory active
    Switch {
        /// Factory code
        code: String,
    },
    /// Register a new factory
    Add {
        /// Factory code
        code: String,
    },
}

/// Run factory command
pub fn run(session: &mut Session, command: FactoryCommand) -> Result<()> {
    match command {
        FactoryCommand::List => {
            let state = session.workspace.state();
            if session.json {
                return session.print_json(&state.focus_factory);
            }
            for factory in &state.focus_factory.factories {
                let marker = if *factory == state.focus_factory.current_factory { "*" } else { " " };
                let roles = state.entities.roles(factory).map_or(0, <[_]>::len);
                let people = state.entities.personnel(factory).map_or(0, <[_]>::len);
                println!("{marker} {factory:<6} {roles} roles, {people} personnel");
            }
            Ok(())
        }

        FactoryCommand::Switch { code } => {
            let changes = session.workspace.select_factory(&FactoryId::from(code.as_str()))?;
            session.finish(&changes, &format!("Active factory: {code}"))
        }

        FactoryCommand::Add { code } => {
            let changes = session.workspace.register_factory(&FactoryId::from(code.as_str()))?;
            session.finish(&changes, &format!("Registered factory {code}"))
        }
    }
}
