// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Personnel commands

use super::{split_list, Scope, Session};
use crate::types::{Availability, Person, PersonPatch};
use anyhow::Result;
use clap::Subcommand;

/// `orgdesign person ...`
#[derive(Debug, Subcommand)]
pub enum PersonCommand {
    /// Add a person
    Add {
        /// Full name
        name: String,
        /// Explicit ID (derived from the name otherwise)
        #[arg(long)]
        id: Option<String>,
        /// Job title held today
        #[arg(long)]
        current_role: Option<String>,
        /// Comma separated skills
        #[arg(long)]
        skills: Option<String>,
        /// Comma separated experience lines
        #[arg(long)]
        experience: Option<String>,
        #[command(flatten)]
        scope: Scope,
    },
    /// Change fields of a person
    Edit {
        /// Person ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New current role text
        #[arg(long)]
        current_role: Option<String>,
        /// Replacement skills, comma separated
        #[arg(long)]
        skills: Option<String>,
        /// Replacement experience, comma separated
        #[arg(long)]
        experience: Option<String>,
        #[command(flatten)]
        scope: Scope,
    },
    /// Delete a person and every assignment they hold
    #[command(alias = "remove")]
    Rm {
        /// Person ID
        id: String,
        #[command(flatten)]
        scope: Scope,
    },
    /// List personnel of a factory
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        scope: Scope,
    },
    /// Flag a person available or partially available
    Avail {
        /// Person ID
        id: String,
        /// available or partial
        availability: Availability,
        #[command(flatten)]
        scope: Scope,
    },
}

/// Run person command
pub fn run(session: &mut Session, command: PersonCommand) -> Result<()> {
    match command {
        PersonCommand::Add { name, id, current_role, skills, experience, scope } => {
            let factory = session.factory(&scope);
            let id = id.unwrap_or_else(|| Person::generate_id(&factory, &name));
            let mut person = Person::new(id.clone(), name);
            person.current_role = current_role;
            person.skills = split_list(skills.as_deref()).unwrap_or_default();
            person.experience = split_list(experience.as_deref()).unwrap_or_default();

            let changes = session.workspace.add_person(&factory, person)?;
            session.finish(&changes, &format!("Added {id} to {factory}"))
        }

        PersonCommand::Edit { id, name, current_role, skills, experience, scope } => {
            let factory = session.factory(&scope);
            let patch = PersonPatch {
                name,
                current_role,
                skills: split_list(skills.as_deref()),
                experience: split_list(experience.as_deref()),
            };
            let changes = session.workspace.update_person(&factory, &id, patch)?;
            session.finish(&changes, &format!("Updated {id}"))
        }

        PersonCommand::Rm { id, scope } => {
            let factory = session.factory(&scope);
            let (person, changes) = session.workspace.delete_person(&factory, &id)?;
            session.finish(&changes, &format!("Removed {} ({})", person.name, person.id))
        }

        PersonCommand::Avail { id, availability, scope } => {
            let factory = session.factory(&scope);
            let changes = session.workspace.set_availability(&factory, &id, availability)?;
            let now = session.workspace.state().entities.person(&factory, &id)?.availability;
            session.finish(&changes, &format!("{id} is now {now}"))
        }

        PersonCommand::List { scope } => {
            let factory = session.factory(&scope);
            let state = session.workspace.state();
            let personnel = state.entities.personnel(&factory)?;
            if session.json {
                return session.print_json(&personnel);
            }
            if personnel.is_empty() {
                println!("No personnel in {factory}. Use 'orgdesign person add' to add someone.");
                return Ok(());
            }

            let chart = state.org_chart.chart(state.phase.current_phase, &factory)?;
            println!("Personnel in {} ({}):", factory, personnel.len());
            for person in personnel {
                let held: Vec<&str> = chart.roles_of(&person.id).into_iter().map(String::as_str).collect();
                let current = person.current_role.as_deref().unwrap_or("-");
                println!("  {} - {} ({}) [{}]", person.id, person.name, current, person.availability);
                if !held.is_empty() {
                    println!("      holds: {}", held.join(", "));
                }
            }
            Ok(())
        }
    }
}
