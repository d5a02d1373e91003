// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Role management commands

use super::{split_list, Scope, Session};
use crate::types::{Role, RolePatch};
use anyhow::Result;
use clap::Subcommand;

/// `orgdesign role ...`
#[derive(Debug, Subcommand)]
pub enum RoleCommand {
    /// Create a role
    Add {
        /// Display title
        title: String,
        /// Explicit ID (derived from the title otherwise)
        #[arg(long)]
        id: Option<String>,
        /// Department
        #[arg(long)]
        department: Option<String>,
        /// Comma separated responsibilities
        #[arg(long)]
        responsibilities: Option<String>,
        /// Comma separated required skills
        #[arg(long)]
        skills: Option<String>,
        #[command(flatten)]
        scope: Scope,
    },
    /// Change fields of a role
    Edit {
        /// Role ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New department
        #[arg(long)]
        department: Option<String>,
        /// Replacement responsibilities, comma separated
        #[arg(long)]
        responsibilities: Option<String>,
        /// Replacement required skills, comma separated
        #[arg(long)]
        skills: Option<String>,
        #[command(flatten)]
        scope: Scope,
    },
    /// Delete a role, its placements and its assignments
    #[command(alias = "remove")]
    Rm {
        /// Role ID
        id: String,
        #[command(flatten)]
        scope: Scope,
    },
    /// List roles of a factory
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        scope: Scope,
    },
}

/// Run role command
pub fn run(session: &mut Session, command: RoleCommand) -> Result<()> {
    match command {
        RoleCommand::Add { title, id, department, responsibilities, skills, scope } => {
            let factory = session.factory(&scope);
            let id = id.unwrap_or_else(|| Role::generate_id(&factory, &title));
            let mut role = Role::new(id.clone(), title);
            role.department = department;
            role.responsibilities = split_list(responsibilities.as_deref()).unwrap_or_default();
            role.required_skills = split_list(skills.as_deref()).unwrap_or_default();

            let changes = session.workspace.add_role(&factory, role)?;
            session.finish(&changes, &format!("Created role {id} in {factory}"))
        }

        RoleCommand::Edit { id, title, department, responsibilities, skills, scope } => {
            let factory = session.factory(&scope);
            let patch = RolePatch {
                title,
                department,
                responsibilities: split_list(responsibilities.as_deref()),
                required_skills: split_list(skills.as_deref()),
            };
            let changes = session.workspace.update_role(&factory, &id, patch)?;
            session.finish(&changes, &format!("Updated role {id}"))
        }

        RoleCommand::Rm { id, scope } => {
            let factory = session.factory(&scope);
            let changes = session.workspace.delete_role(&factory, &id)?;
            let dependents = changes.len().saturating_sub(1);
            session.finish(&changes, &format!("Deleted role {id} ({dependents} dependent changes)"))
        }

        RoleCommand::List { scope } => {
            let factory = session.factory(&scope);
            let state = session.workspace.state();
            let roles = state.entities.roles(&factory)?;
            if session.json {
                return session.print_json(&roles);
            }
            if roles.is_empty() {
                println!("No roles in {factory}. Use 'orgdesign role add' to create one.");
                return Ok(());
            }

            let active = state.active();
            let chart = state.org_chart.chart(active.phase, &factory)?;
            println!("Roles in {} ({}):", factory, roles.len());
            for role in roles {
                let holder = chart.assignee(&role.id).map_or("vacant", String::as_str);
                let placed = if chart.is_placed(&role.id) { "placed" } else { "unplaced" };
                println!("  {} - {} [{}, {}]", role.id, role.title, placed, holder);
                if let Some(dept) = &role.department {
                    println!("      department: {dept}");
                }
            }
            Ok(())
        }
    }
}
