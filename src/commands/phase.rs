// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Phase commands: switch, copy, clear, compare

use super::{Scope, Session};
use crate::compare::compare_phases;
use crate::types::Phase;
use anyhow::Result;
use clap::Subcommand;

/// `orgdesign phase ...`
#[derive(Debug, Subcommand)]
pub enum PhaseCommand {
    /// Show phases and the active one
    Show,
    /// Make a phase active
    Switch {
        /// current, future or iterative
        phase: Phase,
    },
    /// Overwrite one phase's chart with a copy of another's
    Copy {
        /// Source phase
        from: Phase,
        /// Target phase
        to: Phase,
        #[command(flatten)]
        scope: Scope,
    },
    /// Empty a phase's chart
    Clear {
        #[command(flatten)]
        scope: Scope,
    },
    /// Report differences between two phases
    Compare {
        /// Baseline phase
        from: Phase,
        /// Compared phase
        to: Phase,
        #[command(flatten)]
        scope: Scope,
    },
}

/// Run phase command
pub fn run(session: &mut Session, command: PhaseCommand) -> Result<()> {
    match command {
        PhaseCommand::Show => {
            let phase = &session.workspace.state().phase;
            if session.json {
                return session.print_json(phase);
            }
            for (key, info) in &phase.phases {
                let marker = if *key == phase.current_phase { "*" } else { " " };
                let modified = info
                    .last_modified
                    .map_or_else(|| "never modified".to_string(), |t| format!("modified {}", t.format("%Y-%m-%d %H:%M")));
                println!("{} {:<10} {} ({})", marker, key, info.name, modified);
            }
            Ok(())
        }

        PhaseCommand::Switch { phase } => {
            let changes = session.workspace.select_phase(phase)?;
            session.finish(&changes, &format!("Active phase: {}", phase.display_name()))
        }

        PhaseCommand::Copy { from, to, scope } => {
            let factory = session.factory(&scope);
            let changes = session.workspace.copy_chart(from, to, &factory)?;
            session.finish(&changes, &format!("Copied {from} into {to} for {factory}"))
        }

        PhaseCommand::Clear { scope } => {
            let (phase, factory) = (session.phase(&scope), session.factory(&scope));
            let changes = session.workspace.clear_chart(phase, &factory)?;
            session.finish(&changes, &format!("Cleared {phase}/{factory}"))
        }

        PhaseCommand::Compare { from, to, scope } => {
            let factory = session.factory(&scope);
            let state = session.workspace.state();
            let comparison = compare_phases(state, from, to, &factory)?;
            if session.json {
                return session.print_json(&comparison);
            }
            print!("{}", comparison.report(state.entities.roles(&factory)?));
            if comparison.is_empty() {
                println!("\nNo structural differences.");
            }
            Ok(())
        }
    }
}
