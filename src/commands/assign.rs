// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Placement, assignment and drag-drop commands

use super::{Scope, Session};
use crate::dragdrop::{classify, handle_drop, DragEvent, DropAction};
use anyhow::{Context, Result};

/// Put a role on a node
pub fn place(session: &mut Session, node: &str, role: &str, scope: &Scope) -> Result<()> {
    let (phase, factory) = (session.phase(scope), session.factory(scope));
    let changes = session.workspace.place_role(phase, &factory, node, role)?;
    session.finish(&changes, &format!("Placed {role} on {node}"))
}

/// Take a role off a node
pub fn unplace(session: &mut Session, node: &str, role: &str, scope: &Scope) -> Result<()> {
    let (phase, factory) = (session.phase(scope), session.factory(scope));
    let changes = session.workspace.unplace_role(phase, &factory, node, role)?;
    let lost = changes.len() > 1;
    session.finish(&changes, &format!("Removed {role} from {node}"))?;
    if lost && !session.json {
        println!("  {role} is no longer placed in {phase}/{factory}; its assignment was dropped");
    }
    Ok(())
}

/// Move or reorder a placed role
pub fn move_role(session: &mut Session, role: &str, from: &str, to: &str, index: usize, scope: &Scope) -> Result<()> {
    let (phase, factory) = (session.phase(scope), session.factory(scope));
    let changes = session.workspace.move_role(phase, &factory, role, from, index, to)?;
    session.finish(&changes, &format!("Moved {role} to {to}[{index}]"))
}

/// Assign a person to a role, optionally replacing the holder
pub fn assign(session: &mut Session, role: &str, person: &str, replace: bool, scope: &Scope) -> Result<()> {
    let (phase, factory) = (session.phase(scope), session.factory(scope));
    let changes = if replace {
        session.workspace.reassign_person(phase, &factory, role, person)?
    } else {
        session.workspace.assign_person(phase, &factory, role, person)?
    };
    session.finish(&changes, &format!("Assigned {person} to {role}"))
}

/// Vacate a role
pub fn unassign(session: &mut Session, role: &str, scope: &Scope) -> Result<()> {
    let (phase, factory) = (session.phase(scope), session.factory(scope));
    let changes = session.workspace.unassign_person(phase, &factory, role)?;
    session.finish(&changes, &format!("Vacated {role}"))
}

/// Replay a drag gesture given as droppable identifiers
pub fn drop(
    session: &mut Session,
    item: &str,
    from: &str,
    from_index: usize,
    to: Option<&str>,
    to_index: usize,
) -> Result<()> {
    let event = match DragEvent::from_ids((from, from_index), to.map(|t| (t, to_index)), item) {
        Ok(event) => event,
        Err(reason) => {
            println!("Ignored: {reason}");
            return Ok(());
        }
    };

    if let DropAction::Ignore(reason) = classify(&event) {
        println!("Ignored: {reason}");
        return Ok(());
    }
    let changes = handle_drop(&mut session.workspace, &event).context("Drop rejected")?;
    session.finish(&changes, &format!("Dropped {item} on {}", to.unwrap_or("nothing")))
}
