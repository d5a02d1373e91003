// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Render the active chart as an indented tree

use super::{Scope, Session};
use crate::chart::Hierarchy;
use crate::types::{Availability, Chart, Person, Role};
use anyhow::Result;
use owo_colors::OwoColorize;
use std::collections::HashSet;

struct Palette<'a> {
    chart: &'a Chart,
    roles: &'a [Role],
    personnel: &'a [Person],
    color: bool,
}

impl Palette<'_> {
    fn role_line(&self, role_id: &str) -> String {
        let title = self.roles.iter().find(|r| r.id == role_id).map_or(role_id, |r| r.title.as_str());
        let holder = self
            .chart
            .assignee(role_id)
            .map(|p| self.personnel.iter().find(|x| &x.id == p).map_or(p.as_str(), |x| x.name.as_str()));
        match (holder, self.color) {
            (Some(name), true) => format!("{} - {}", title.bold(), name.green()),
            (Some(name), false) => format!("{title} - {name}"),
            (None, true) => format!("{} - {}", title.bold(), "vacant".yellow()),
            (None, false) => format!("{title} - vacant"),
        }
    }

    fn node(&self, hierarchy: &Hierarchy, node_id: &str, depth: usize, seen: &mut HashSet<String>) {
        if !seen.insert(node_id.to_string()) {
            return;
        }
        let indent = "  ".repeat(depth);
        let Ok(node) = self.chart.node(node_id) else {
            return;
        };
        let label = if self.color { node.id.dimmed().to_string() } else { node.id.clone() };
        println!("{indent}[{label}] level {}", node.level);
        if node.roles.is_empty() {
            println!("{indent}  (no roles)");
        }
        for role_id in &node.roles {
            println!("{indent}  {}", self.role_line(role_id));
        }
        for report in hierarchy.reports_of(node_id) {
            self.node(hierarchy, report, depth + 1, seen);
        }
    }
}

/// Run view command
pub fn run(session: &Session, scope: &Scope) -> Result<()> {
    let (phase, factory) = (session.phase(scope), session.factory(scope));
    let state = session.workspace.state();
    let chart = state.org_chart.chart(phase, &factory)?;
    let roles = state.entities.roles(&factory)?;
    let personnel = state.entities.personnel(&factory)?;

    let heading = format!("{} / {}", phase.display_name(), factory);
    if session.color {
        println!("{}", heading.bold().underline());
    } else {
        println!("{heading}");
    }
    if chart.nodes.is_empty() {
        println!("  (empty chart)");
        return Ok(());
    }

    let palette = Palette { chart, roles, personnel, color: session.color };
    let hierarchy = chart.hierarchy();
    let mut seen = HashSet::new();
    for root in hierarchy.roots() {
        palette.node(&hierarchy, root, 0, &mut seen);
    }
    // nodes only reachable through a cycle have no root
    for node in &chart.nodes {
        palette.node(&hierarchy, &node.id, 0, &mut seen);
    }

    let unplaced: Vec<&str> = roles.iter().filter(|r| !chart.is_placed(&r.id)).map(|r| r.title.as_str()).collect();
    if !unplaced.is_empty() {
        println!("\nUnplaced roles: {}", unplaced.join(", "));
    }
    let free: Vec<String> = personnel
        .iter()
        .filter(|p| p.availability != Availability::Assigned)
        .map(|p| format!("{} ({})", p.name, p.availability))
        .collect();
    if !free.is_empty() {
        println!("Available personnel: {}", free.join(", "));
    }
    Ok(())
}
