// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Phase-to-phase comparison of one factory's chart

use crate::error::OrgResult;
use crate::state::OrgState;
use crate::types::{FactoryId, NodeId, PersonId, Phase, Role, RoleId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// Same role held by different people in the two phases
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reassignment {
    /// Role
    pub role_id: RoleId,
    /// Holder in the `from` phase
    pub from: Option<PersonId>,
    /// Holder in the `to` phase
    pub to: Option<PersonId>,
}

/// Same node reporting to a different manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportingChange {
    /// Node present in both phases
    pub node_id: NodeId,
    /// Manager in the `from` phase
    pub from_parent: Option<NodeId>,
    /// Manager in the `to` phase
    pub to_parent: Option<NodeId>,
}

/// Differences between two phases of a factory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseComparison {
    /// Baseline phase
    pub from: Phase,
    /// Compared phase
    pub to: Phase,
    /// Factory
    pub factory: FactoryId,
    /// Node counts (from, to)
    pub node_counts: (usize, usize),
    /// Placement counts (from, to)
    pub placement_counts: (usize, usize),
    /// Nodes only in `to`
    pub added_nodes: Vec<NodeId>,
    /// Nodes only in `from`
    pub removed_nodes: Vec<NodeId>,
    /// Roles placed in `to` but nowhere in `from`
    pub added_roles: Vec<RoleId>,
    /// Roles placed in `from` but nowhere in `to`
    pub removed_roles: Vec<RoleId>,
    /// Roles whose holder differs
    pub reassignments: Vec<Reassignment>,
    /// Nodes whose manager differs
    pub reporting_changes: Vec<ReportingChange>,
}

impl PhaseComparison {
    /// Whether the two charts are equivalent
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.added_roles.is_empty()
            && self.removed_roles.is_empty()
            && self.reassignments.is_empty()
            && self.reporting_changes.is_empty()
    }

    /// Plain-text report, with role titles where known
    #[must_use]
    pub fn report(&self, roles: &[Role]) -> String {
        let title = |id: &RoleId| role_title(roles, id).to_string();
        let mut out = String::new();
        let _ = writeln!(out, "{} vs {} for {}", self.from, self.to, self.factory);
        let _ = writeln!(out, "  nodes:      {} -> {}", self.node_counts.0, self.node_counts.1);
        let _ = writeln!(out, "  placements: {} -> {}", self.placement_counts.0, self.placement_counts.1);

        let mut section = |name: &str, lines: Vec<String>| {
            if !lines.is_empty() {
                let _ = writeln!(out, "\n{name}:");
                for line in lines {
                    let _ = writeln!(out, "  - {line}");
                }
            }
        };
        section("New roles", self.added_roles.iter().map(title).collect());
        section("Removed roles", self.removed_roles.iter().map(title).collect());
        section("New nodes", self.added_nodes.clone());
        section("Removed nodes", self.removed_nodes.clone());
        section(
            "Reassignments",
            self.reassignments
                .iter()
                .map(|r| {
                    format!(
                        "{}: {} -> {}",
                        title(&r.role_id),
                        r.from.as_deref().unwrap_or("vacant"),
                        r.to.as_deref().unwrap_or("vacant")
                    )
                })
                .collect(),
        );
        section(
            "Reporting changes",
            self.reporting_changes
                .iter()
                .map(|c| {
                    format!(
                        "{}: {} -> {}",
                        c.node_id,
                        c.from_parent.as_deref().unwrap_or("none"),
                        c.to_parent.as_deref().unwrap_or("none")
                    )
                })
                .collect(),
        );
        out
    }
}

fn role_title<'a>(roles: &'a [Role], id: &'a str) -> &'a str {
    roles.iter().find(|r| r.id == id).map_or(id, |r| r.title.as_str())
}

/// Compare the charts of two phases for one factory
pub fn compare_phases(state: &OrgState, from: Phase, to: Phase, factory: &FactoryId) -> OrgResult<PhaseComparison> {
    state.ensure(from, factory)?;
    state.ensure(to, factory)?;
    let a = state.org_chart.chart(from, factory)?;
    let b = state.org_chart.chart(to, factory)?;

    let nodes_a: BTreeMap<&NodeId, Option<&NodeId>> = a.nodes.iter().map(|n| (&n.id, n.parent_id.as_ref())).collect();
    let nodes_b: BTreeMap<&NodeId, Option<&NodeId>> = b.nodes.iter().map(|n| (&n.id, n.parent_id.as_ref())).collect();
    let roles_a: BTreeSet<&RoleId> = a.nodes.iter().flat_map(|n| &n.roles).collect();
    let roles_b: BTreeSet<&RoleId> = b.nodes.iter().flat_map(|n| &n.roles).collect();

    let reassignments = a
        .assignments
        .keys()
        .chain(b.assignments.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|role| a.assignments.get(*role) != b.assignments.get(*role))
        .map(|role| Reassignment {
            role_id: role.clone(),
            from: a.assignments.get(role).cloned(),
            to: b.assignments.get(role).cloned(),
        })
        .collect();

    let reporting_changes = nodes_a
        .iter()
        .filter_map(|(id, parent_a)| {
            let parent_b = nodes_b.get(id)?;
            (parent_a != parent_b).then(|| ReportingChange {
                node_id: (*id).clone(),
                from_parent: parent_a.cloned(),
                to_parent: parent_b.cloned(),
            })
        })
        .collect();

    Ok(PhaseComparison {
        from,
        to,
        factory: factory.clone(),
        node_counts: (a.nodes.len(), b.nodes.len()),
        placement_counts: (a.nodes.iter().map(|n| n.roles.len()).sum(), b.nodes.iter().map(|n| n.roles.len()).sum()),
        added_nodes: nodes_b.keys().filter(|id| !nodes_a.contains_key(*id)).map(|id| (*id).clone()).collect(),
        removed_nodes: nodes_a.keys().filter(|id| !nodes_b.contains_key(*id)).map(|id| (*id).clone()).collect(),
        added_roles: roles_b.difference(&roles_a).map(|r| (*r).clone()).collect(),
        removed_roles: roles_a.difference(&roles_b).map(|r| (*r).clone()).collect(),
        reassignments,
        reporting_changes,
    })
}
