// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Org chart store: one chart (nodes, reporting lines, assignments) per
//! (phase, factory), plus a petgraph view of the reporting hierarchy

use crate::error::{OrgError, OrgResult};
use crate::types::{
    Chart, Connection, EntityKind, FactoryId, Node, NodeId, Phase, PersonId, Position, Role, RoleId,
};
use chrono::Utc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

impl Chart {
    /// Find a node
    pub fn node(&self, node_id: &str) -> OrgResult<&Node> {
        self.nodes
            .iter()
            .find(|n| n.id == node_id)
            .ok_or_else(|| OrgError::not_found(EntityKind::Node, node_id))
    }

    /// Find a node mutably
    pub fn node_mut(&mut self, node_id: &str) -> OrgResult<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| OrgError::not_found(EntityKind::Node, node_id))
    }

    /// Whether any node carries the role
    #[must_use]
    pub fn is_placed(&self, role_id: &str) -> bool {
        self.nodes.iter().any(|n| n.roles.iter().any(|r| r == role_id))
    }

    /// Nodes carrying the role
    #[must_use]
    pub fn placements(&self, role_id: &str) -> Vec<&NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.roles.iter().any(|r| r == role_id))
            .map(|n| &n.id)
            .collect()
    }

    /// Person holding a role
    #[must_use]
    pub fn assignee(&self, role_id: &str) -> Option<&PersonId> {
        self.assignments.get(role_id)
    }

    /// Whether the person holds any role in this chart
    #[must_use]
    pub fn is_assigned(&self, person_id: &str) -> bool {
        self.assignments.values().any(|p| p == person_id)
    }

    /// Roles held by a person, in role ID order
    #[must_use]
    pub fn roles_of(&self, person_id: &str) -> Vec<&RoleId> {
        self.assignments
            .iter()
            .filter(|(_, p)| *p == person_id)
            .map(|(r, _)| r)
            .collect()
    }

    /// Nodes grouped by display level, levels ascending
    #[must_use]
    pub fn nodes_by_level(&self) -> BTreeMap<u32, Vec<&Node>> {
        let mut levels: BTreeMap<u32, Vec<&Node>> = BTreeMap::new();
        for node in &self.nodes {
            levels.entry(node.level).or_default().push(node);
        }
        levels
    }

    /// Insert a node under a caller-chosen ID
    pub fn insert_node(&mut self, node: Node) -> OrgResult<()> {
        if self.nodes.iter().any(|n| n.id == node.id) {
            return Err(OrgError::DuplicateId { kind: EntityKind::Node, id: node.id });
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a node and every connection touching it. Reports of the
    /// removed node lose their parent. Assignments are left alone.
    pub fn remove_node(&mut self, node_id: &str) -> OrgResult<Node> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == node_id)
            .ok_or_else(|| OrgError::not_found(EntityKind::Node, node_id))?;
        let node = self.nodes.remove(index);
        self.connections.retain(|c| !c.touches(node_id));
        for other in &mut self.nodes {
            if other.parent_id.as_deref() == Some(node_id) {
                other.parent_id = None;
            }
        }
        Ok(node)
    }

    /// Add a reporting line. A node has at most one manager, so an existing
    /// inbound line of `target` is replaced.
    pub fn add_connection(&mut self, source: &str, target: &str) -> OrgResult<()> {
        if source == target {
            return Err(OrgError::InvalidConnection { manager: source.into(), report: target.into() });
        }
        self.node(source)?;
        self.node_mut(target)?.parent_id = Some(source.to_string());
        self.connections.retain(|c| c.target != target);
        self.connections.push(Connection { source: source.into(), target: target.into() });
        Ok(())
    }

    /// Remove a reporting line
    pub fn remove_connection(&mut self, source: &str, target: &str) -> OrgResult<()> {
        let before = self.connections.len();
        self.connections.retain(|c| !(c.source == source && c.target == target));
        if self.connections.len() == before {
            return Err(OrgError::not_found(EntityKind::Connection, format!("{source}->{target}")));
        }
        if let Ok(node) = self.node_mut(target) {
            node.parent_id = None;
        }
        Ok(())
    }

    /// Append a role to a node. Returns false when it was already there.
    pub fn place_role(&mut self, node_id: &str, role_id: &str) -> OrgResult<bool> {
        let node = self.node_mut(node_id)?;
        if node.roles.iter().any(|r| r == role_id) {
            return Ok(false);
        }
        node.roles.push(role_id.to_string());
        Ok(true)
    }

    /// Remove a role from a node
    pub fn unplace_role(&mut self, node_id: &str, role_id: &str) -> OrgResult<()> {
        let node = self.node_mut(node_id)?;
        let index = node
            .roles
            .iter()
            .position(|r| r == role_id)
            .ok_or_else(|| OrgError::not_found(EntityKind::Placement, format!("{role_id}@{node_id}")))?;
        node.roles.remove(index);
        Ok(())
    }

    /// Move a role within or across nodes.
    ///
    /// Same node: remove at the current index, insert at `to_index`.
    /// Different node: remove from the source, insert into the destination
    /// at `to_index` clamped to its length. A destination that already
    /// carries the role keeps its single copy where it is.
    pub fn move_role(&mut self, role_id: &str, from_node: &str, to_index: usize, to_node: &str) -> OrgResult<()> {
        self.node(to_node)?;
        let source = self.node_mut(from_node)?;
        let from_index = source
            .roles
            .iter()
            .position(|r| r == role_id)
            .ok_or_else(|| OrgError::not_found(EntityKind::Placement, format!("{role_id}@{from_node}")))?;

        if from_node == to_node {
            let role = source.roles.remove(from_index);
            let index = to_index.min(source.roles.len());
            source.roles.insert(index, role);
            return Ok(());
        }

        let role = source.roles.remove(from_index);
        let dest = self.node_mut(to_node)?;
        if !dest.roles.contains(&role) {
            let index = to_index.min(dest.roles.len());
            dest.roles.insert(index, role);
        }
        Ok(())
    }

    /// Record an assignment. The role must be placed on a node and vacant.
    /// Assigning the current occupant again is accepted.
    pub fn assign(&mut self, role_id: &str, person_id: &str) -> OrgResult<()> {
        if !self.is_placed(role_id) {
            return Err(OrgError::RoleNotPlaced { role_id: role_id.into() });
        }
        match self.assignments.get(role_id) {
            Some(current) if current == person_id => Ok(()),
            Some(current) => Err(OrgError::RoleOccupied { role_id: role_id.into(), person_id: current.clone() }),
            None => {
                self.assignments.insert(role_id.into(), person_id.into());
                Ok(())
            }
        }
    }

    /// Replace whoever holds a role. Returns the displaced person.
    pub fn reassign(&mut self, role_id: &str, person_id: &str) -> OrgResult<Option<PersonId>> {
        if !self.is_placed(role_id) {
            return Err(OrgError::RoleNotPlaced { role_id: role_id.into() });
        }
        let previous = self.assignments.insert(role_id.into(), person_id.into());
        Ok(previous.filter(|p| p != person_id))
    }

    /// Drop an assignment. Returns the person who held the role.
    pub fn unassign(&mut self, role_id: &str) -> Option<PersonId> {
        self.assignments.remove(role_id)
    }

    /// Generate a node ID not yet used in this chart
    #[must_use]
    pub fn fresh_node_id(&self, phase: Phase, factory: &FactoryId, level: u32) -> NodeId {
        let seed = Utc::now().timestamp_nanos_opt().unwrap_or_default().unsigned_abs();
        let mut salt = seed.wrapping_add(self.nodes.len() as u64);
        loop {
            let id = Node::generate_id(phase, factory, level, salt);
            if self.nodes.iter().all(|n| n.id != id) {
                return id;
            }
            salt = salt.wrapping_add(1);
        }
    }

    /// Reporting hierarchy as a petgraph
    #[must_use]
    pub fn hierarchy(&self) -> Hierarchy {
        Hierarchy::build(self)
    }
}

/// Every chart, keyed phase then factory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgChartStore {
    charts: BTreeMap<Phase, BTreeMap<FactoryId, Chart>>,
}

impl OrgChartStore {
    /// Store with an empty chart for each phase and factory
    #[must_use]
    pub fn new(phases: &[Phase], factories: &[FactoryId]) -> Self {
        let mut store = Self::default();
        for phase in phases {
            store.charts.entry(*phase).or_default();
        }
        for factory in factories {
            store.register_factory(factory);
        }
        store
    }

    /// Phases present in the store
    pub fn phases(&self) -> impl Iterator<Item = Phase> + '_ {
        self.charts.keys().copied()
    }

    /// Make sure every phase has an (empty) chart for the factory
    pub fn register_factory(&mut self, factory: &FactoryId) {
        for charts in self.charts.values_mut() {
            charts.entry(factory.clone()).or_default();
        }
    }

    /// Chart of a (phase, factory)
    pub fn chart(&self, phase: Phase, factory: &FactoryId) -> OrgResult<&Chart> {
        self.charts
            .get(&phase)
            .ok_or_else(|| OrgError::UnknownPhase(phase.to_string()))?
            .get(factory)
            .ok_or_else(|| OrgError::UnknownFactory(factory.to_string()))
    }

    /// Mutable chart of a (phase, factory)
    pub fn chart_mut(&mut self, phase: Phase, factory: &FactoryId) -> OrgResult<&mut Chart> {
        self.charts
            .get_mut(&phase)
            .ok_or_else(|| OrgError::UnknownPhase(phase.to_string()))?
            .get_mut(factory)
            .ok_or_else(|| OrgError::UnknownFactory(factory.to_string()))
    }

    /// Charts of one factory across every phase
    pub fn charts_of(&self, factory: &FactoryId) -> impl Iterator<Item = (Phase, &Chart)> + '_ {
        let factory = factory.clone();
        self.charts
            .iter()
            .filter_map(move |(phase, charts)| charts.get(&factory).map(|c| (*phase, c)))
    }

    /// Mutable charts of one factory across every phase
    pub fn charts_of_mut(&mut self, factory: &FactoryId) -> impl Iterator<Item = (Phase, &mut Chart)> + '_ {
        let factory = factory.clone();
        self.charts
            .iter_mut()
            .filter_map(move |(phase, charts)| charts.get_mut(&factory).map(|c| (*phase, c)))
    }

    /// Every chart with its coordinates
    pub fn iter(&self) -> impl Iterator<Item = (Phase, &FactoryId, &Chart)> + '_ {
        self.charts
            .iter()
            .flat_map(|(phase, charts)| charts.iter().map(move |(f, c)| (*phase, f, c)))
    }

    /// Every chart mutably with its coordinates
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Phase, &FactoryId, &mut Chart)> + '_ {
        self.charts
            .iter_mut()
            .flat_map(|(phase, charts)| charts.iter_mut().map(move |(f, c)| (*phase, f, c)))
    }

    /// Create an empty node at a level, returning its fresh ID
    pub fn add_node(&mut self, phase: Phase, factory: &FactoryId, level: u32) -> OrgResult<NodeId> {
        let chart = self.chart_mut(phase, factory)?;
        let id = chart.fresh_node_id(phase, factory, level);
        chart.nodes.push(Node::new(id.clone(), level));
        Ok(id)
    }

    /// Change a node's position and/or level. Non-finite coordinates are
    /// rejected before anything changes.
    pub fn update_node(
        &mut self,
        phase: Phase,
        factory: &FactoryId,
        node_id: &str,
        position: Option<Position>,
        level: Option<u32>,
    ) -> OrgResult<()> {
        if let Some(p) = position.filter(|p| !p.is_finite()) {
            return Err(OrgError::InvalidPosition { node_id: node_id.into(), x: p.x.to_string(), y: p.y.to_string() });
        }
        let node = self.chart_mut(phase, factory)?.node_mut(node_id)?;
        if let Some(position) = position {
            node.position = Some(position);
        }
        if let Some(level) = level {
            node.level = level;
        }
        Ok(())
    }

    /// Overwrite `to`'s chart with a structural copy of `from`'s. IDs are kept.
    pub fn copy_chart(&mut self, from: Phase, to: Phase, factory: &FactoryId) -> OrgResult<()> {
        let copy = self.chart(from, factory)?.clone();
        *self.chart_mut(to, factory)? = copy;
        Ok(())
    }

    /// Reset a chart to empty
    pub fn clear_chart(&mut self, phase: Phase, factory: &FactoryId) -> OrgResult<Chart> {
        Ok(std::mem::take(self.chart_mut(phase, factory)?))
    }
}

/// Reporting hierarchy of one chart, backed by petgraph
pub struct Hierarchy {
    graph: DiGraph<NodeId, ()>,
    indices: HashMap<NodeId, NodeIndex>,
}

impl Hierarchy {
    fn build(chart: &Chart) -> Self {
        let mut graph = DiGraph::new();
        let mut indices = HashMap::new();
        for node in &chart.nodes {
            let idx = graph.add_node(node.id.clone());
            indices.insert(node.id.clone(), idx);
        }
        for conn in &chart.connections {
            if let (Some(&from), Some(&to)) = (indices.get(&conn.source), indices.get(&conn.target)) {
                graph.add_edge(from, to, ());
            }
        }
        Self { graph, indices }
    }

    /// Nodes without a manager
    #[must_use]
    pub fn roots(&self) -> Vec<&NodeId> {
        self.graph
            .node_indices()
            .filter(|&i| self.graph.neighbors_directed(i, Direction::Incoming).next().is_none())
            .map(|i| &self.graph[i])
            .collect()
    }

    /// Direct reports of a node
    #[must_use]
    pub fn reports_of(&self, node_id: &str) -> Vec<&NodeId> {
        let Some(&idx) = self.indices.get(node_id) else {
            return Vec::new();
        };
        let mut reports: Vec<&NodeId> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|i| &self.graph[i])
            .collect();
        reports.sort();
        reports
    }

    /// Number of reporting lines
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Render a chart to Graphviz DOT, labelling nodes with their role titles
#[must_use]
pub fn to_dot(chart: &Chart, roles: &[Role], personnel: &[crate::types::Person]) -> String {
    let mut dot = String::from("digraph orgchart {\n");
    dot.push_str("  rankdir=TB;\n");
    dot.push_str("  node [shape=box, style=rounded];\n\n");

    for node in &chart.nodes {
        let mut label = String::new();
        for role_id in &node.roles {
            let title = roles.iter().find(|r| &r.id == role_id).map_or(role_id.as_str(), |r| r.title.as_str());
            let holder = chart
                .assignee(role_id)
                .and_then(|p| personnel.iter().find(|x| &x.id == p))
                .map_or("vacant", |p| p.name.as_str());
            let _ = write!(label, "{title} ({holder})\\n");
        }
        if label.is_empty() {
            label.push_str("(empty)");
        }
        let _ = writeln!(dot, "  \"{}\" [label=\"{}\"];", node.id, label.replace('"', "'"));
    }

    dot.push('\n');
    for conn in &chart.connections {
        let _ = writeln!(dot, "  \"{}\" -> \"{}\";", conn.source, conn.target);
    }

    for (level, nodes) in chart.nodes_by_level() {
        let _ = write!(dot, "\n  {{ rank=same; /* level {level} */");
        for node in nodes {
            let _ = write!(dot, " \"{}\";", node.id);
        }
        dot.push_str(" }\n");
    }

    dot.push_str("}\n");
    dot
}
