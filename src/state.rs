// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! The full state graph: selection, entities and charts for every factory
//! and phase. This is the `data` section of the persisted document.

use crate::chart::OrgChartStore;
use crate::entities::EntityStore;
use crate::error::OrgResult;
use crate::selection::{ActiveContext, FactoryState, PhaseState};
use crate::types::{Availability, FactoryId, Node, Person, Phase, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Top-level keys every document's `data` section must carry
pub const REQUIRED_KEYS: [&str; 5] = ["phase", "roles", "personnel", "orgChart", "focusFactory"];

/// Everything the workspace persists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgState {
    /// Phase selection and metadata
    pub phase: PhaseState,
    /// Factory selection and registered set
    pub focus_factory: FactoryState,
    /// Roles and personnel
    #[serde(flatten)]
    pub entities: EntityStore,
    /// Charts and assignments
    pub org_chart: OrgChartStore,
}

impl Default for OrgState {
    fn default() -> Self {
        Self::new(&Phase::ALL, &default_factories())
    }
}

/// Factories registered out of the box
#[must_use]
pub fn default_factories() -> Vec<FactoryId> {
    ["ADD", "BBV", "SYN"].into_iter().map(FactoryId::from).collect()
}

impl OrgState {
    /// Empty state for the given phases and factories
    #[must_use]
    pub fn new(phases: &[Phase], factories: &[FactoryId]) -> Self {
        let mut entities = EntityStore::default();
        for factory in factories {
            entities.register_factory(factory);
        }
        Self {
            phase: PhaseState::new(phases),
            focus_factory: FactoryState::new(factories),
            entities,
            org_chart: OrgChartStore::new(phases, factories),
        }
    }

    /// The active (phase, factory)
    #[must_use]
    pub fn active(&self) -> ActiveContext {
        ActiveContext {
            phase: self.phase.current_phase,
            factory: self.focus_factory.current_factory.clone(),
        }
    }

    /// Fail unless both coordinates are registered
    pub fn ensure(&self, phase: Phase, factory: &FactoryId) -> OrgResult<()> {
        self.phase.ensure(phase)?;
        self.focus_factory.ensure(factory)
    }

    /// Register a factory with empty collections and charts
    pub fn register_factory(&mut self, factory: &FactoryId) -> bool {
        let added = self.focus_factory.register(factory);
        self.entities.register_factory(factory);
        self.org_chart.register_factory(factory);
        added
    }

    /// Bring a person's availability in line with the active phase's chart
    /// of their factory. Manual `PartiallyAvailable` survives when they hold
    /// nothing.
    pub fn refresh_availability(&mut self, factory: &FactoryId, person_id: &str) {
        let phase = self.phase.current_phase;
        let assigned = self
            .org_chart
            .chart(phase, factory)
            .map(|c| c.is_assigned(person_id))
            .unwrap_or(false);
        if let Ok(person) = self.entities.person_mut(factory, person_id) {
            person.availability = derived_availability(person.availability, assigned);
        }
    }

    /// Refresh every person in every factory. Used after a phase switch or
    /// a wholesale import, when the reference chart changed for everyone.
    pub fn refresh_all_availability(&mut self) {
        let phase = self.phase.current_phase;
        let Self { entities, org_chart, .. } = self;
        for (factory, personnel) in &mut entities.personnel {
            let chart = org_chart.chart(phase, factory).ok();
            for person in personnel {
                let assigned = chart.is_some_and(|c| c.is_assigned(&person.id));
                person.availability = derived_availability(person.availability, assigned);
            }
        }
    }

    /// Make the state self-consistent: every registered factory has its
    /// partitions, and no chart references a missing role, person or node.
    /// Returns the number of references removed.
    pub fn prune_dangling(&mut self) -> usize {
        let factories = self.focus_factory.factories.clone();
        for factory in &factories {
            self.entities.register_factory(factory);
            self.org_chart.register_factory(factory);
        }

        let mut total = 0;
        let Self { entities, org_chart, .. } = self;
        for (phase, factory, chart) in org_chart.iter_mut() {
            let mut pruned = 0;
            let roles: HashSet<&str> = entities
                .roles
                .get(factory)
                .map(|rs| rs.iter().map(|r| r.id.as_str()).collect())
                .unwrap_or_default();
            let people: HashSet<&str> = entities
                .personnel
                .get(factory)
                .map(|ps| ps.iter().map(|p| p.id.as_str()).collect())
                .unwrap_or_default();

            for node in &mut chart.nodes {
                let before = node.roles.len();
                node.roles.retain(|r| roles.contains(r.as_str()));
                pruned += before - node.roles.len();
            }

            let node_ids: HashSet<String> = chart.nodes.iter().map(|n| n.id.clone()).collect();
            let before = chart.connections.len();
            chart
                .connections
                .retain(|c| node_ids.contains(&c.source) && node_ids.contains(&c.target));
            pruned += before - chart.connections.len();
            for node in &mut chart.nodes {
                if node.parent_id.as_ref().is_some_and(|p| !node_ids.contains(p)) {
                    node.parent_id = None;
                    pruned += 1;
                }
            }

            let placed: HashSet<String> = chart.nodes.iter().flat_map(|n| n.roles.iter().cloned()).collect();
            let before = chart.assignments.len();
            chart
                .assignments
                .retain(|role, person| placed.contains(role) && people.contains(person.as_str()));
            pruned += before - chart.assignments.len();

            if pruned > 0 {
                warn!("Pruned {} dangling references in {}/{}", pruned, phase, factory);
            }
            total += pruned;
        }
        total
    }

    /// Sample workspace with the three reference factories and a small
    /// current-state chart for `ADD`
    #[must_use]
    pub fn sample() -> Self {
        let mut state = Self::default();
        let add = FactoryId::from("ADD");

        let roles = [
            ("add-head", "ADD Quality Head", &["Quality strategy", "Regulatory interface"][..]),
            ("add-qm-1", "Quality Manager - Injectables", &["Batch release", "Deviation management"][..]),
            ("add-qe-1", "Quality Engineer - Team 1", &["Process validation", "CAPA follow-up"][..]),
        ];
        for (id, title, responsibilities) in roles {
            let mut role = Role::new(id, title);
            role.department = Some("Quality".into());
            role.responsibilities = responsibilities.iter().map(|s| (*s).to_string()).collect();
            let _ = state.entities.add_role(&add, role);
        }

        let people = [
            ("person-1", "Emily Chen", "Quality Engineer"),
            ("person-2", "Michael Rodriguez", "Quality Manager"),
            ("person-3", "Sarah Johnson", "Quality Director"),
        ];
        for (id, name, current_role) in people {
            let mut person = Person::new(id, name);
            person.current_role = Some(current_role.into());
            let _ = state.entities.add_person(&add, person);
        }

        if let Ok(chart) = state.org_chart.chart_mut(Phase::Current, &add) {
            for (id, level, role, person) in [
                ("add-head-1", 0, "add-head", "person-3"),
                ("add-qm-inj-1", 1, "add-qm-1", "person-2"),
                ("add-qe-1-1", 2, "add-qe-1", "person-1"),
            ] {
                let mut node = Node::new(id, level);
                node.roles.push(role.into());
                let _ = chart.insert_node(node);
                let _ = chart.assign(role, person);
            }
            let _ = chart.add_connection("add-head-1", "add-qm-inj-1");
            let _ = chart.add_connection("add-qm-inj-1", "add-qe-1-1");
        }

        state.phase.touch(Phase::Current);
        state.refresh_all_availability();
        state
    }
}

/// Availability after a recompute
fn derived_availability(current: Availability, assigned: bool) -> Availability {
    match (assigned, current) {
        (true, _) => Availability::Assigned,
        (false, Availability::PartiallyAvailable) => Availability::PartiallyAvailable,
        (false, _) => Availability::Available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registers_every_partition() {
        let state = OrgState::default();
        for factory in default_factories() {
            assert!(state.entities.roles(&factory).unwrap().is_empty());
            for phase in Phase::ALL {
                assert!(state.org_chart.chart(phase, &factory).unwrap().nodes.is_empty());
            }
        }
        assert_eq!(state.active().phase, Phase::Current);
        assert_eq!(state.active().factory.as_str(), "ADD");
    }

    #[test]
    fn test_serialized_data_has_required_keys() {
        let value = serde_json::to_value(OrgState::default()).unwrap();
        for key in REQUIRED_KEYS {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert!(value["orgChart"]["future"]["BBV"]["nodes"].is_array());
    }

    #[test]
    fn test_sample_availability_is_derived() {
        let state = OrgState::sample();
        let add = FactoryId::from("ADD");
        for person in state.entities.personnel(&add).unwrap() {
            assert_eq!(person.availability, Availability::Assigned);
        }
    }

    #[test]
    fn test_prune_dangling_removes_orphans() {
        let mut state = OrgState::sample();
        let add = FactoryId::from("ADD");
        state.entities.remove_role(&add, "add-qe-1").unwrap();
        state.entities.remove_person(&add, "person-2").unwrap();

        let pruned = state.prune_dangling();

        let chart = state.org_chart.chart(Phase::Current, &add).unwrap();
        assert!(!chart.is_placed("add-qe-1"));
        assert!(chart.assignee("add-qe-1").is_none());
        assert!(chart.assignee("add-qm-1").is_none());
        assert_eq!(pruned, 3);
    }

    #[test]
    fn test_partial_availability_survives_refresh() {
        let mut state = OrgState::default();
        let add = FactoryId::from("ADD");
        let mut person = Person::new("p1", "Lisa Patel");
        person.availability = Availability::PartiallyAvailable;
        state.entities.add_person(&add, person).unwrap();

        state.refresh_availability(&add, "p1");
        assert_eq!(
            state.entities.person(&add, "p1").unwrap().availability,
            Availability::PartiallyAvailable
        );
    }
}
