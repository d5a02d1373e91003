// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Mutation engine
//!
//! [`Workspace`] owns the [`OrgState`] and is the only way to change it.
//! Every operation validates first and mutates second, so a rejected call
//! leaves the state exactly as it was. Successful calls bump the revision,
//! stamp the phase's `lastModified`, and notify subscribers with the list
//! of [`Change`]s they caused.
//!
//! Policies:
//! - A role that is already held cannot be assigned again; use
//!   [`Workspace::reassign_person`] to replace the holder.
//! - When a role loses its last placement in a chart (unplace or node
//!   deletion) its assignment in that same chart is dropped. Other phases
//!   keep theirs.
//! - Availability is recomputed for the persons an operation touched,
//!   against the active phase's chart of their own factory.

use crate::error::{OrgError, OrgResult};
use crate::state::OrgState;
use crate::types::{
    Availability, EntityKind, FactoryId, NodeId, Person, PersonId, PersonPatch, Phase, Position, Role, RoleId,
    RolePatch,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

/// Something that changed as the result of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    /// Role created, edited or deleted
    Role {
        /// Factory of the role
        factory: FactoryId,
        /// Role ID
        role_id: RoleId,
        /// created, updated or removed
        action: EntityAction,
    },
    /// Person created, edited or deleted
    Person {
        /// Factory of the person
        factory: FactoryId,
        /// Person ID
        person_id: PersonId,
        /// created, updated or removed
        action: EntityAction,
    },
    /// Availability flag moved
    Availability {
        /// Factory of the person
        factory: FactoryId,
        /// Person ID
        person_id: PersonId,
        /// New value
        availability: Availability,
    },
    /// Nodes, connections or placements of a chart changed
    Chart {
        /// Phase of the chart
        phase: Phase,
        /// Factory of the chart
        factory: FactoryId,
        /// What happened
        detail: ChartChange,
    },
    /// Assignment layer of a chart changed
    Assignment {
        /// Phase of the chart
        phase: Phase,
        /// Factory of the chart
        factory: FactoryId,
        /// Role affected
        role_id: RoleId,
        /// New holder, if any
        person_id: Option<PersonId>,
        /// Previous holder, if any
        previous: Option<PersonId>,
    },
    /// Active phase or factory switched, or a factory was registered
    Selection {
        /// Active phase afterwards
        phase: Phase,
        /// Active factory afterwards
        factory: FactoryId,
    },
    /// Whole state swapped (import, restore)
    Replaced,
}

/// Lifecycle step of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityAction {
    /// Inserted
    Created,
    /// Patched
    Updated,
    /// Deleted
    Removed,
}

/// Detail of a chart change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ChartChange {
    /// Node created
    NodeAdded {
        /// New node
        node_id: NodeId,
    },
    /// Node position or level changed
    NodeUpdated {
        /// Node
        node_id: NodeId,
    },
    /// Node deleted
    NodeRemoved {
        /// Node
        node_id: NodeId,
    },
    /// Reporting line added
    Connected {
        /// Manager
        source: NodeId,
        /// Report
        target: NodeId,
    },
    /// Reporting line removed
    Disconnected {
        /// Manager
        source: NodeId,
        /// Report
        target: NodeId,
    },
    /// Role placed on a node
    Placed {
        /// Node
        node_id: NodeId,
        /// Role
        role_id: RoleId,
    },
    /// Role removed from a node
    Unplaced {
        /// Node
        node_id: NodeId,
        /// Role
        role_id: RoleId,
    },
    /// Role moved or reordered
    Moved {
        /// Role
        role_id: RoleId,
        /// Source node
        from: NodeId,
        /// Destination node
        to: NodeId,
        /// Destination index requested
        index: usize,
    },
    /// Chart overwritten from another phase
    Copied {
        /// Source phase
        from: Phase,
    },
    /// Chart emptied
    Cleared,
}

/// A mutation as a value, for callers that queue or log commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Create a role
    AddRole {
        /// Factory
        factory: FactoryId,
        /// Role to insert
        role: Role,
    },
    /// Patch a role
    UpdateRole {
        /// Factory
        factory: FactoryId,
        /// Role
        role_id: RoleId,
        /// Fields to merge
        patch: RolePatch,
    },
    /// Delete a role everywhere
    DeleteRole {
        /// Factory
        factory: FactoryId,
        /// Role
        role_id: RoleId,
    },
    /// Create a person
    AddPerson {
        /// Factory
        factory: FactoryId,
        /// Person to insert
        person: Person,
    },
    /// Patch a person
    UpdatePerson {
        /// Factory
        factory: FactoryId,
        /// Person
        person_id: PersonId,
        /// Fields to merge
        patch: PersonPatch,
    },
    /// Delete a person everywhere
    DeletePerson {
        /// Factory
        factory: FactoryId,
        /// Person
        person_id: PersonId,
    },
    /// Create a node
    AddNode {
        /// Phase
        phase: Phase,
        /// Factory
        factory: FactoryId,
        /// Display level
        level: u32,
    },
    /// Delete a node
    DeleteNode {
        /// Phase
        phase: Phase,
        /// Factory
        factory: FactoryId,
        /// Node
        node_id: NodeId,
    },
    /// Place a role on a node
    PlaceRole {
        /// Phase
        phase: Phase,
        /// Factory
        factory: FactoryId,
        /// Node
        node_id: NodeId,
        /// Role
        role_id: RoleId,
    },
    /// Remove a role from a node
    UnplaceRole {
        /// Phase
        phase: Phase,
        /// Factory
        factory: FactoryId,
        /// Node
        node_id: NodeId,
        /// Role
        role_id: RoleId,
    },
    /// Move or reorder a placed role
    MoveRole {
        /// Phase
        phase: Phase,
        /// Factory
        factory: FactoryId,
        /// Role
        role_id: RoleId,
        /// Source node
        from_node: NodeId,
        /// Destination index
        to_index: usize,
        /// Destination node
        to_node: NodeId,
    },
    /// Assign a person to a vacant role
    AssignPerson {
        /// Phase
        phase: Phase,
        /// Factory
        factory: FactoryId,
        /// Role
        role_id: RoleId,
        /// Person
        person_id: PersonId,
    },
    /// Replace the holder of a role
    ReassignPerson {
        /// Phase
        phase: Phase,
        /// Factory
        factory: FactoryId,
        /// Role
        role_id: RoleId,
        /// Person
        person_id: PersonId,
    },
    /// Vacate a role
    UnassignPerson {
        /// Phase
        phase: Phase,
        /// Factory
        factory: FactoryId,
        /// Role
        role_id: RoleId,
    },
    /// Overwrite one phase's chart with another's
    CopyChart {
        /// Source phase
        from: Phase,
        /// Target phase
        to: Phase,
        /// Factory
        factory: FactoryId,
    },
}

/// Handle returned by [`Workspace::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&Change)>;

/// State container with the mutation operations and change notification
pub struct Workspace {
    state: OrgState,
    revision: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(OrgState::default())
    }
}

impl Workspace {
    /// Wrap a state
    #[must_use]
    pub fn new(state: OrgState) -> Self {
        Self { state, revision: 0, listeners: Vec::new(), next_subscription: 0 }
    }

    /// Read-only view for rendering
    #[must_use]
    pub fn state(&self) -> &OrgState {
        &self.state
    }

    /// Unwrap the state
    #[must_use]
    pub fn into_state(self) -> OrgState {
        self.state
    }

    /// Counter bumped by every successful mutation
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Register a change listener
    pub fn subscribe(&mut self, listener: impl FnMut(&Change) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Drop a change listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() < before
    }

    /// Swap in a whole new state, as an import does
    pub fn replace_state(&mut self, state: OrgState) {
        self.state = state;
        self.state.refresh_all_availability();
        self.commit(None, vec![Change::Replaced]);
    }

    fn commit(&mut self, touched: impl IntoIterator<Item = Phase>, changes: Vec<Change>) -> Vec<Change> {
        for phase in touched {
            self.state.phase.touch(phase);
        }
        self.revision += 1;
        for change in &changes {
            for (_, listener) in &mut self.listeners {
                listener(change);
            }
        }
        changes
    }

    /// Recompute availability for the given persons, recording any flips
    fn refresh(&mut self, factory: &FactoryId, persons: impl IntoIterator<Item = PersonId>, changes: &mut Vec<Change>) {
        for person_id in persons {
            let before = self.state.entities.person(factory, &person_id).map(|p| p.availability).ok();
            self.state.refresh_availability(factory, &person_id);
            let after = self.state.entities.person(factory, &person_id).map(|p| p.availability).ok();
            if let (Some(before), Some(after)) = (before, after) {
                if before != after {
                    debug!("{} availability {} -> {}", person_id, before, after);
                    changes.push(Change::Availability { factory: factory.clone(), person_id, availability: after });
                }
            }
        }
    }

    /// Apply a mutation given as a value
    pub fn apply(&mut self, mutation: Mutation) -> OrgResult<Vec<Change>> {
        match mutation {
            Mutation::AddRole { factory, role } => self.add_role(&factory, role),
            Mutation::UpdateRole { factory, role_id, patch } => self.update_role(&factory, &role_id, patch),
            Mutation::DeleteRole { factory, role_id } => self.delete_role(&factory, &role_id),
            Mutation::AddPerson { factory, person } => self.add_person(&factory, person),
            Mutation::UpdatePerson { factory, person_id, patch } => self.update_person(&factory, &person_id, patch),
            Mutation::DeletePerson { factory, person_id } => self.delete_person(&factory, &person_id).map(|(_, c)| c),
            Mutation::AddNode { phase, factory, level } => self.add_node(phase, &factory, level).map(|(_, c)| c),
            Mutation::DeleteNode { phase, factory, node_id } => self.delete_node(phase, &factory, &node_id),
            Mutation::PlaceRole { phase, factory, node_id, role_id } => {
                self.place_role(phase, &factory, &node_id, &role_id)
            }
            Mutation::UnplaceRole { phase, factory, node_id, role_id } => {
                self.unplace_role(phase, &factory, &node_id, &role_id)
            }
            Mutation::MoveRole { phase, factory, role_id, from_node, to_index, to_node } => {
                self.move_role(phase, &factory, &role_id, &from_node, to_index, &to_node)
            }
            Mutation::AssignPerson { phase, factory, role_id, person_id } => {
                self.assign_person(phase, &factory, &role_id, &person_id)
            }
            Mutation::ReassignPerson { phase, factory, role_id, person_id } => {
                self.reassign_person(phase, &factory, &role_id, &person_id)
            }
            Mutation::UnassignPerson { phase, factory, role_id } => self.unassign_person(phase, &factory, &role_id),
            Mutation::CopyChart { from, to, factory } => self.copy_chart(from, to, &factory),
        }
    }

    // =========================================================================
    // Roles
    // =========================================================================

    /// Create a role in a factory
    pub fn add_role(&mut self, factory: &FactoryId, role: Role) -> OrgResult<Vec<Change>> {
        self.state.focus_factory.ensure(factory)?;
        let role_id = role.id.clone();
        self.state.entities.add_role(factory, role)?;
        info!("Added role {} to {}", role_id, factory);
        Ok(self.commit(None, vec![Change::Role { factory: factory.clone(), role_id, action: EntityAction::Created }]))
    }

    /// Patch a role
    pub fn update_role(&mut self, factory: &FactoryId, role_id: &str, patch: RolePatch) -> OrgResult<Vec<Change>> {
        self.state.focus_factory.ensure(factory)?;
        self.state.entities.update_role(factory, role_id, patch)?;
        Ok(self.commit(
            None,
            vec![Change::Role { factory: factory.clone(), role_id: role_id.into(), action: EntityAction::Updated }],
        ))
    }

    /// Delete a role and every reference to it: placements on every node
    /// and assignments in every phase of the factory.
    pub fn delete_role(&mut self, factory: &FactoryId, role_id: &str) -> OrgResult<Vec<Change>> {
        self.state.focus_factory.ensure(factory)?;
        self.state.entities.role(factory, role_id)?;

        let mut changes = Vec::new();
        let mut displaced = BTreeSet::new();
        let mut touched = BTreeSet::new();
        for (phase, chart) in self.state.org_chart.charts_of_mut(factory) {
            for node in &mut chart.nodes {
                if let Some(index) = node.roles.iter().position(|r| r == role_id) {
                    node.roles.remove(index);
                    touched.insert(phase);
                    changes.push(Change::Chart {
                        phase,
                        factory: factory.clone(),
                        detail: ChartChange::Unplaced { node_id: node.id.clone(), role_id: role_id.into() },
                    });
                }
            }
            if let Some(previous) = chart.unassign(role_id) {
                changes.push(Change::Assignment {
                    phase,
                    factory: factory.clone(),
                    role_id: role_id.into(),
                    person_id: None,
                    previous: Some(previous.clone()),
                });
                displaced.insert(previous);
                touched.insert(phase);
            }
        }
        self.state.entities.remove_role(factory, role_id)?;
        changes.push(Change::Role { factory: factory.clone(), role_id: role_id.into(), action: EntityAction::Removed });

        self.refresh(factory, displaced, &mut changes);
        info!("Deleted role {} from {} ({} dependent changes)", role_id, factory, changes.len() - 1);
        Ok(self.commit(touched, changes))
    }

    // =========================================================================
    // Personnel
    // =========================================================================

    /// Create a person in a factory. Availability is derived, so whatever
    /// the caller passed is recomputed.
    pub fn add_person(&mut self, factory: &FactoryId, person: Person) -> OrgResult<Vec<Change>> {
        self.state.focus_factory.ensure(factory)?;
        let person_id = person.id.clone();
        self.state.entities.add_person(factory, person)?;
        self.state.refresh_availability(factory, &person_id);
        info!("Added person {} to {}", person_id, factory);
        Ok(self.commit(
            None,
            vec![Change::Person { factory: factory.clone(), person_id, action: EntityAction::Created }],
        ))
    }

    /// Patch a person
    pub fn update_person(&mut self, factory: &FactoryId, person_id: &str, patch: PersonPatch) -> OrgResult<Vec<Change>> {
        self.state.focus_factory.ensure(factory)?;
        self.state.entities.update_person(factory, person_id, patch)?;
        Ok(self.commit(
            None,
            vec![Change::Person { factory: factory.clone(), person_id: person_id.into(), action: EntityAction::Updated }],
        ))
    }

    /// Set the manual part of availability. `Assigned` is derived and cannot
    /// be set by hand; a person who holds a role stays `Assigned`.
    pub fn set_availability(
        &mut self,
        factory: &FactoryId,
        person_id: &str,
        availability: Availability,
    ) -> OrgResult<Vec<Change>> {
        self.state.focus_factory.ensure(factory)?;
        if availability == Availability::Assigned {
            return Err(OrgError::InvalidAvailability(availability.to_string()));
        }
        self.state.entities.person_mut(factory, person_id)?.availability = availability;
        self.state.refresh_availability(factory, person_id);
        let after = self.state.entities.person(factory, person_id)?.availability;
        Ok(self.commit(
            None,
            vec![Change::Availability { factory: factory.clone(), person_id: person_id.into(), availability: after }],
        ))
    }

    /// Delete a person and every assignment they hold, in every phase.
    /// Returns the removed record with its availability reset.
    pub fn delete_person(&mut self, factory: &FactoryId, person_id: &str) -> OrgResult<(Person, Vec<Change>)> {
        self.state.focus_factory.ensure(factory)?;
        self.state.entities.person(factory, person_id)?;

        let mut changes = Vec::new();
        let mut touched = BTreeSet::new();
        for (phase, chart) in self.state.org_chart.charts_of_mut(factory) {
            let held: Vec<RoleId> = chart.roles_of(person_id).into_iter().cloned().collect();
            if !held.is_empty() {
                touched.insert(phase);
            }
            for role_id in held {
                chart.unassign(&role_id);
                changes.push(Change::Assignment {
                    phase,
                    factory: factory.clone(),
                    role_id,
                    person_id: None,
                    previous: Some(person_id.into()),
                });
            }
        }
        let mut person = self.state.entities.remove_person(factory, person_id)?;
        person.availability = Availability::Available;
        changes.push(Change::Person { factory: factory.clone(), person_id: person_id.into(), action: EntityAction::Removed });

        info!("Deleted person {} from {}", person_id, factory);
        Ok((person, self.commit(touched, changes)))
    }

    // =========================================================================
    // Nodes and connections
    // =========================================================================

    /// Create an empty node at a level. Returns its ID.
    pub fn add_node(&mut self, phase: Phase, factory: &FactoryId, level: u32) -> OrgResult<(NodeId, Vec<Change>)> {
        self.state.ensure(phase, factory)?;
        let node_id = self.state.org_chart.add_node(phase, factory, level)?;
        debug!("Added node {} at level {} in {}/{}", node_id, level, phase, factory);
        let changes = vec![Change::Chart {
            phase,
            factory: factory.clone(),
            detail: ChartChange::NodeAdded { node_id: node_id.clone() },
        }];
        Ok((node_id, self.commit(Some(phase), changes)))
    }

    /// Create a node one level below `parent_id`, reporting to it
    pub fn add_child_node(
        &mut self,
        phase: Phase,
        factory: &FactoryId,
        parent_id: &str,
    ) -> OrgResult<(NodeId, Vec<Change>)> {
        self.state.ensure(phase, factory)?;
        let parent_level = self.state.org_chart.chart(phase, factory)?.node(parent_id)?.level;
        let level = parent_level
            .checked_add(1)
            .ok_or_else(|| OrgError::LevelOverflow { parent_id: parent_id.into(), level: parent_level })?;
        let node_id = self.state.org_chart.add_node(phase, factory, level)?;
        self.state.org_chart.chart_mut(phase, factory)?.add_connection(parent_id, &node_id)?;
        let changes = vec![
            Change::Chart { phase, factory: factory.clone(), detail: ChartChange::NodeAdded { node_id: node_id.clone() } },
            Change::Chart {
                phase,
                factory: factory.clone(),
                detail: ChartChange::Connected { source: parent_id.into(), target: node_id.clone() },
            },
        ];
        Ok((node_id, self.commit(Some(phase), changes)))
    }

    /// Move a node on the canvas or to another level
    pub fn update_node(
        &mut self,
        phase: Phase,
        factory: &FactoryId,
        node_id: &str,
        position: Option<Position>,
        level: Option<u32>,
    ) -> OrgResult<Vec<Change>> {
        self.state.ensure(phase, factory)?;
        self.state.org_chart.update_node(phase, factory, node_id, position, level)?;
        Ok(self.commit(
            Some(phase),
            vec![Change::Chart { phase, factory: factory.clone(), detail: ChartChange::NodeUpdated { node_id: node_id.into() } }],
        ))
    }

    /// Delete a node with its reporting lines. Roles that were placed only
    /// on this node lose their assignment in this chart.
    pub fn delete_node(&mut self, phase: Phase, factory: &FactoryId, node_id: &str) -> OrgResult<Vec<Change>> {
        self.state.ensure(phase, factory)?;
        let chart = self.state.org_chart.chart_mut(phase, factory)?;
        let node = chart.remove_node(node_id)?;

        let mut changes = vec![Change::Chart {
            phase,
            factory: factory.clone(),
            detail: ChartChange::NodeRemoved { node_id: node_id.into() },
        }];
        let mut displaced = BTreeSet::new();
        for role_id in &node.roles {
            if chart.is_placed(role_id) {
                continue;
            }
            if let Some(previous) = chart.unassign(role_id) {
                changes.push(Change::Assignment {
                    phase,
                    factory: factory.clone(),
                    role_id: role_id.clone(),
                    person_id: None,
                    previous: Some(previous.clone()),
                });
                displaced.insert(previous);
            }
        }
        self.refresh(factory, displaced, &mut changes);
        info!("Deleted node {} in {}/{}", node_id, phase, factory);
        Ok(self.commit(Some(phase), changes))
    }

    /// Add a reporting line `source -> target`
    pub fn add_connection(&mut self, phase: Phase, factory: &FactoryId, source: &str, target: &str) -> OrgResult<Vec<Change>> {
        self.state.ensure(phase, factory)?;
        self.state.org_chart.chart_mut(phase, factory)?.add_connection(source, target)?;
        Ok(self.commit(
            Some(phase),
            vec![Change::Chart {
                phase,
                factory: factory.clone(),
                detail: ChartChange::Connected { source: source.into(), target: target.into() },
            }],
        ))
    }

    /// Remove a reporting line
    pub fn remove_connection(
        &mut self,
        phase: Phase,
        factory: &FactoryId,
        source: &str,
        target: &str,
    ) -> OrgResult<Vec<Change>> {
        self.state.ensure(phase, factory)?;
        self.state.org_chart.chart_mut(phase, factory)?.remove_connection(source, target)?;
        Ok(self.commit(
            Some(phase),
            vec![Change::Chart {
                phase,
                factory: factory.clone(),
                detail: ChartChange::Disconnected { source: source.into(), target: target.into() },
            }],
        ))
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Place a role on a node. Placing it twice is a no-op.
    pub fn place_role(&mut self, phase: Phase, factory: &FactoryId, node_id: &str, role_id: &str) -> OrgResult<Vec<Change>> {
        self.state.ensure(phase, factory)?;
        self.state.entities.role(factory, role_id)?;
        let placed = self.state.org_chart.chart_mut(phase, factory)?.place_role(node_id, role_id)?;
        if !placed {
            debug!("Role {} already on {}", role_id, node_id);
            return Ok(Vec::new());
        }
        info!("Placed {} on {} in {}/{}", role_id, node_id, phase, factory);
        Ok(self.commit(
            Some(phase),
            vec![Change::Chart {
                phase,
                factory: factory.clone(),
                detail: ChartChange::Placed { node_id: node_id.into(), role_id: role_id.into() },
            }],
        ))
    }

    /// Remove a role from a node. If that was its last placement in the
    /// chart, its assignment there is dropped as well.
    pub fn unplace_role(&mut self, phase: Phase, factory: &FactoryId, node_id: &str, role_id: &str) -> OrgResult<Vec<Change>> {
        self.state.ensure(phase, factory)?;
        let chart = self.state.org_chart.chart_mut(phase, factory)?;
        chart.unplace_role(node_id, role_id)?;

        let mut changes = vec![Change::Chart {
            phase,
            factory: factory.clone(),
            detail: ChartChange::Unplaced { node_id: node_id.into(), role_id: role_id.into() },
        }];
        let mut displaced = None;
        if !chart.is_placed(role_id) {
            if let Some(previous) = chart.unassign(role_id) {
                changes.push(Change::Assignment {
                    phase,
                    factory: factory.clone(),
                    role_id: role_id.into(),
                    person_id: None,
                    previous: Some(previous.clone()),
                });
                displaced = Some(previous);
            }
        }
        self.refresh(factory, displaced, &mut changes);
        Ok(self.commit(Some(phase), changes))
    }

    /// Move a placed role to another node, or reorder it within its node
    pub fn move_role(
        &mut self,
        phase: Phase,
        factory: &FactoryId,
        role_id: &str,
        from_node: &str,
        to_index: usize,
        to_node: &str,
    ) -> OrgResult<Vec<Change>> {
        self.state.ensure(phase, factory)?;
        self.state.org_chart.chart_mut(phase, factory)?.move_role(role_id, from_node, to_index, to_node)?;
        debug!("Moved {} from {} to {}[{}]", role_id, from_node, to_node, to_index);
        Ok(self.commit(
            Some(phase),
            vec![Change::Chart {
                phase,
                factory: factory.clone(),
                detail: ChartChange::Moved {
                    role_id: role_id.into(),
                    from: from_node.into(),
                    to: to_node.into(),
                    index: to_index,
                },
            }],
        ))
    }

    // =========================================================================
    // Assignment
    // =========================================================================

    fn validate_assignment(&self, phase: Phase, factory: &FactoryId, role_id: &str, person_id: &str) -> OrgResult<()> {
        self.state.ensure(phase, factory)?;
        self.state.entities.role(factory, role_id)?;
        self.state.entities.person(factory, person_id)?;
        Ok(())
    }

    /// Assign a person to a placed, vacant role
    pub fn assign_person(&mut self, phase: Phase, factory: &FactoryId, role_id: &str, person_id: &str) -> OrgResult<Vec<Change>> {
        self.validate_assignment(phase, factory, role_id, person_id)?;
        let chart = self.state.org_chart.chart_mut(phase, factory)?;
        if chart.assignee(role_id).is_some_and(|p| p == person_id) {
            return Ok(Vec::new());
        }
        chart.assign(role_id, person_id)?;

        let mut changes = vec![Change::Assignment {
            phase,
            factory: factory.clone(),
            role_id: role_id.into(),
            person_id: Some(person_id.into()),
            previous: None,
        }];
        self.refresh(factory, [person_id.to_string()], &mut changes);
        info!("Assigned {} to {} in {}/{}", person_id, role_id, phase, factory);
        Ok(self.commit(Some(phase), changes))
    }

    /// Assign a person to a placed role, displacing the current holder
    pub fn reassign_person(&mut self, phase: Phase, factory: &FactoryId, role_id: &str, person_id: &str) -> OrgResult<Vec<Change>> {
        self.validate_assignment(phase, factory, role_id, person_id)?;
        let chart = self.state.org_chart.chart_mut(phase, factory)?;
        if chart.assignee(role_id).is_some_and(|p| p == person_id) {
            return Ok(Vec::new());
        }
        let displaced = chart.reassign(role_id, person_id)?;

        let mut changes = vec![Change::Assignment {
            phase,
            factory: factory.clone(),
            role_id: role_id.into(),
            person_id: Some(person_id.into()),
            previous: displaced.clone(),
        }];
        let affected: Vec<PersonId> = std::iter::once(person_id.to_string()).chain(displaced).collect();
        self.refresh(factory, affected, &mut changes);
        info!("Reassigned {} to {} in {}/{}", role_id, person_id, phase, factory);
        Ok(self.commit(Some(phase), changes))
    }

    /// Vacate a role
    pub fn unassign_person(&mut self, phase: Phase, factory: &FactoryId, role_id: &str) -> OrgResult<Vec<Change>> {
        self.state.ensure(phase, factory)?;
        let previous = self
            .state
            .org_chart
            .chart_mut(phase, factory)?
            .unassign(role_id)
            .ok_or_else(|| OrgError::not_found(EntityKind::Assignment, role_id))?;

        let mut changes = vec![Change::Assignment {
            phase,
            factory: factory.clone(),
            role_id: role_id.into(),
            person_id: None,
            previous: Some(previous.clone()),
        }];
        self.refresh(factory, [previous], &mut changes);
        Ok(self.commit(Some(phase), changes))
    }

    // =========================================================================
    // Phases
    // =========================================================================

    /// Overwrite `to`'s chart and assignments with a copy of `from`'s
    pub fn copy_chart(&mut self, from: Phase, to: Phase, factory: &FactoryId) -> OrgResult<Vec<Change>> {
        self.state.ensure(from, factory)?;
        self.state.ensure(to, factory)?;
        if from == to {
            return Ok(Vec::new());
        }
        let mut affected: BTreeSet<PersonId> =
            self.state.org_chart.chart(to, factory)?.assignments.values().cloned().collect();
        self.state.org_chart.copy_chart(from, to, factory)?;
        affected.extend(self.state.org_chart.chart(to, factory)?.assignments.values().cloned());

        let mut changes = vec![Change::Chart { phase: to, factory: factory.clone(), detail: ChartChange::Copied { from } }];
        self.refresh(factory, affected, &mut changes);
        info!("Copied {} chart of {} into {}", from, factory, to);
        Ok(self.commit(Some(to), changes))
    }

    /// Empty a chart so the phase starts from scratch
    pub fn clear_chart(&mut self, phase: Phase, factory: &FactoryId) -> OrgResult<Vec<Change>> {
        self.state.ensure(phase, factory)?;
        let old = self.state.org_chart.clear_chart(phase, factory)?;
        let mut changes = vec![Change::Chart { phase, factory: factory.clone(), detail: ChartChange::Cleared }];
        self.refresh(factory, old.assignments.into_values(), &mut changes);
        Ok(self.commit(Some(phase), changes))
    }

    /// Switch the active phase. Availability is recomputed for everyone.
    pub fn select_phase(&mut self, phase: Phase) -> OrgResult<Vec<Change>> {
        self.state.phase.set_current(phase)?;
        self.state.refresh_all_availability();
        let active = self.state.active();
        Ok(self.commit(None, vec![Change::Selection { phase: active.phase, factory: active.factory }]))
    }

    /// Switch the active factory
    pub fn select_factory(&mut self, factory: &FactoryId) -> OrgResult<Vec<Change>> {
        self.state.focus_factory.set_current(factory)?;
        let active = self.state.active();
        Ok(self.commit(None, vec![Change::Selection { phase: active.phase, factory: active.factory }]))
    }

    /// Register a new factory with empty partitions. Registering a known
    /// factory changes nothing.
    pub fn register_factory(&mut self, factory: &FactoryId) -> OrgResult<Vec<Change>> {
        if !self.state.register_factory(factory) {
            return Ok(Vec::new());
        }
        info!("Registered factory {}", factory);
        let active = self.state.active();
        Ok(self.commit(None, vec![Change::Selection { phase: active.phase, factory: active.factory }]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn workspace() -> (Workspace, FactoryId, NodeId) {
        let mut ws = Workspace::default();
        let add = FactoryId::from("ADD");
        ws.add_role(&add, Role::new("r1", "Quality Manager")).unwrap();
        ws.add_person(&add, Person::new("p1", "Emily Chen")).unwrap();
        ws.add_person(&add, Person::new("p2", "Michael Rodriguez")).unwrap();
        let (n1, _) = ws.add_node(Phase::Current, &add, 0).unwrap();
        (ws, add, n1)
    }

    fn availability(ws: &Workspace, factory: &FactoryId, person: &str) -> Availability {
        ws.state().entities.person(factory, person).unwrap().availability
    }

    /// Reset every phase's `lastModified` so later stamps are attributable
    fn clear_stamps(ws: &mut Workspace) {
        let mut state = ws.state().clone();
        for info in state.phase.phases.values_mut() {
            info.last_modified = None;
        }
        ws.replace_state(state);
    }

    fn stamped(ws: &Workspace) -> Vec<Phase> {
        ws.state().phase.phases.iter().filter(|(_, info)| info.last_modified.is_some()).map(|(p, _)| *p).collect()
    }

    #[test]
    fn test_place_unknown_role_is_rejected() {
        let (mut ws, add, n1) = workspace();
        let err = ws.place_role(Phase::Current, &add, &n1, "ghost").unwrap_err();
        assert!(matches!(err, OrgError::NotFound { kind: EntityKind::Role, .. }));
    }

    #[test]
    fn test_second_assignment_is_rejected_and_reassign_replaces() {
        let (mut ws, add, n1) = workspace();
        ws.place_role(Phase::Current, &add, &n1, "r1").unwrap();
        ws.assign_person(Phase::Current, &add, "r1", "p1").unwrap();

        let err = ws.assign_person(Phase::Current, &add, "r1", "p2").unwrap_err();
        assert_eq!(err, OrgError::RoleOccupied { role_id: "r1".into(), person_id: "p1".into() });

        let changes = ws.reassign_person(Phase::Current, &add, "r1", "p2").unwrap();
        assert!(changes.iter().any(|c| matches!(c, Change::Availability { person_id, availability: Availability::Available, .. } if person_id == "p1")));
        assert_eq!(availability(&ws, &add, "p1"), Availability::Available);
        assert_eq!(availability(&ws, &add, "p2"), Availability::Assigned);
    }

    #[test]
    fn test_unplace_last_placement_unassigns() {
        let (mut ws, add, n1) = workspace();
        let (n2, _) = ws.add_node(Phase::Current, &add, 1).unwrap();
        ws.place_role(Phase::Current, &add, &n1, "r1").unwrap();
        ws.place_role(Phase::Current, &add, &n2, "r1").unwrap();
        ws.assign_person(Phase::Current, &add, "r1", "p1").unwrap();

        ws.unplace_role(Phase::Current, &add, &n1, "r1").unwrap();
        assert!(ws.state().org_chart.chart(Phase::Current, &add).unwrap().assignee("r1").is_some());

        ws.unplace_role(Phase::Current, &add, &n2, "r1").unwrap();
        assert!(ws.state().org_chart.chart(Phase::Current, &add).unwrap().assignee("r1").is_none());
        assert_eq!(availability(&ws, &add, "p1"), Availability::Available);
    }

    #[test]
    fn test_delete_node_applies_placement_loss_only_in_its_chart() {
        let (mut ws, add, n1) = workspace();
        ws.place_role(Phase::Current, &add, &n1, "r1").unwrap();
        ws.assign_person(Phase::Current, &add, "r1", "p1").unwrap();
        ws.copy_chart(Phase::Current, Phase::Future, &add).unwrap();

        ws.delete_node(Phase::Current, &add, &n1).unwrap();

        let state = ws.state();
        assert!(state.org_chart.chart(Phase::Current, &add).unwrap().assignments.is_empty());
        assert_eq!(
            state.org_chart.chart(Phase::Future, &add).unwrap().assignee("r1").map(String::as_str),
            Some("p1")
        );
        assert_eq!(availability(&ws, &add, "p1"), Availability::Available);
    }

    #[test]
    fn test_availability_follows_active_phase() {
        let (mut ws, add, n1) = workspace();
        ws.copy_chart(Phase::Current, Phase::Future, &add).unwrap();
        ws.place_role(Phase::Future, &add, &n1, "r1").unwrap();
        ws.assign_person(Phase::Future, &add, "r1", "p1").unwrap();
        assert_eq!(availability(&ws, &add, "p1"), Availability::Available);

        ws.select_phase(Phase::Future).unwrap();
        assert_eq!(availability(&ws, &add, "p1"), Availability::Assigned);
    }

    #[test]
    fn test_rejected_operation_leaves_state_untouched() {
        let (mut ws, add, _) = workspace();
        let before = ws.state().clone();
        let revision = ws.revision();

        assert!(ws.delete_role(&add, "ghost").is_err());
        assert!(ws.delete_node(Phase::Current, &add, "ghost").is_err());
        assert!(ws.assign_person(Phase::Current, &add, "r1", "p1").is_err());
        assert!(ws.place_role(Phase::Current, &FactoryId::from("XYZ"), "n", "r1").is_err());

        assert_eq!(ws.state(), &before);
        assert_eq!(ws.revision(), revision);
    }

    #[test]
    fn test_manual_availability() {
        let (mut ws, add, n1) = workspace();
        ws.set_availability(&add, "p2", Availability::PartiallyAvailable).unwrap();
        assert_eq!(availability(&ws, &add, "p2"), Availability::PartiallyAvailable);
        assert!(ws.set_availability(&add, "p2", Availability::Assigned).is_err());

        ws.place_role(Phase::Current, &add, &n1, "r1").unwrap();
        ws.assign_person(Phase::Current, &add, "r1", "p2").unwrap();
        ws.set_availability(&add, "p2", Availability::Available).unwrap();
        assert_eq!(availability(&ws, &add, "p2"), Availability::Assigned);
    }

    #[test]
    fn test_subscribers_see_changes() {
        let (mut ws, add, n1) = workspace();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = ws.subscribe(move |change| sink.borrow_mut().push(change.clone()));

        ws.place_role(Phase::Current, &add, &n1, "r1").unwrap();
        assert_eq!(seen.borrow().len(), 1);

        assert!(ws.unsubscribe(id));
        ws.assign_person(Phase::Current, &add, "r1", "p1").unwrap();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_apply_dispatches_mutation_values() {
        let (mut ws, add, n1) = workspace();
        let json = format!(
            r#"{{"op":"place_role","phase":"current","factory":"ADD","node_id":"{n1}","role_id":"r1"}}"#
        );
        let mutation: Mutation = serde_json::from_str(&json).unwrap();
        ws.apply(mutation).unwrap();
        assert!(ws.state().org_chart.chart(Phase::Current, &add).unwrap().is_placed("r1"));
    }

    #[test]
    fn test_add_child_node_sets_level_and_parent() {
        let (mut ws, add, n1) = workspace();
        let (child, _) = ws.add_child_node(Phase::Current, &add, &n1).unwrap();
        let chart = ws.state().org_chart.chart(Phase::Current, &add).unwrap();
        let node = chart.node(&child).unwrap();
        assert_eq!(node.level, 1);
        assert_eq!(node.parent_id.as_deref(), Some(n1.as_str()));
        assert_eq!(chart.connections.len(), 1);
    }

    #[test]
    fn test_add_child_node_below_deepest_level_is_rejected() {
        let (mut ws, add, _) = workspace();
        let (deepest, _) = ws.add_node(Phase::Current, &add, u32::MAX).unwrap();
        let before = ws.state().clone();
        let revision = ws.revision();

        let err = ws.add_child_node(Phase::Current, &add, &deepest).unwrap_err();

        assert_eq!(err, OrgError::LevelOverflow { parent_id: deepest, level: u32::MAX });
        assert_eq!(ws.state(), &before);
        assert_eq!(ws.revision(), revision);
    }

    #[test]
    fn test_delete_role_stamps_only_the_phases_it_changed() {
        let (mut ws, add, n1) = workspace();
        ws.add_role(&add, Role::new("r2", "Auditor")).unwrap();
        ws.place_role(Phase::Current, &add, &n1, "r1").unwrap();
        ws.assign_person(Phase::Current, &add, "r1", "p1").unwrap();
        ws.copy_chart(Phase::Current, Phase::Future, &add).unwrap();
        clear_stamps(&mut ws);

        ws.delete_role(&add, "r2").unwrap();
        assert!(stamped(&ws).is_empty());

        ws.delete_role(&add, "r1").unwrap();
        assert_eq!(stamped(&ws), vec![Phase::Current, Phase::Future]);
    }

    #[test]
    fn test_delete_person_stamps_only_the_phases_it_changed() {
        let (mut ws, add, n1) = workspace();
        ws.copy_chart(Phase::Current, Phase::Future, &add).unwrap();
        ws.place_role(Phase::Future, &add, &n1, "r1").unwrap();
        ws.assign_person(Phase::Future, &add, "r1", "p1").unwrap();
        clear_stamps(&mut ws);

        ws.delete_person(&add, "p2").unwrap();
        assert!(stamped(&ws).is_empty());

        ws.delete_person(&add, "p1").unwrap();
        assert_eq!(stamped(&ws), vec![Phase::Future]);
    }
}
