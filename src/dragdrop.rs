// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Drag-drop interpreter
//!
//! Turns a finished drag gesture into at most one engine call against the
//! active (phase, factory). Drop targets are parsed once into [`DropZone`]
//! at the boundary; everything after that dispatches on the closed set of
//! variants. Gestures that mean nothing are ignored and logged, never
//! reported as errors. Errors from the engine call itself (for example a
//! person dropped on an unplaced role) are passed back to the caller.

use crate::engine::{Change, Workspace};
use crate::error::OrgResult;
use crate::types::{NodeId, PersonId, RoleId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

const ROLES_LIST: &str = "rolesList";
const PERSONNEL_LIST: &str = "personnelList";
const ROLES_LIST_ALIAS: &str = "roles-list";
const PERSONNEL_LIST_ALIAS: &str = "personnel-list";
const NODE_PREFIX: &str = "org-node-";
const ROLE_PREFIX: &str = "role-";

/// Where a drag started or ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DropZone {
    /// Palette of roles
    RolesList,
    /// Palette of personnel
    PersonnelList,
    /// A node's role list
    #[serde(rename_all = "camelCase")]
    ChartNode {
        /// Node
        node_id: NodeId,
    },
    /// A role's person slot
    #[serde(rename_all = "camelCase")]
    RoleSlot {
        /// Role
        role_id: RoleId,
    },
}

impl DropZone {
    /// Parse a droppable identifier: `rolesList`, `personnelList`,
    /// `org-node-<id>` or `role-<id>`. The lists also accept their
    /// kebab-case spellings; `Display` writes the camelCase ones.
    #[must_use]
    pub fn parse(id: &str) -> Option<Self> {
        match id {
            ROLES_LIST | ROLES_LIST_ALIAS => Some(Self::RolesList),
            PERSONNEL_LIST | PERSONNEL_LIST_ALIAS => Some(Self::PersonnelList),
            _ => {
                if let Some(node_id) = id.strip_prefix(NODE_PREFIX).filter(|s| !s.is_empty()) {
                    Some(Self::ChartNode { node_id: node_id.to_string() })
                } else {
                    id.strip_prefix(ROLE_PREFIX)
                        .filter(|s| !s.is_empty())
                        .map(|role_id| Self::RoleSlot { role_id: role_id.to_string() })
                }
            }
        }
    }
}

impl fmt::Display for DropZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RolesList => f.write_str(ROLES_LIST),
            Self::PersonnelList => f.write_str(PERSONNEL_LIST),
            Self::ChartNode { node_id } => write!(f, "{NODE_PREFIX}{node_id}"),
            Self::RoleSlot { role_id } => write!(f, "{ROLE_PREFIX}{role_id}"),
        }
    }
}

/// A zone plus the index within it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragLocation {
    /// Zone
    pub zone: DropZone,
    /// Position within the zone's list
    pub index: usize,
}

/// A completed drag gesture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragEvent {
    /// Where the item was picked up
    pub source: DragLocation,
    /// Where it was released; `None` when dropped outside any target
    pub destination: Option<DragLocation>,
    /// ID of the dragged role or person
    pub dragged_id: String,
}

/// Why a gesture was ignored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Released outside any target
    NoDestination,
    /// Released where it started
    SamePosition,
    /// A droppable identifier did not parse
    UnrecognizedZone(String),
    /// Valid zones, but the pair means nothing
    UnsupportedPair {
        /// Source zone
        source: DropZone,
        /// Destination zone
        destination: DropZone,
    },
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDestination => f.write_str("dropped outside any target"),
            Self::SamePosition => f.write_str("dropped where it started"),
            Self::UnrecognizedZone(id) => write!(f, "unrecognized drop zone '{id}'"),
            Self::UnsupportedPair { source, destination } => write!(f, "no action for {source} -> {destination}"),
        }
    }
}

/// What a gesture means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropAction {
    /// Role from the palette onto a node
    PlaceRole {
        /// Node
        node_id: NodeId,
        /// Role
        role_id: RoleId,
    },
    /// Person from the palette onto a role slot
    AssignPerson {
        /// Role
        role_id: RoleId,
        /// Person
        person_id: PersonId,
    },
    /// Placed role within or across nodes
    MoveRole {
        /// Role
        role_id: RoleId,
        /// Source node
        from_node: NodeId,
        /// Destination node
        to_node: NodeId,
        /// Destination index
        to_index: usize,
    },
    /// Nothing to do
    Ignore(IgnoreReason),
}

impl DragEvent {
    /// Build an event from raw droppable identifiers
    pub fn from_ids(
        source: (&str, usize),
        destination: Option<(&str, usize)>,
        dragged_id: impl Into<String>,
    ) -> Result<Self, IgnoreReason> {
        let zone = |id: &str| DropZone::parse(id).ok_or_else(|| IgnoreReason::UnrecognizedZone(id.to_string()));
        let source = DragLocation { zone: zone(source.0)?, index: source.1 };
        let destination = match destination {
            Some((id, index)) => Some(DragLocation { zone: zone(id)?, index }),
            None => None,
        };
        Ok(Self { source, destination, dragged_id: dragged_id.into() })
    }
}

/// Classify a gesture into exactly one action
#[must_use]
pub fn classify(event: &DragEvent) -> DropAction {
    let Some(destination) = &event.destination else {
        return DropAction::Ignore(IgnoreReason::NoDestination);
    };
    if event.source == *destination {
        return DropAction::Ignore(IgnoreReason::SamePosition);
    }

    match (&event.source.zone, &destination.zone) {
        (DropZone::RolesList, DropZone::ChartNode { node_id }) => {
            DropAction::PlaceRole { node_id: node_id.clone(), role_id: event.dragged_id.clone() }
        }
        (DropZone::PersonnelList, DropZone::RoleSlot { role_id }) => {
            DropAction::AssignPerson { role_id: role_id.clone(), person_id: event.dragged_id.clone() }
        }
        (DropZone::ChartNode { node_id: from }, DropZone::ChartNode { node_id: to }) => DropAction::MoveRole {
            role_id: event.dragged_id.clone(),
            from_node: from.clone(),
            to_node: to.clone(),
            to_index: destination.index,
        },
        (source, destination) => DropAction::Ignore(IgnoreReason::UnsupportedPair {
            source: source.clone(),
            destination: destination.clone(),
        }),
    }
}

/// Classify a gesture and apply it to the active (phase, factory)
pub fn handle_drop(workspace: &mut Workspace, event: &DragEvent) -> OrgResult<Vec<Change>> {
    let active = workspace.state().active();
    let action = classify(event);
    debug!("Drop {:?} classified as {:?}", event, action);

    match action {
        DropAction::PlaceRole { node_id, role_id } => {
            workspace.place_role(active.phase, &active.factory, &node_id, &role_id)
        }
        DropAction::AssignPerson { role_id, person_id } => {
            workspace.assign_person(active.phase, &active.factory, &role_id, &person_id)
        }
        DropAction::MoveRole { role_id, from_node, to_node, to_index } => {
            workspace.move_role(active.phase, &active.factory, &role_id, &from_node, to_index, &to_node)
        }
        DropAction::Ignore(reason @ IgnoreReason::UnsupportedPair { .. }) => {
            warn!("Ignored drop of {}: {}", event.dragged_id, reason);
            Ok(Vec::new())
        }
        DropAction::Ignore(reason) => {
            debug!("Ignored drop of {}: {}", event.dragged_id, reason);
            Ok(Vec::new())
        }
    }
}
