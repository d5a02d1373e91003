// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Orgdesign library - phase-aware organisation chart planning
//!
//! This crate holds the state model behind the org-design workspace: roles
//! and personnel per focus factory, one chart per (phase, factory), the
//! role-to-person assignment layer, and the mutation, drag-drop and
//! persistence contracts that keep them consistent.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chart;
pub mod commands;
pub mod compare;
pub mod config;
pub mod dragdrop;
pub mod engine;
pub mod entities;
pub mod error;
pub mod persistence;
pub mod selection;
pub mod state;

/// Core data types shared by the stores
pub mod types {
    use crate::error::OrgError;
    use serde::{Deserialize, Serialize};
    use sha2::{Digest, Sha256};
    use std::collections::BTreeMap;
    use std::fmt;
    use std::str::FromStr;

    /// Role identifier, unique within one factory
    pub type RoleId = String;
    /// Person identifier, unique within one factory
    pub type PersonId = String;
    /// Node identifier, unique within one (phase, factory) chart
    pub type NodeId = String;

    // =========================================================================
    // Phase
    // =========================================================================

    /// Planning phase. Each phase carries its own chart per factory.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Phase {
        /// As-is organisation
        Current,
        /// Target organisation
        Future,
        /// Intermediate step between current and future
        Iterative,
    }

    impl Phase {
        /// Every phase, in display order
        pub const ALL: [Phase; 3] = [Phase::Current, Phase::Future, Phase::Iterative];

        /// Short code used in the persisted document
        #[must_use]
        pub fn code(&self) -> &'static str {
            match self {
                Self::Current => "current",
                Self::Future => "future",
                Self::Iterative => "iterative",
            }
        }

        /// Human readable name
        #[must_use]
        pub fn display_name(&self) -> &'static str {
            match self {
                Self::Current => "Current State",
                Self::Future => "Future State",
                Self::Iterative => "Iterative Phase",
            }
        }
    }

    impl fmt::Display for Phase {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.code())
        }
    }

    impl FromStr for Phase {
        type Err = OrgError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_lowercase().as_str() {
                "current" => Ok(Self::Current),
                "future" => Ok(Self::Future),
                "iterative" => Ok(Self::Iterative),
                _ => Err(OrgError::UnknownPhase(s.to_string())),
            }
        }
    }

    // =========================================================================
    // Focus Factory
    // =========================================================================

    /// Focus factory code (e.g. `ADD`). Partitions every collection.
    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FactoryId(String);

    impl FactoryId {
        /// Wrap a factory code
        #[must_use]
        pub fn new(code: impl Into<String>) -> Self {
            Self(code.into())
        }

        /// The raw code
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for FactoryId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<&str> for FactoryId {
        fn from(code: &str) -> Self {
            Self(code.to_string())
        }
    }

    // =========================================================================
    // Roles and Personnel
    // =========================================================================

    /// A role that can be placed on chart nodes
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Role {
        /// Unique within the factory
        pub id: RoleId,
        /// Display title
        pub title: String,
        /// Owning department
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub department: Option<String>,
        /// Responsibilities, in display order
        #[serde(default)]
        pub responsibilities: Vec<String>,
        /// Required skills, in display order
        #[serde(default)]
        pub required_skills: Vec<String>,
    }

    impl Role {
        /// Role with a title and nothing else
        #[must_use]
        pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
            Self {
                id: id.into(),
                title: title.into(),
                department: None,
                responsibilities: Vec::new(),
                required_skills: Vec::new(),
            }
        }

        /// Derive an ID from the factory and title: `add-quality-manager`
        #[must_use]
        pub fn generate_id(factory: &FactoryId, title: &str) -> RoleId {
            format!("{}-{}", factory.as_str().to_lowercase(), slug(title))
        }
    }

    /// Partial update for a role; `None` leaves a field untouched
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RolePatch {
        /// New title
        pub title: Option<String>,
        /// New department
        pub department: Option<String>,
        /// Replacement responsibilities
        pub responsibilities: Option<Vec<String>>,
        /// Replacement required skills
        pub required_skills: Option<Vec<String>>,
    }

    impl RolePatch {
        /// Merge into an existing role
        pub fn apply(self, role: &mut Role) {
            if let Some(title) = self.title {
                role.title = title;
            }
            if let Some(department) = self.department {
                role.department = Some(department);
            }
            if let Some(responsibilities) = self.responsibilities {
                role.responsibilities = responsibilities;
            }
            if let Some(skills) = self.required_skills {
                role.required_skills = skills;
            }
        }
    }

    /// Availability flag kept in step with the assignment layer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum Availability {
        /// Not holding any role
        Available,
        /// Manually flagged as partly committed elsewhere
        #[serde(rename = "Partially Available")]
        PartiallyAvailable,
        /// Holds at least one role in the active phase
        Assigned,
    }

    impl FromStr for Availability {
        type Err = OrgError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_lowercase().replace(&['-', '_', ' '][..], "").as_str() {
                "available" => Ok(Self::Available),
                "partiallyavailable" | "partial" => Ok(Self::PartiallyAvailable),
                "assigned" => Ok(Self::Assigned),
                _ => Err(OrgError::InvalidAvailability(s.to_string())),
            }
        }
    }

    impl fmt::Display for Availability {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                Self::Available => "Available",
                Self::PartiallyAvailable => "Partially Available",
                Self::Assigned => "Assigned",
            })
        }
    }

    /// A member of personnel
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Person {
        /// Unique within the factory
        pub id: PersonId,
        /// Full name
        pub name: String,
        /// Job title held today, free text
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub current_role: Option<String>,
        /// Skills
        #[serde(default)]
        pub skills: Vec<String>,
        /// Experience lines
        #[serde(default)]
        pub experience: Vec<String>,
        /// Derived from assignments, see `engine`
        pub availability: Availability,
    }

    impl Person {
        /// Available person with a name and nothing else
        #[must_use]
        pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
            Self {
                id: id.into(),
                name: name.into(),
                current_role: None,
                skills: Vec::new(),
                experience: Vec::new(),
                availability: Availability::Available,
            }
        }

        /// Derive an ID from the factory and name: `add-emily-chen`
        #[must_use]
        pub fn generate_id(factory: &FactoryId, name: &str) -> PersonId {
            format!("{}-{}", factory.as_str().to_lowercase(), slug(name))
        }
    }

    /// Partial update for a person. Availability is not patchable here.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PersonPatch {
        /// New name
        pub name: Option<String>,
        /// New current role text
        pub current_role: Option<String>,
        /// Replacement skills
        pub skills: Option<Vec<String>>,
        /// Replacement experience
        pub experience: Option<Vec<String>>,
    }

    impl PersonPatch {
        /// Merge into an existing person
        pub fn apply(self, person: &mut Person) {
            if let Some(name) = self.name {
                person.name = name;
            }
            if let Some(current_role) = self.current_role {
                person.current_role = Some(current_role);
            }
            if let Some(skills) = self.skills {
                person.skills = skills;
            }
            if let Some(experience) = self.experience {
                person.experience = experience;
            }
        }
    }

    // =========================================================================
    // Chart
    // =========================================================================

    /// Position in 2D space
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Position {
        /// X coordinate
        pub x: f64,
        /// Y coordinate
        pub y: f64,
    }

    impl Position {
        /// Both coordinates are finite. JSON has no NaN or infinity.
        #[must_use]
        pub fn is_finite(&self) -> bool {
            self.x.is_finite() && self.y.is_finite()
        }
    }

    /// One box in the org chart
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Node {
        /// Unique within the chart
        pub id: NodeId,
        /// Display tier, 0 at the top
        pub level: u32,
        /// Placed role IDs, in display order
        #[serde(default)]
        pub roles: Vec<RoleId>,
        /// Canvas position
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub position: Option<Position>,
        /// Mirror of the inbound connection's source
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub parent_id: Option<NodeId>,
    }

    impl Node {
        /// Empty node at a level
        #[must_use]
        pub fn new(id: impl Into<String>, level: u32) -> Self {
            Self {
                id: id.into(),
                level,
                roles: Vec::new(),
                position: None,
                parent_id: None,
            }
        }

        /// Generate an ID for a node: `<factory>-node-<hash>`
        #[must_use]
        pub fn generate_id(phase: Phase, factory: &FactoryId, level: u32, salt: u64) -> NodeId {
            let mut hasher = Sha256::new();
            hasher.update(phase.code().as_bytes());
            hasher.update(factory.as_str().as_bytes());
            hasher.update(level.to_le_bytes());
            hasher.update(salt.to_le_bytes());
            let hash = hex::encode(hasher.finalize());
            format!("{}-node-{}", factory.as_str().to_lowercase(), &hash[..10])
        }
    }

    /// Reporting line between two nodes
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Connection {
        /// Manager node
        pub source: NodeId,
        /// Report node
        pub target: NodeId,
    }

    impl Connection {
        /// Whether the connection touches a node
        #[must_use]
        pub fn touches(&self, node_id: &str) -> bool {
            self.source == node_id || self.target == node_id
        }
    }

    /// One (phase, factory) chart with its assignment layer
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Chart {
        /// Chart nodes
        #[serde(default)]
        pub nodes: Vec<Node>,
        /// Reporting lines
        #[serde(default)]
        pub connections: Vec<Connection>,
        /// Role ID to person ID
        #[serde(default)]
        pub assignments: BTreeMap<RoleId, PersonId>,
    }

    // =========================================================================
    // Misc
    // =========================================================================

    /// Kind of record an error refers to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum EntityKind {
        /// A role
        Role,
        /// A person
        Person,
        /// A chart node
        Node,
        /// A connection
        Connection,
        /// A role placement on a node
        Placement,
        /// An assignment entry
        Assignment,
        /// A stored backup
        Backup,
    }

    impl fmt::Display for EntityKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                Self::Role => "role",
                Self::Person => "person",
                Self::Node => "node",
                Self::Connection => "connection",
                Self::Placement => "placement",
                Self::Assignment => "assignment",
                Self::Backup => "backup",
            })
        }
    }

    /// Convert a name to a slug for IDs
    #[must_use]
    pub fn slug(name: &str) -> String {
        let raw: String = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();
        raw.split('-').filter(|part| !part.is_empty()).collect::<Vec<_>>().join("-")
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::engine::{Change, Mutation, Workspace};
    pub use crate::error::{OrgError, OrgResult};
    pub use crate::types::*;
}
