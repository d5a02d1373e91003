// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Entity store: roles and personnel, partitioned by focus factory
//!
//! The store only manages its own records. Removing a role or a person
//! here does not touch any chart; the cascades live in [`crate::engine`].

use crate::error::{OrgError, OrgResult};
use crate::types::{EntityKind, FactoryId, Person, PersonPatch, Role, RolePatch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Roles and personnel keyed by factory, insertion order preserved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityStore {
    /// Roles per factory
    #[serde(default)]
    pub roles: BTreeMap<FactoryId, Vec<Role>>,
    /// Personnel per factory
    #[serde(default)]
    pub personnel: BTreeMap<FactoryId, Vec<Person>>,
}

impl EntityStore {
    /// Create an empty partition for a factory. Idempotent.
    pub fn register_factory(&mut self, factory: &FactoryId) {
        self.roles.entry(factory.clone()).or_default();
        self.personnel.entry(factory.clone()).or_default();
    }

    // =========================================================================
    // Roles
    // =========================================================================

    /// Roles of a factory, in insertion order
    pub fn roles(&self, factory: &FactoryId) -> OrgResult<&[Role]> {
        self.roles
            .get(factory)
            .map(Vec::as_slice)
            .ok_or_else(|| OrgError::UnknownFactory(factory.to_string()))
    }

    /// Look up a role
    pub fn role(&self, factory: &FactoryId, role_id: &str) -> OrgResult<&Role> {
        self.roles(factory)?
            .iter()
            .find(|r| r.id == role_id)
            .ok_or_else(|| OrgError::not_found(EntityKind::Role, role_id))
    }

    /// Whether a factory has a role
    #[must_use]
    pub fn has_role(&self, factory: &FactoryId, role_id: &str) -> bool {
        self.role(factory, role_id).is_ok()
    }

    /// Append a role; its ID must be unused within the factory
    pub fn add_role(&mut self, factory: &FactoryId, role: Role) -> OrgResult<()> {
        let roles = self
            .roles
            .get_mut(factory)
            .ok_or_else(|| OrgError::UnknownFactory(factory.to_string()))?;
        if roles.iter().any(|r| r.id == role.id) {
            return Err(OrgError::DuplicateId { kind: EntityKind::Role, id: role.id });
        }
        roles.push(role);
        Ok(())
    }

    /// Merge a patch into a role
    pub fn update_role(&mut self, factory: &FactoryId, role_id: &str, patch: RolePatch) -> OrgResult<&Role> {
        let role = self
            .roles
            .get_mut(factory)
            .ok_or_else(|| OrgError::UnknownFactory(factory.to_string()))?
            .iter_mut()
            .find(|r| r.id == role_id)
            .ok_or_else(|| OrgError::not_found(EntityKind::Role, role_id))?;
        patch.apply(role);
        Ok(&*role)
    }

    /// Remove a role record only
    pub fn remove_role(&mut self, factory: &FactoryId, role_id: &str) -> OrgResult<Role> {
        let roles = self
            .roles
            .get_mut(factory)
            .ok_or_else(|| OrgError::UnknownFactory(factory.to_string()))?;
        let index = roles
            .iter()
            .position(|r| r.id == role_id)
            .ok_or_else(|| OrgError::not_found(EntityKind::Role, role_id))?;
        Ok(roles.remove(index))
    }

    // =========================================================================
    // Personnel
    // =========================================================================

    /// Personnel of a factory, in insertion order
    pub fn personnel(&self, factory: &FactoryId) -> OrgResult<&[Person]> {
        self.personnel
            .get(factory)
            .map(Vec::as_slice)
            .ok_or_else(|| OrgError::UnknownFactory(factory.to_string()))
    }

    /// Look up a person
    pub fn person(&self, factory: &FactoryId, person_id: &str) -> OrgResult<&Person> {
        self.personnel(factory)?
            .iter()
            .find(|p| p.id == person_id)
            .ok_or_else(|| OrgError::not_found(EntityKind::Person, person_id))
    }

    /// Mutable lookup, used by the engine to maintain availability
    pub fn person_mut(&mut self, factory: &FactoryId, person_id: &str) -> OrgResult<&mut Person> {
        self.personnel
            .get_mut(factory)
            .ok_or_else(|| OrgError::UnknownFactory(factory.to_string()))?
            .iter_mut()
            .find(|p| p.id == person_id)
            .ok_or_else(|| OrgError::not_found(EntityKind::Person, person_id))
    }

    /// Whether a factory has a person
    #[must_use]
    pub fn has_person(&self, factory: &FactoryId, person_id: &str) -> bool {
        self.person(factory, person_id).is_ok()
    }

    /// Append a person; the ID must be unused within the factory
    pub fn add_person(&mut self, factory: &FactoryId, person: Person) -> OrgResult<()> {
        let personnel = self
            .personnel
            .get_mut(factory)
            .ok_or_else(|| OrgError::UnknownFactory(factory.to_string()))?;
        if personnel.iter().any(|p| p.id == person.id) {
            return Err(OrgError::DuplicateId { kind: EntityKind::Person, id: person.id });
        }
        personnel.push(person);
        Ok(())
    }

    /// Merge a patch into a person
    pub fn update_person(&mut self, factory: &FactoryId, person_id: &str, patch: PersonPatch) -> OrgResult<&Person> {
        let person = self.person_mut(factory, person_id)?;
        patch.apply(person);
        Ok(&*person)
    }

    /// Remove a person record only
    pub fn remove_person(&mut self, factory: &FactoryId, person_id: &str) -> OrgResult<Person> {
        let personnel = self
            .personnel
            .get_mut(factory)
            .ok_or_else(|| OrgError::UnknownFactory(factory.to_string()))?;
        let index = personnel
            .iter()
            .position(|p| p.id == person_id)
            .ok_or_else(|| OrgError::not_found(EntityKind::Person, person_id))?;
        Ok(personnel.remove(index))
    }
}
