// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Phase and focus factory selection

use crate::error::{OrgError, OrgResult};
use crate::types::{FactoryId, Phase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata for one phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseInfo {
    /// Display name
    pub name: String,
    /// Last chart mutation in this phase
    pub last_modified: Option<DateTime<Utc>>,
}

/// Active phase plus per-phase metadata (`data.phase` in the document)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseState {
    /// Phase the user is working in
    pub current_phase: Phase,
    /// Registered phases
    pub phases: BTreeMap<Phase, PhaseInfo>,
}

impl PhaseState {
    /// State with the given phases registered and the first one active
    #[must_use]
    pub fn new(phases: &[Phase]) -> Self {
        let phases: BTreeMap<Phase, PhaseInfo> = phases
            .iter()
            .map(|p| (*p, PhaseInfo { name: p.display_name().to_string(), last_modified: None }))
            .collect();
        let current_phase = phases.keys().next().copied().unwrap_or(Phase::Current);
        Self { current_phase, phases }
    }

    /// Fail unless the phase is registered
    pub fn ensure(&self, phase: Phase) -> OrgResult<()> {
        if self.phases.contains_key(&phase) {
            Ok(())
        } else {
            Err(OrgError::UnknownPhase(phase.to_string()))
        }
    }

    /// Switch the active phase
    pub fn set_current(&mut self, phase: Phase) -> OrgResult<()> {
        self.ensure(phase)?;
        self.current_phase = phase;
        Ok(())
    }

    /// Stamp a phase as modified now
    pub fn touch(&mut self, phase: Phase) {
        if let Some(info) = self.phases.get_mut(&phase) {
            info.last_modified = Some(Utc::now());
        }
    }
}

/// Active factory plus the registered set (`data.focusFactory`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryState {
    /// Factory the user is working in
    pub current_factory: FactoryId,
    /// Registered factories, in display order
    pub factories: Vec<FactoryId>,
}

impl FactoryState {
    /// State with the given factories, the first one active
    #[must_use]
    pub fn new(factories: &[FactoryId]) -> Self {
        Self {
            current_factory: factories.first().cloned().unwrap_or_else(|| FactoryId::from("DEFAULT")),
            factories: factories.to_vec(),
        }
    }

    /// Fail unless the factory is registered
    pub fn ensure(&self, factory: &FactoryId) -> OrgResult<()> {
        if self.factories.contains(factory) {
            Ok(())
        } else {
            Err(OrgError::UnknownFactory(factory.to_string()))
        }
    }

    /// Switch the active factory
    pub fn set_current(&mut self, factory: &FactoryId) -> OrgResult<()> {
        self.ensure(factory)?;
        self.current_factory = factory.clone();
        Ok(())
    }

    /// Add a factory to the registered set. Returns false if already there.
    pub fn register(&mut self, factory: &FactoryId) -> bool {
        if self.factories.contains(factory) {
            return false;
        }
        self.factories.push(factory.clone());
        true
    }
}

/// The (phase, factory) pair the user is looking at
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActiveContext {
    /// Active phase
    pub phase: Phase,
    /// Active factory
    pub factory: FactoryId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_switch_validates() {
        let mut state = PhaseState::new(&[Phase::Current, Phase::Future]);
        assert_eq!(state.current_phase, Phase::Current);
        state.set_current(Phase::Future).unwrap();
        assert_eq!(state.current_phase, Phase::Future);
        assert_eq!(state.set_current(Phase::Iterative), Err(OrgError::UnknownPhase("iterative".into())));
        assert_eq!(state.current_phase, Phase::Future);
    }

    #[test]
    fn test_touch_stamps_last_modified() {
        let mut state = PhaseState::new(&Phase::ALL);
        assert!(state.phases[&Phase::Future].last_modified.is_none());
        state.touch(Phase::Future);
        assert!(state.phases[&Phase::Future].last_modified.is_some());
    }

    #[test]
    fn test_factory_registration() {
        let mut state = FactoryState::new(&[FactoryId::from("ADD")]);
        assert!(state.register(&FactoryId::from("BBV")));
        assert!(!state.register(&FactoryId::from("BBV")));
        state.set_current(&FactoryId::from("BBV")).unwrap();
        assert!(state.set_current(&FactoryId::from("XYZ")).is_err());
        assert_eq!(state.current_factory.as_str(), "BBV");
    }
}
