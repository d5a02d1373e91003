// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Structured errors returned by the stores, the mutation engine and the
//! persistence gateway

use crate::types::{EntityKind, PersonId, RoleId};
use thiserror::Error;

/// Result alias used across the library
pub type OrgResult<T> = Result<T, OrgError>;

/// Every failure the core can report. The UI maps these to messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrgError {
    /// Referenced record does not exist
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was looked up
        kind: EntityKind,
        /// The missing ID
        id: String,
    },

    /// Factory is not in the registered set
    #[error("unknown focus factory: {0}")]
    UnknownFactory(String),

    /// Phase is not in the enumerated set
    #[error("unknown phase: {0}")]
    UnknownPhase(String),

    /// Assignment attempted for a role that no node carries
    #[error("role {role_id} is not placed on any node; place the role before assigning personnel")]
    RoleNotPlaced {
        /// The unplaced role
        role_id: RoleId,
    },

    /// Assignment attempted for a role somebody already holds
    #[error("role {role_id} is already held by {person_id}; use reassign to replace")]
    RoleOccupied {
        /// The occupied role
        role_id: RoleId,
        /// Current occupant
        person_id: PersonId,
    },

    /// Insert with an ID that is already taken
    #[error("{kind} already exists: {id}")]
    DuplicateId {
        /// What was inserted
        kind: EntityKind,
        /// The clashing ID
        id: String,
    },

    /// Connection from a node to itself, or otherwise unusable
    #[error("invalid connection {manager} -> {report}")]
    InvalidConnection {
        /// Manager node
        manager: String,
        /// Report node
        report: String,
    },

    /// Canvas coordinate that is NaN or infinite
    #[error("invalid position for node {node_id}: ({x}, {y}); coordinates must be finite")]
    InvalidPosition {
        /// Node being moved
        node_id: String,
        /// Rejected x, as given
        x: String,
        /// Rejected y, as given
        y: String,
    },

    /// No level exists below the parent's
    #[error("node {parent_id} is at level {level}; no child level fits below it")]
    LevelOverflow {
        /// Parent node
        parent_id: String,
        /// Parent's level
        level: u32,
    },

    /// Availability value that cannot be set by hand
    #[error("invalid availability: {0}")]
    InvalidAvailability(String),

    /// Stored record was written by another schema version
    #[error("unsupported version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in storage
        found: String,
        /// Version this build reads
        expected: String,
    },

    /// Import document failed validation
    #[error("invalid import: {0}")]
    InvalidImportSchema(#[from] SchemaError),

    /// Storage medium read or write failed
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl OrgError {
    /// Shorthand for `NotFound`
    #[must_use]
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    /// Whether the error is a recoverable user-level rejection, as opposed
    /// to a caller passing an unregistered phase or factory
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::UnknownFactory(_) | Self::UnknownPhase(_))
    }
}

/// Reasons an import document is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Envelope lacks `version`, `timestamp` or `data`
    #[error("missing envelope fields: {}", .0.join(", "))]
    MissingEnvelopeFields(Vec<String>),

    /// `data` lacks one or more required sections
    #[error("missing required keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    /// `version` differs from the supported one
    #[error("version mismatch: found {found}, expected {expected}")]
    VersionMismatch {
        /// Version in the document
        found: String,
        /// Supported version
        expected: String,
    },

    /// Not JSON, or a section has the wrong shape
    #[error("malformed document: {0}")]
    Malformed(String),
}

impl SchemaError {
    /// Names of the missing keys, if this is a missing-key error
    #[must_use]
    pub fn missing(&self) -> &[String] {
        match self {
            Self::MissingEnvelopeFields(keys) | Self::MissingKeys(keys) => keys,
            _ => &[],
        }
    }
}

/// Failures of the key-value storage medium
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Medium refused the write for lack of space
    #[error("quota exceeded writing {key} ({size} bytes)")]
    QuotaExceeded {
        /// Key being written
        key: String,
        /// Payload size
        size: usize,
    },

    /// Underlying I/O failed
    #[error("i/o error on {key}: {message}")]
    Io {
        /// Key being accessed
        key: String,
        /// OS error text
        message: String,
    },

    /// Stored value could not be parsed
    #[error("corrupt record {key}: {message}")]
    Corrupt {
        /// Key being read
        key: String,
        /// Parse error text
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_are_named() {
        let err = OrgError::from(SchemaError::MissingKeys(vec!["personnel".into(), "orgChart".into()]));
        let msg = err.to_string();
        assert!(msg.contains("personnel"));
        assert!(msg.contains("orgChart"));
    }

    #[test]
    fn test_caller_errors_are_not_recoverable() {
        assert!(!OrgError::UnknownFactory("XYZ".into()).is_recoverable());
        assert!(!OrgError::UnknownPhase("past".into()).is_recoverable());
        assert!(OrgError::RoleNotPlaced { role_id: "r1".into() }.is_recoverable());
        assert!(OrgError::not_found(EntityKind::Role, "r1").is_recoverable());
    }
}
