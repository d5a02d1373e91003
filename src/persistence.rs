// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Persistence gateway
//!
//! Serializes the whole [`OrgState`] into a versioned envelope
//! `{ version, timestamp, data }` and writes it to a key-value [`Storage`].
//! Saving, exporting and backups share one payload builder. Importing and
//! restoring share one validator, and only swap the state in once the
//! document has passed every check.

use crate::engine::Workspace;
use crate::error::{OrgError, OrgResult, SchemaError, StorageError};
use crate::state::{OrgState, REQUIRED_KEYS};
use crate::types::EntityKind;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Envelope version this build reads and writes
pub const FORMAT_VERSION: &str = "1.0";

/// Storage key used when none is configured
pub const DEFAULT_STORAGE_KEY: &str = "orgDesignState";

const ENVELOPE_FIELDS: [&str; 3] = ["version", "timestamp", "data"];

// =============================================================================
// Storage media
// =============================================================================

/// Synchronous key-value medium holding string payloads
pub trait Storage {
    /// Read a value; `None` when the key is absent
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Write a value
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Delete a value. Deleting an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory medium with an optional byte quota
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Unbounded medium
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Medium that refuses writes once the stored bytes would exceed `bytes`
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self { entries: BTreeMap::new(), quota: Some(bytes) }
    }

    /// Stored keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let others: usize = self.entries.iter().filter(|(k, _)| *k != key).map(|(_, v)| v.len()).sum();
            if others + value.len() > quota {
                return Err(StorageError::QuotaExceeded { key: key.to_string(), size: value.len() });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Directory-backed medium: one `<key>.json` file per key
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Medium rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a key. Characters unsafe in file names become `_`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

fn io_error(key: &str, err: &std::io::Error) -> StorageError {
    StorageError::Io { key: key.to_string(), message: err.to_string() }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, &e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error(key, &e))?;
        fs::write(self.path_for(key), value).map_err(|e| io_error(key, &e))
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, &e)),
        }
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// Versioned document written to storage and to export files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Schema version, [`FORMAT_VERSION`]
    pub version: String,
    /// When the payload was produced
    pub timestamp: DateTime<Utc>,
    /// The state graph
    pub data: OrgState,
}

impl Envelope {
    /// Wrap a state with the current version and time
    #[must_use]
    pub fn new(data: OrgState) -> Self {
        Self { version: FORMAT_VERSION.to_string(), timestamp: Utc::now(), data }
    }
}

/// Validate a document and decode its state.
///
/// Checks run in order: JSON syntax, envelope fields, version, required
/// `data` keys, then the shape of each section. Every missing field or key
/// is listed, not just the first.
pub fn decode_document(text: &str) -> Result<OrgState, SchemaError> {
    let value: Value = serde_json::from_str(text).map_err(|e| SchemaError::Malformed(e.to_string()))?;
    let Some(envelope) = value.as_object() else {
        return Err(SchemaError::Malformed("document is not a JSON object".into()));
    };

    let missing: Vec<String> =
        ENVELOPE_FIELDS.iter().filter(|f| !envelope.contains_key(**f)).map(|f| (*f).to_string()).collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingEnvelopeFields(missing));
    }

    let version = &envelope["version"];
    if version.as_str() != Some(FORMAT_VERSION) {
        let found = version.as_str().map_or_else(|| version.to_string(), str::to_string);
        return Err(SchemaError::VersionMismatch { found, expected: FORMAT_VERSION.to_string() });
    }

    let Some(data) = envelope["data"].as_object() else {
        return Err(SchemaError::Malformed("data is not a JSON object".into()));
    };
    let missing: Vec<String> =
        REQUIRED_KEYS.iter().filter(|k| !data.contains_key(**k)).map(|k| (*k).to_string()).collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingKeys(missing));
    }

    let mut state: OrgState =
        serde_json::from_value(envelope["data"].clone()).map_err(|e| SchemaError::Malformed(e.to_string()))?;
    state.phase.ensure(state.phase.current_phase).map_err(|e| SchemaError::Malformed(e.to_string()))?;
    state
        .focus_factory
        .ensure(&state.focus_factory.current_factory)
        .map_err(|e| SchemaError::Malformed(e.to_string()))?;

    state.prune_dangling();
    Ok(state)
}

// =============================================================================
// Backups
// =============================================================================

/// One entry of the backup index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Storage key holding the envelope
    pub key: String,
    /// When the backup was taken
    pub timestamp: DateTime<Utc>,
    /// Human readable label
    pub description: String,
}

// =============================================================================
// Auto-save
// =============================================================================

/// Auto-save timer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveSettings {
    /// Whether ticks save at all
    pub enabled: bool,
    /// Minimum time between two attempts
    pub interval: Duration,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self { enabled: true, interval: Duration::seconds(60) }
    }
}

/// Why a due tick did not save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A save is already running
    SaveInProgress,
    /// An import is replacing the state
    ImportInProgress,
}

/// Result of one auto-save tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Auto-save is switched off
    Disabled,
    /// Interval has not elapsed since the last attempt
    NotDue,
    /// Guard was set; the tick is dropped, not queued
    Skipped(SkipReason),
    /// Nothing changed since the last save
    Unchanged,
    /// Saved at the given time
    Saved(DateTime<Utc>),
    /// Save failed; the next tick tries again
    Failed(OrgError),
}

// =============================================================================
// Gateway
// =============================================================================

/// Reads and writes the workspace through a storage medium
#[derive(Debug)]
pub struct PersistenceGateway<S: Storage> {
    storage: S,
    key: String,
    max_backups: usize,
    autosave: AutosaveSettings,
    last_saved: Option<DateTime<Utc>>,
    last_saved_revision: Option<u64>,
    last_attempt: Option<DateTime<Utc>>,
    last_error: Option<StorageError>,
    save_in_progress: bool,
    import_in_progress: bool,
}

impl<S: Storage> PersistenceGateway<S> {
    /// Gateway over `storage` writing the main record under `key`
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            max_backups: 10,
            autosave: AutosaveSettings::default(),
            last_saved: None,
            last_saved_revision: None,
            last_attempt: None,
            last_error: None,
            save_in_progress: false,
            import_in_progress: false,
        }
    }

    /// Keep at most `max` backups
    #[must_use]
    pub fn with_max_backups(mut self, max: usize) -> Self {
        self.max_backups = max;
        self
    }

    /// Replace the auto-save settings
    #[must_use]
    pub fn with_autosave(mut self, autosave: AutosaveSettings) -> Self {
        self.autosave = autosave;
        self
    }

    /// Storage medium
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Main record key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Time of the last successful save
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Error of the last failed save, cleared by the next success
    pub fn last_error(&self) -> Option<&StorageError> {
        self.last_error.as_ref()
    }

    /// Current auto-save settings
    pub fn autosave(&self) -> AutosaveSettings {
        self.autosave
    }

    /// Switch auto-save on or off
    pub fn set_autosave_enabled(&mut self, enabled: bool) {
        self.autosave.enabled = enabled;
    }

    /// Change the auto-save interval
    pub fn set_autosave_interval(&mut self, interval: Duration) {
        self.autosave.interval = interval;
    }

    /// Mark an import as started or finished, for callers that read the
    /// document asynchronously before handing it to [`Self::import_from_str`]
    pub fn set_import_in_progress(&mut self, in_progress: bool) {
        self.import_in_progress = in_progress;
    }

    /// Mark a save as started or finished, for callers that write the
    /// serialized state through their own medium
    pub fn set_save_in_progress(&mut self, in_progress: bool) {
        self.save_in_progress = in_progress;
    }

    fn backup_index_key(&self) -> String {
        format!("{}-backups", self.key)
    }

    /// Serialized envelope of the current state. The same text is used for
    /// saving, exporting and backups.
    pub fn export_to_string(&self, workspace: &Workspace) -> OrgResult<String> {
        let envelope = Envelope::new(workspace.state().clone());
        serde_json::to_string_pretty(&envelope)
            .map_err(|e| OrgError::from(StorageError::Corrupt { key: self.key.clone(), message: e.to_string() }))
    }

    /// Write the state to storage. A failure is recorded and returned but
    /// leaves the workspace untouched.
    pub fn save(&mut self, workspace: &Workspace) -> OrgResult<DateTime<Utc>> {
        self.save_in_progress = true;
        let result = self.export_to_string(workspace).and_then(|payload| {
            self.storage.set(&self.key, &payload)?;
            Ok(payload.len())
        });
        self.save_in_progress = false;

        match result {
            Ok(bytes) => {
                let now = Utc::now();
                self.last_saved = Some(now);
                self.last_saved_revision = Some(workspace.revision());
                self.last_error = None;
                info!("Saved {} ({} bytes)", self.key, bytes);
                Ok(now)
            }
            Err(e) => {
                warn!("Save of {} failed: {}", self.key, e);
                if let OrgError::Storage(storage) = &e {
                    self.last_error = Some(storage.clone());
                }
                Err(e)
            }
        }
    }

    /// Read the stored state, or `default()` when nothing is stored yet
    pub fn load(&mut self, default: impl FnOnce() -> OrgState) -> OrgResult<OrgState> {
        let Some(text) = self.storage.get(&self.key)? else {
            debug!("No record under {}, starting fresh", self.key);
            return Ok(default());
        };
        let state = decode_document(&text).map_err(|e| match e {
            SchemaError::VersionMismatch { found, expected } => OrgError::UnsupportedVersion { found, expected },
            other => OrgError::from(StorageError::Corrupt { key: self.key.clone(), message: other.to_string() }),
        })?;
        info!("Loaded {}", self.key);
        Ok(state)
    }

    /// Validate a document and, only if it passes, replace the workspace
    /// state with it
    pub fn import_from_str(&mut self, workspace: &mut Workspace, text: &str) -> OrgResult<()> {
        self.import_in_progress = true;
        let decoded = decode_document(text);
        self.import_in_progress = false;

        let state = decoded.map_err(|e| {
            warn!("Import rejected: {}", e);
            OrgError::from(e)
        })?;
        workspace.replace_state(state);
        info!("Imported state ({} factories)", workspace.state().focus_factory.factories.len());
        Ok(())
    }

    // =========================================================================
    // Auto-save
    // =========================================================================

    /// Drive auto-save. Call on every timer tick with the current time.
    pub fn tick(&mut self, workspace: &Workspace, now: DateTime<Utc>) -> TickOutcome {
        if !self.autosave.enabled {
            return TickOutcome::Disabled;
        }
        if self.save_in_progress {
            debug!("Auto-save skipped: save in progress");
            return TickOutcome::Skipped(SkipReason::SaveInProgress);
        }
        if self.import_in_progress {
            debug!("Auto-save skipped: import in progress");
            return TickOutcome::Skipped(SkipReason::ImportInProgress);
        }
        if self.last_attempt.is_some_and(|last| now - last < self.autosave.interval) {
            return TickOutcome::NotDue;
        }
        self.last_attempt = Some(now);

        if self.last_saved_revision == Some(workspace.revision()) {
            return TickOutcome::Unchanged;
        }
        match self.save(workspace) {
            Ok(at) => TickOutcome::Saved(at),
            Err(e) => TickOutcome::Failed(e),
        }
    }

    // =========================================================================
    // Backups
    // =========================================================================

    /// Backup index, oldest first
    pub fn list_backups(&self) -> OrgResult<Vec<BackupEntry>> {
        let key = self.backup_index_key();
        match self.storage.get(&key)? {
            None => Ok(Vec::new()),
            Some(text) => serde_json::from_str(&text)
                .map_err(|e| OrgError::from(StorageError::Corrupt { key, message: e.to_string() })),
        }
    }

    /// Store a copy of the current state under a timestamped key, dropping
    /// the oldest backups beyond the limit
    pub fn create_backup(&mut self, workspace: &Workspace) -> OrgResult<BackupEntry> {
        let payload = self.export_to_string(workspace)?;
        let mut index = self.list_backups()?;

        let timestamp = Utc::now();
        let base = format!("{}-backup-{}", self.key, timestamp.to_rfc3339_opts(SecondsFormat::Micros, true));
        let mut key = base.clone();
        let mut n = 1;
        while index.iter().any(|b| b.key == key) {
            key = format!("{base}-{n}");
            n += 1;
        }

        self.storage.set(&key, &payload)?;
        let entry = BackupEntry {
            key,
            timestamp,
            description: format!("Backup - {}", timestamp.format("%Y-%m-%d %H:%M:%S UTC")),
        };
        index.push(entry.clone());

        while index.len() > self.max_backups {
            let oldest = index.remove(0);
            debug!("Dropping backup {}", oldest.key);
            self.storage.remove(&oldest.key)?;
        }
        let index_json = serde_json::to_string_pretty(&index).map_err(|e| {
            OrgError::from(StorageError::Corrupt { key: self.backup_index_key(), message: e.to_string() })
        })?;
        self.storage.set(&self.backup_index_key(), &index_json)?;

        info!("Created backup {}", entry.key);
        Ok(entry)
    }

    /// Replace the workspace state with a stored backup
    pub fn restore_backup(&mut self, workspace: &mut Workspace, key: &str) -> OrgResult<()> {
        let text = self.storage.get(key)?.ok_or_else(|| OrgError::not_found(EntityKind::Backup, key))?;
        let state = decode_document(&text)?;
        workspace.replace_state(state);
        info!("Restored backup {}", key);
        Ok(())
    }

    /// Remove the main record, every backup and the index. Returns the
    /// number of backups removed.
    pub fn clear_all(&mut self) -> OrgResult<usize> {
        let backups = self.list_backups()?;
        for backup in &backups {
            self.storage.remove(&backup.key)?;
        }
        self.storage.remove(&self.backup_index_key())?;
        self.storage.remove(&self.key)?;
        self.last_saved = None;
        self.last_saved_revision = None;
        info!("Cleared {} and {} backups", self.key, backups.len());
        Ok(backups.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FactoryId, Phase};

    fn gateway() -> PersistenceGateway<MemoryStorage> {
        PersistenceGateway::new(MemoryStorage::new(), DEFAULT_STORAGE_KEY)
    }

    fn strip_key(text: &str, key: &str) -> String {
        let mut value: Value = serde_json::from_str(text).unwrap();
        value["data"].as_object_mut().unwrap().remove(key);
        value.to_string()
    }

    #[test]
    fn test_load_without_record_returns_default() {
        let mut gw = gateway();
        let state = gw.load(OrgState::default).unwrap();
        assert_eq!(state, OrgState::default());
        assert!(gw.last_saved().is_none());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let mut gw = gateway();
        let ws = Workspace::new(OrgState::sample());
        let saved_at = gw.save(&ws).unwrap();
        assert_eq!(gw.last_saved(), Some(saved_at));

        let loaded = gw.load(OrgState::default).unwrap();
        assert_eq!(&loaded, ws.state());
    }

    #[test]
    fn test_load_rejects_other_version() {
        let mut gw = gateway();
        let ws = Workspace::default();
        let text = gw.export_to_string(&ws).unwrap().replace("\"1.0\"", "\"2.0\"");
        gw.storage.set(DEFAULT_STORAGE_KEY, &text).unwrap();

        let err = gw.load(OrgState::default).unwrap_err();
        assert_eq!(err, OrgError::UnsupportedVersion { found: "2.0".into(), expected: "1.0".into() });
    }

    #[test]
    fn test_import_missing_key_leaves_state_untouched() {
        let mut gw = gateway();
        let mut ws = Workspace::new(OrgState::sample());
        let before = ws.state().clone();
        let text = strip_key(&gw.export_to_string(&ws).unwrap(), "personnel");

        let err = gw.import_from_str(&mut ws, &text).unwrap_err();

        match err {
            OrgError::InvalidImportSchema(schema) => assert_eq!(schema.missing(), ["personnel".to_string()]),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(ws.state(), &before);
    }

    #[test]
    fn test_import_lists_every_missing_key() {
        let text = r#"{"version":"1.0","timestamp":"2024-01-01T00:00:00Z","data":{"phase":{}}}"#;
        let err = decode_document(text).unwrap_err();
        assert_eq!(err.missing(), ["roles", "personnel", "orgChart", "focusFactory"].map(String::from));
    }

    #[test]
    fn test_import_envelope_checks() {
        assert_eq!(
            decode_document(r#"{"data":{}}"#).unwrap_err(),
            SchemaError::MissingEnvelopeFields(vec!["version".into(), "timestamp".into()])
        );
        assert_eq!(
            decode_document(r#"{"version":"0.9","timestamp":"x","data":{}}"#).unwrap_err(),
            SchemaError::VersionMismatch { found: "0.9".into(), expected: "1.0".into() }
        );
        assert!(matches!(decode_document("not json"), Err(SchemaError::Malformed(_))));
    }

    #[test]
    fn test_import_replaces_state() {
        let mut gw = gateway();
        let source = Workspace::new(OrgState::sample());
        let text = gw.export_to_string(&source).unwrap();

        let mut target = Workspace::default();
        let revision = target.revision();
        gw.import_from_str(&mut target, &text).unwrap();

        assert_eq!(target.state(), source.state());
        assert!(target.revision() > revision);
    }

    #[test]
    fn test_save_failure_is_recoverable() {
        let mut gw = PersistenceGateway::new(MemoryStorage::with_quota(16), DEFAULT_STORAGE_KEY);
        let ws = Workspace::new(OrgState::sample());

        let err = gw.save(&ws).unwrap_err();
        assert!(matches!(err, OrgError::Storage(StorageError::QuotaExceeded { .. })));
        assert!(err.is_recoverable());
        assert!(gw.last_error().is_some());
        assert!(gw.last_saved().is_none());
    }

    #[test]
    fn test_tick_guards_and_interval() {
        let mut gw = gateway();
        let mut ws = Workspace::default();
        let t0 = Utc::now();

        assert!(matches!(gw.tick(&ws, t0), TickOutcome::Saved(_)));
        assert_eq!(gw.tick(&ws, t0 + Duration::seconds(10)), TickOutcome::NotDue);
        assert_eq!(gw.tick(&ws, t0 + Duration::seconds(61)), TickOutcome::Unchanged);

        ws.select_phase(Phase::Future).unwrap();
        gw.set_import_in_progress(true);
        assert_eq!(gw.tick(&ws, t0 + Duration::seconds(200)), TickOutcome::Skipped(SkipReason::ImportInProgress));
        gw.set_import_in_progress(false);
        assert!(matches!(gw.tick(&ws, t0 + Duration::seconds(200)), TickOutcome::Saved(_)));

        ws.select_phase(Phase::Current).unwrap();
        gw.set_save_in_progress(true);
        assert_eq!(gw.tick(&ws, t0 + Duration::seconds(300)), TickOutcome::Skipped(SkipReason::SaveInProgress));
        gw.set_save_in_progress(false);
        assert!(matches!(gw.tick(&ws, t0 + Duration::seconds(300)), TickOutcome::Saved(_)));

        gw.set_autosave_enabled(false);
        assert_eq!(gw.tick(&ws, t0 + Duration::seconds(999)), TickOutcome::Disabled);
    }

    #[test]
    fn test_tick_keeps_running_after_failure() {
        let mut gw = PersistenceGateway::new(MemoryStorage::with_quota(16), DEFAULT_STORAGE_KEY);
        let ws = Workspace::default();
        let t0 = Utc::now();
        assert!(matches!(gw.tick(&ws, t0), TickOutcome::Failed(_)));
        assert!(matches!(gw.tick(&ws, t0 + Duration::seconds(60)), TickOutcome::Failed(_)));
    }

    #[test]
    fn test_backups_are_capped_and_restorable() {
        let mut gw = gateway().with_max_backups(3);
        let mut ws = Workspace::new(OrgState::sample());
        let first = gw.create_backup(&ws).unwrap();
        for _ in 0..3 {
            gw.create_backup(&ws).unwrap();
        }

        let backups = gw.list_backups().unwrap();
        assert_eq!(backups.len(), 3);
        assert!(backups.iter().all(|b| b.key != first.key));
        assert!(gw.storage().get(&first.key).unwrap().is_none());

        let keep = backups[0].key.clone();
        let add = FactoryId::from("ADD");
        ws.clear_chart(Phase::Current, &add).unwrap();
        gw.restore_backup(&mut ws, &keep).unwrap();
        assert!(!ws.state().org_chart.chart(Phase::Current, &add).unwrap().nodes.is_empty());

        assert!(matches!(
            gw.restore_backup(&mut ws, "nope"),
            Err(OrgError::NotFound { kind: EntityKind::Backup, .. })
        ));
    }

    #[test]
    fn test_clear_all_removes_everything() {
        let mut gw = gateway();
        let ws = Workspace::default();
        gw.save(&ws).unwrap();
        gw.create_backup(&ws).unwrap();
        gw.create_backup(&ws).unwrap();

        assert_eq!(gw.clear_all().unwrap(), 2);
        assert_eq!(gw.storage().keys().count(), 0);
    }

    #[test]
    fn test_file_storage() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path().join("data"));
        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("orgDesignState-backup-2024-01-01T00:00:00Z", "{}").unwrap();
        assert_eq!(storage.get("orgDesignState-backup-2024-01-01T00:00:00Z").unwrap().as_deref(), Some("{}"));
        assert!(!storage.path_for("a:b").to_string_lossy().contains(':'));
        storage.remove("orgDesignState-backup-2024-01-01T00:00:00Z").unwrap();
        storage.remove("never-written").unwrap();
    }
}
