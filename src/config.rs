// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Layers, lowest first: built-in defaults, the TOML config file, then
//! `ORGDESIGN_*` environment variables.

use crate::persistence::{AutosaveSettings, DEFAULT_STORAGE_KEY};
use crate::state::OrgState;
use crate::types::{FactoryId, Phase};
use anyhow::{bail, Context, Result};
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "ORGDESIGN";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the stored state and backups
    pub data_dir: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Key of the main record in storage
    pub storage_key: String,
    /// Whether auto-save ticks write
    pub autosave_enabled: bool,
    /// Seconds between auto-save attempts
    pub autosave_interval_secs: u64,
    /// Backups kept before the oldest is dropped
    pub max_backups: usize,
    /// Factories registered in a fresh workspace
    pub factories: Vec<String>,
    /// Whether a fresh workspace has the iterative phase
    pub include_iterative: bool,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "hyperpolymath", "orgdesign")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: project_dirs()
                .map(|d| d.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("~/.local/share/orgdesign")),
            log_level: "info".to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            autosave_enabled: true,
            autosave_interval_secs: 60,
            max_backups: 10,
            factories: vec!["ADD".into(), "BBV".into(), "SYN".into()],
            include_iterative: true,
        }
    }
}

impl Config {
    /// Phases of a fresh workspace
    #[must_use]
    pub fn phases(&self) -> Vec<Phase> {
        Phase::ALL
            .into_iter()
            .filter(|p| self.include_iterative || *p != Phase::Iterative)
            .collect()
    }

    /// Factories of a fresh workspace
    #[must_use]
    pub fn factory_ids(&self) -> Vec<FactoryId> {
        self.factories.iter().map(|f| FactoryId::from(f.as_str())).collect()
    }

    /// Empty state shaped by this configuration
    #[must_use]
    pub fn initial_state(&self) -> OrgState {
        OrgState::new(&self.phases(), &self.factory_ids())
    }

    /// Auto-save settings for the persistence gateway
    #[must_use]
    pub fn autosave(&self) -> AutosaveSettings {
        let secs = i64::try_from(self.autosave_interval_secs.min(u64::from(u32::MAX))).unwrap_or(60);
        AutosaveSettings { enabled: self.autosave_enabled, interval: chrono::Duration::seconds(secs) }
    }

    /// Look up a key as display text
    pub fn get(&self, key: &str) -> Result<String> {
        let table = toml::Value::try_from(self).context("Failed to serialize config")?;
        let value = table.get(key).with_context(|| format!("Unknown config key: {key}"))?;
        Ok(match value {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Default config file location
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
}

/// Load configuration. An explicit `path` must exist; the default
/// location is optional.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let defaults = serde_json::to_string(&Config::default())?;
    let mut builder = config::Config::builder().add_source(File::from_str(&defaults, FileFormat::Json));

    match path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        None => {
            if let Some(path) = default_config_path() {
                builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
            }
        }
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("factories"),
    );

    builder
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to parse configuration")
}

/// Write one key into the TOML file at `path`, keeping the other keys
pub fn set(path: &Path, key: &str, raw: &str) -> Result<()> {
    let template = toml::Value::try_from(Config::default()).context("Failed to serialize config")?;
    let Some(kind) = template.get(key) else {
        bail!("Unknown config key: {key}");
    };
    let value = match kind {
        toml::Value::Boolean(_) => toml::Value::Boolean(raw.parse().with_context(|| format!("{key} expects true or false"))?),
        toml::Value::Integer(_) => toml::Value::Integer(raw.parse().with_context(|| format!("{key} expects an integer"))?),
        toml::Value::Array(_) => toml::Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| toml::Value::String(s.to_string()))
                .collect(),
        ),
        _ => toml::Value::String(raw.to_string()),
    };

    let mut table: toml::Table = if path.exists() {
        let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        text.parse().with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        toml::Table::new()
    };
    table.insert(key.to_string(), value);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, toml::to_string_pretty(&table)?).with_context(|| format!("Failed to write {}", path.display()))
}
