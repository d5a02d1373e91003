// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations
//!
//! Every command opens a [`Session`], works through the engine, and
//! persists through the gateway before returning.

pub mod assign;
pub mod backup;
pub mod completions;
pub mod config;
pub mod export;
pub mod factory;
pub mod import;
pub mod init;
pub mod node;
pub mod person;
pub mod phase;
pub mod role;
pub mod view;

use crate::config::Config;
use crate::engine::{Change, Workspace};
use crate::error::OrgResult;
use crate::persistence::{BackupEntry, FileStorage, PersistenceGateway, TickOutcome};
use crate::types::{FactoryId, Phase};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use tracing::debug;

/// `--phase` / `--factory` overrides of the active context
#[derive(Debug, Clone, Default, Args)]
pub struct Scope {
    /// Phase to work in (defaults to the active phase)
    #[arg(long)]
    pub phase: Option<Phase>,

    /// Focus factory to work in (defaults to the active factory)
    #[arg(long)]
    pub factory: Option<String>,
}

/// Loaded workspace plus the gateway it came from
pub struct Session {
    /// Effective configuration
    pub config: Config,
    /// Workspace being edited
    pub workspace: Workspace,
    /// Print JSON instead of text
    pub json: bool,
    /// Colorize text output
    pub color: bool,
    gateway: PersistenceGateway<FileStorage>,
}

impl Session {
    /// Load the workspace from the configured data directory. A missing
    /// record starts an empty workspace shaped by the config.
    pub fn open(config: Config, json: bool, color: bool) -> Result<Self> {
        let storage = FileStorage::new(config.data_dir.clone());
        let mut gateway = PersistenceGateway::new(storage, config.storage_key.clone())
            .with_max_backups(config.max_backups)
            .with_autosave(config.autosave());
        let state = gateway
            .load(|| config.initial_state())
            .with_context(|| format!("Failed to load workspace from {}", config.data_dir.display()))?;
        Ok(Self { config, workspace: Workspace::new(state), json, color, gateway })
    }

    /// Persistence gateway
    pub fn gateway(&mut self) -> &mut PersistenceGateway<FileStorage> {
        &mut self.gateway
    }

    /// The versioned document of the current state
    pub fn export(&self) -> OrgResult<String> {
        self.gateway.export_to_string(&self.workspace)
    }

    /// Validate a document and swap it in
    pub fn import(&mut self, text: &str) -> OrgResult<()> {
        self.gateway.import_from_str(&mut self.workspace, text)
    }

    /// Back up the current state
    pub fn backup(&mut self) -> OrgResult<BackupEntry> {
        self.gateway.create_backup(&self.workspace)
    }

    /// Swap in a stored backup
    pub fn restore(&mut self, key: &str) -> OrgResult<()> {
        self.gateway.restore_backup(&mut self.workspace, key)
    }

    /// Phase from the scope, else the active one
    #[must_use]
    pub fn phase(&self, scope: &Scope) -> Phase {
        scope.phase.unwrap_or(self.workspace.state().phase.current_phase)
    }

    /// Factory from the scope, else the active one
    #[must_use]
    pub fn factory(&self, scope: &Scope) -> FactoryId {
        scope
            .factory
            .as_deref()
            .map_or_else(|| self.workspace.state().focus_factory.current_factory.clone(), FactoryId::from)
    }

    /// Persist after a mutation. With auto-save on, the write goes through
    /// the auto-save tick; otherwise it is an explicit save.
    pub fn commit(&mut self) -> Result<()> {
        match self.gateway.tick(&self.workspace, Utc::now()) {
            TickOutcome::Saved(_) | TickOutcome::Unchanged => Ok(()),
            TickOutcome::Failed(e) => Err(e).context("Failed to save workspace"),
            outcome => {
                debug!("Auto-save tick gave {:?}, saving explicitly", outcome);
                self.gateway.save(&self.workspace).context("Failed to save workspace")?;
                Ok(())
            }
        }
    }

    /// Print a value as JSON
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Report the changes of a mutation and persist them
    pub fn finish(&mut self, changes: &[Change], message: &str) -> Result<()> {
        if changes.is_empty() {
            println!("No change: {message}");
            return Ok(());
        }
        self.commit()?;
        if self.json {
            self.print_json(&changes)
        } else {
            println!("{message}");
            Ok(())
        }
    }
}

/// Split a comma separated list, dropping blanks
#[must_use]
pub fn split_list(raw: Option<&str>) -> Option<Vec<String>> {
    raw.map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
}
