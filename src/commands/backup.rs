// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Backup commands

use super::Session;
use anyhow::Result;
use clap::Subcommand;

/// `orgdesign backup ...`
#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Store a copy of the current workspace
    Create,
    /// List stored backups, oldest first
    #[command(alias = "ls")]
    List,
    /// Replace the workspace with a backup
    Restore {
        /// Backup key, as printed by `backup list`
        key: String,
    },
    /// Delete the workspace record and every backup
    Clear {
        /// Required, since this cannot be undone
        #[arg(long)]
        yes: bool,
    },
}

/// Run backup command
pub fn run(session: &mut Session, command: BackupCommand) -> Result<()> {
    match command {
        BackupCommand::Create => {
            let entry = session.backup()?;
            if session.json {
                return session.print_json(&entry);
            }
            println!("Created backup {}", entry.key);
        }

        BackupCommand::List => {
            let backups = session.gateway().list_backups()?;
            if session.json {
                return session.print_json(&backups);
            }
            if backups.is_empty() {
                println!("No backups. Use 'orgdesign backup create' to make one.");
                return Ok(());
            }
            println!("Backups ({}):", backups.len());
            for backup in &backups {
                println!("  {}  {}", backup.key, backup.description);
            }
        }

        BackupCommand::Restore { key } => {
            session.restore(&key)?;
            session.commit()?;
            println!("Restored {key}");
        }

        BackupCommand::Clear { yes } => {
            if !yes {
                anyhow::bail!("Refusing to delete all stored data without --yes");
            }
            let removed = session.gateway().clear_all()?;
            println!("Removed the workspace record and {removed} backups");
        }
    }
    Ok(())
}
