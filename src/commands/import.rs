// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Import command - replace the workspace with an exported document

use super::Session;
use crate::error::OrgError;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Run the import command
pub fn run(session: &mut Session, path: &Path, backup_first: bool) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    if backup_first {
        let entry = session.backup()?;
        println!("Backed up current workspace as {}", entry.key);
    }

    if let Err(e) = session.import(&text) {
        if let OrgError::InvalidImportSchema(schema) = &e {
            for key in schema.missing() {
                eprintln!("  missing: {key}");
            }
        }
        return Err(e).with_context(|| format!("Import of {} rejected; workspace unchanged", path.display()));
    }

    session.commit()?;
    println!("Imported {}", path.display());
    Ok(())
}
