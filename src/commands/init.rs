// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Initialize a workspace in the data directory

use super::Session;
use crate::state::OrgState;
use anyhow::{bail, Result};
use tracing::info;

/// Run init command
pub fn run(session: &mut Session, sample: bool, force: bool) -> Result<()> {
    let key = session.config.storage_key.clone();
    if !force && session.gateway().storage().path_for(&key).exists() {
        bail!("A workspace already exists in {}. Pass --force to overwrite it.", session.config.data_dir.display());
    }

    let state = if sample { OrgState::sample() } else { session.config.initial_state() };
    session.workspace.replace_state(state);
    session.commit()?;

    info!("Initialized workspace in {}", session.config.data_dir.display());
    println!("Initialized workspace in {}", session.config.data_dir.display());
    if sample {
        println!("  loaded sample data for ADD");
    }
    Ok(())
}
