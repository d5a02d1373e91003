// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Read or write configuration keys

use crate::config::{self, Config};
use anyhow::{Context, Result};
use std::path::Path;

/// Print a key, or write it to the config file when `value` is given
pub fn run(current: &Config, file: Option<&Path>, key: &str, value: Option<String>) -> Result<()> {
    match value {
        Some(value) => {
            let path = match file {
                Some(path) => path.to_path_buf(),
                None => config::default_config_path().context("No config directory on this platform")?,
            };
            config::set(&path, key, &value)?;
            tracing::info!("Set {} = {} in {}", key, value, path.display());
            println!("{key} = {value}");
        }
        None => println!("{}", current.get(key)?),
    }
    Ok(())
}
