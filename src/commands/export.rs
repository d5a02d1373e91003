// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export command - writes the workspace document or a chart diagram

use super::{Scope, Session};
use crate::chart::to_dot;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::ValueEnum;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Versioned workspace document, importable
    Json,
    /// Graphviz DOT of one chart
    Dot,
}

impl ExportFormat {
    /// File extension for the format
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Dot => "dot",
        }
    }
}

/// Default export file name: `orgdesign-export-<date>.<ext>`
#[must_use]
pub fn default_file_name(format: ExportFormat) -> String {
    format!("orgdesign-export-{}.{}", Utc::now().format("%Y-%m-%d"), format.extension())
}

/// Run the export command
pub fn run(session: &Session, format: ExportFormat, output: Option<PathBuf>, scope: &Scope) -> Result<()> {
    info!("Exporting to {:?}", format);

    let content = match format {
        ExportFormat::Json => session.export()?,
        ExportFormat::Dot => {
            let (phase, factory) = (session.phase(scope), session.factory(scope));
            let state = session.workspace.state();
            to_dot(
                state.org_chart.chart(phase, &factory)?,
                state.entities.roles(&factory)?,
                state.entities.personnel(&factory)?,
            )
        }
    };

    match output {
        Some(path) => {
            let path = if path.is_dir() { path.join(default_file_name(format)) } else { path };
            fs::write(&path, &content).with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}
