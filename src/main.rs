// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Orgdesign CLI - phase-aware org chart planning per focus factory

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use orgdesign::commands::{self, Scope, Session};
use orgdesign::config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orgdesign")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "ORGDESIGN_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Data directory override
    #[arg(long, env = "ORGDESIGN_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the workspace record in the data directory
    Init {
        /// Seed with sample roles, personnel and a current-state chart
        #[arg(long)]
        sample: bool,

        /// Overwrite an existing workspace
        #[arg(long)]
        force: bool,
    },

    /// Manage roles
    #[command(subcommand)]
    Role(commands::role::RoleCommand),

    /// Manage personnel
    #[command(subcommand)]
    Person(commands::person::PersonCommand),

    /// Manage chart nodes and reporting lines
    #[command(subcommand)]
    Node(commands::node::NodeCommand),

    /// Place a role on a node
    Place {
        /// Node ID
        node: String,
        /// Role ID
        role: String,
        #[command(flatten)]
        scope: Scope,
    },

    /// Remove a role from a node
    Unplace {
        /// Node ID
        node: String,
        /// Role ID
        role: String,
        #[command(flatten)]
        scope: Scope,
    },

    /// Move a placed role to another node or position
    MoveRole {
        /// Role ID
        role: String,
        /// Node the role is on
        #[arg(long)]
        from: String,
        /// Destination node (same as --from to reorder)
        #[arg(long)]
        to: String,
        /// Position in the destination's role list
        #[arg(long, default_value_t = 0)]
        index: usize,
        #[command(flatten)]
        scope: Scope,
    },

    /// Assign a person to a placed role
    Assign {
        /// Role ID
        role: String,
        /// Person ID
        person: String,
        /// Replace the current holder instead of failing
        #[arg(long)]
        replace: bool,
        #[command(flatten)]
        scope: Scope,
    },

    /// Vacate a role
    Unassign {
        /// Role ID
        role: String,
        #[command(flatten)]
        scope: Scope,
    },

    /// Replay a drag gesture (rolesList, personnelList, org-node-<id>, role-<id>)
    Drop {
        /// Dragged role or person ID
        item: String,
        /// Zone the drag started in
        #[arg(long)]
        from: String,
        /// Index within the start zone
        #[arg(long, default_value_t = 0)]
        from_index: usize,
        /// Zone the item was released on (omit for outside any target)
        #[arg(long)]
        to: Option<String>,
        /// Index within the release zone
        #[arg(long, default_value_t = 0)]
        to_index: usize,
    },

    /// Switch, copy, clear and compare phases
    #[command(subcommand)]
    Phase(commands::phase::PhaseCommand),

    /// Switch and register focus factories
    #[command(subcommand)]
    Factory(commands::factory::FactoryCommand),

    /// Render a chart
    View {
        #[command(flatten)]
        scope: Scope,
    },

    /// Export the workspace document or a chart diagram
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: commands::export::ExportFormat,

        /// Output file or directory (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        scope: Scope,
    },

    /// Replace the workspace with an exported document
    Import {
        /// Document to import
        path: PathBuf,

        /// Back up the current workspace first
        #[arg(long)]
        backup: bool,
    },

    /// Create, list, restore and clear backups
    #[command(subcommand)]
    Backup(commands::backup::BackupCommand),

    /// Get or set configuration
    Config {
        /// Configuration key
        key: String,

        /// Value to set (omit to get)
        value: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => "error".to_string(),
        0 => config.log_level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Commands that do not touch the workspace
    match cli.command {
        Commands::Config { key, value } => return commands::config::run(&config, cli.config.as_deref(), &key, value),
        Commands::Completions { shell } => return commands::completions::run(shell, Cli::command()),
        _ => {}
    }

    let mut session = Session::open(config, cli.json, !cli.no_color)?;

    // Execute command
    match cli.command {
        Commands::Init { sample, force } => commands::init::run(&mut session, sample, force),
        Commands::Role(command) => commands::role::run(&mut session, command),
        Commands::Person(command) => commands::person::run(&mut session, command),
        Commands::Node(command) => commands::node::run(&mut session, command),
        Commands::Place { node, role, scope } => commands::assign::place(&mut session, &node, &role, &scope),
        Commands::Unplace { node, role, scope } => commands::assign::unplace(&mut session, &node, &role, &scope),
        Commands::MoveRole { role, from, to, index, scope } => {
            commands::assign::move_role(&mut session, &role, &from, &to, index, &scope)
        }
        Commands::Assign { role, person, replace, scope } => {
            commands::assign::assign(&mut session, &role, &person, replace, &scope)
        }
        Commands::Unassign { role, scope } => commands::assign::unassign(&mut session, &role, &scope),
        Commands::Drop { item, from, from_index, to, to_index } => {
            commands::assign::drop(&mut session, &item, &from, from_index, to.as_deref(), to_index)
        }
        Commands::Phase(command) => commands::phase::run(&mut session, command),
        Commands::Factory(command) => commands::factory::run(&mut session, command),
        Commands::View { scope } => commands::view::run(&session, &scope),
        Commands::Export { format, output, scope } => commands::export::run(&session, format, output, &scope),
        Commands::Import { path, backup } => commands::import::run(&mut session, &path, backup),
        Commands::Backup(command) => commands::backup::run(&mut session, command),
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}
